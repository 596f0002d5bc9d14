//! Consul coordination backend

use crate::service::{CoordinationError, CoordinationService};
use async_trait::async_trait;
use serde::Deserialize;
use std::net::Ipv6Addr;
use std::time::Duration;
use tracing::debug;

/// Consul-backed coordination.
///
/// Reports every instance of a service whose health checks are passing.
pub struct ConsulCoordination {
    base_url: String,
    service: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ConsulHealthEntry {
    #[serde(rename = "Node")]
    node: ConsulNode,
    #[serde(rename = "Service")]
    service: ConsulService,
}

#[derive(Deserialize)]
struct ConsulNode {
    #[serde(rename = "Address")]
    address: String,
}

#[derive(Deserialize)]
struct ConsulService {
    #[serde(rename = "Address", default)]
    address: String,
    #[serde(rename = "Port")]
    port: u16,
}

impl ConsulCoordination {
    /// Create new Consul coordination client
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use shardline_discovery::ConsulCoordination;
    ///
    /// let consul = ConsulCoordination::new("http://localhost:8500", "solr")?;
    /// ```
    pub fn new(
        base_url: impl Into<String>,
        service: impl Into<String>,
    ) -> Result<Self, CoordinationError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)
            .map_err(|e| CoordinationError::InvalidConfiguration(format!("{base_url}: {e}")))?;

        let service = service.into();
        if service.is_empty() {
            return Err(CoordinationError::InvalidConfiguration(
                "Consul service name must not be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
            client,
        })
    }
}

/// Join an address and a port, bracketing IPv6 literals.
fn host_port(address: &str, port: u16) -> String {
    match address.parse::<Ipv6Addr>() {
        Ok(_) => format!("[{address}]:{port}"),
        Err(_) => format!("{address}:{port}"),
    }
}

#[async_trait]
impl CoordinationService for ConsulCoordination {
    async fn list_active_hosts(&self) -> Result<Vec<String>, CoordinationError> {
        let url = format!("{}/v1/health/service/{}", self.base_url, self.service);

        let response = self
            .client
            .get(&url)
            .query(&[("passing", "true")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CoordinationError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let entries: Vec<ConsulHealthEntry> = response
            .json()
            .await
            .map_err(|e| CoordinationError::InvalidResponse(e.to_string()))?;

        let hosts: Vec<String> = entries
            .into_iter()
            .map(|entry| {
                // Consul leaves the service address empty when it matches the node
                let address = if entry.service.address.is_empty() {
                    entry.node.address
                } else {
                    entry.service.address
                };
                host_port(&address, entry.service.port)
            })
            .collect();

        debug!(
            service = %self.service,
            count = hosts.len(),
            "Discovered active hosts in Consul"
        );
        Ok(hosts)
    }

    fn backend(&self) -> &'static str {
        "consul"
    }
}
