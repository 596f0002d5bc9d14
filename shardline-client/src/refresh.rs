//! Host list refresh from a coordination service.

use crate::pool::HostPool;
use crate::request::parse_host;
use shardline_discovery::CoordinationService;
use std::sync::Arc;
use tracing::{info, warn};

/// Turn a bare `host:port` address into a host base URL.
pub fn base_url_for(address: &str) -> String {
    format!("http://{}/solr/", address.trim_matches('/'))
}

/// Best-effort replacement of the pool's hosts with the live set.
#[derive(Clone)]
pub struct HostRefresher {
    service: Arc<dyn CoordinationService>,
}

impl HostRefresher {
    /// Create a refresher over `service`.
    pub fn new(service: Arc<dyn CoordinationService>) -> Self {
        Self { service }
    }

    /// Coordination service in use.
    pub fn service(&self) -> &Arc<dyn CoordinationService> {
        &self.service
    }

    /// Fetch the live hosts and replace the pool's configured set.
    ///
    /// Addresses that do not form a valid base URL are skipped. Failures are logged and swallowed; the pool is left untouched.
    /// Returns whether the host list was replaced.
    pub async fn refresh(&self, pool: &HostPool) -> bool {
        match self.service.list_active_hosts().await {
            Ok(addresses) => {
                let hosts: Vec<String> = addresses
                    .iter()
                    .map(|address| base_url_for(address))
                    .filter(|host| match parse_host(host) {
                        Ok(_) => true,
                        Err(e) => {
                            warn!(
                                backend = self.service.backend(),
                                error = %e,
                                "Dropping unusable address from coordination service"
                            );
                            false
                        }
                    })
                    .collect();
                if hosts.is_empty() {
                    warn!(
                        backend = self.service.backend(),
                        "Coordination service reported no live hosts"
                    );
                }
                info!(
                    backend = self.service.backend(),
                    count = hosts.len(),
                    hosts = ?hosts,
                    "Replacing host list from coordination service"
                );
                pool.replace_hosts(hosts);
                true
            }
            Err(e) => {
                warn!(
                    event = "coordination_refresh_failed",
                    backend = self.service.backend(),
                    error = %e,
                    "Coordination refresh failed, keeping current host list"
                );
                false
            }
        }
    }
}
