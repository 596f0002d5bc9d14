//! etcd coordination backend

use crate::service::{CoordinationError, CoordinationService, live_node_address};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use std::time::Duration;
use tracing::debug;

/// etcd-backed coordination.
///
/// Every key under `prefix` names one live node, e.g.
/// `/live_nodes/10.0.0.1:8983_solr`. Values are ignored.
pub struct EtcdCoordination {
    base_url: String,
    prefix: String,
    client: reqwest::Client,
}

#[derive(serde::Deserialize)]
struct EtcdRangeResponse {
    kvs: Option<Vec<EtcdKey>>,
}

#[derive(serde::Deserialize)]
struct EtcdKey {
    key: String,
}

impl EtcdCoordination {
    /// Create new etcd coordination client
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use shardline_discovery::EtcdCoordination;
    ///
    /// let etcd = EtcdCoordination::new("http://localhost:2379", "/live_nodes")?;
    /// ```
    pub fn new(
        base_url: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Result<Self, CoordinationError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)
            .map_err(|e| CoordinationError::InvalidConfiguration(format!("{base_url}: {e}")))?;

        let mut prefix = prefix.into();
        if prefix.is_empty() {
            return Err(CoordinationError::InvalidConfiguration(
                "etcd key prefix must not be empty".to_string(),
            ));
        }
        if !prefix.ends_with('/') {
            prefix.push('/');
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix,
            client,
        })
    }

    fn decode_key(&self, encoded: &str) -> Result<String, CoordinationError> {
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| CoordinationError::InvalidResponse(e.to_string()))?;
        let key = String::from_utf8(bytes)
            .map_err(|e| CoordinationError::InvalidResponse(e.to_string()))?;

        let name = key.strip_prefix(&self.prefix).ok_or_else(|| {
            CoordinationError::InvalidResponse(format!("key {key} outside prefix {}", self.prefix))
        })?;

        Ok(live_node_address(name).to_string())
    }
}

/// Smallest key greater than every key starting with `prefix`.
fn prefix_range_end(prefix: &str) -> Vec<u8> {
    let mut end = prefix.as_bytes().to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return end;
        }
    }
    // All 0xff: etcd reads "\0" as "to the end of the keyspace"
    vec![0]
}

#[async_trait]
impl CoordinationService for EtcdCoordination {
    async fn list_active_hosts(&self) -> Result<Vec<String>, CoordinationError> {
        let url = format!("{}/v3/kv/range", self.base_url);

        let payload = serde_json::json!({
            "key": general_purpose::STANDARD.encode(self.prefix.as_bytes()),
            "range_end": general_purpose::STANDARD.encode(prefix_range_end(&self.prefix)),
            "keys_only": true,
        });

        let response = self.client.post(&url).json(&payload).send().await?;

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

        let range: EtcdRangeResponse = response
            .json()
            .await
            .map_err(|e| CoordinationError::InvalidResponse(e.to_string()))?;

        let hosts = range
            .kvs
            .unwrap_or_default()
            .iter()
            .map(|kv| self.decode_key(&kv.key))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(prefix = %self.prefix, count = hosts.len(), "Discovered live nodes in etcd");
        Ok(hosts)
    }

    fn backend(&self) -> &'static str {
        "etcd"
    }
}
