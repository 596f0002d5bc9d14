//! Coordination backend selection

use crate::consul::ConsulCoordination;
use crate::etcd::EtcdCoordination;
use crate::memory::StaticCoordination;
use crate::service::{CoordinationError, CoordinationService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which coordination backend to consult when the host list goes stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CoordinationConfig {
    /// Fixed list of addresses
    Static {
        /// Bare `host:port` addresses
        hosts: Vec<String>,
    },

    /// Consul health API
    Consul {
        /// Consul agent URL, e.g. `http://127.0.0.1:8500`
        url: String,
        /// Registered service name
        service: String,
    },

    /// etcd v3 JSON gateway
    Etcd {
        /// etcd endpoint, e.g. `http://127.0.0.1:2379`
        url: String,
        /// Key prefix holding one key per live node
        #[serde(default = "default_etcd_prefix")]
        prefix: String,
    },
}

fn default_etcd_prefix() -> String {
    "/live_nodes".to_string()
}

impl CoordinationConfig {
    /// Instantiate the configured backend
    pub fn build(&self) -> Result<Arc<dyn CoordinationService>, CoordinationError> {
        let service: Arc<dyn CoordinationService> = match self {
            Self::Static { hosts } => Arc::new(StaticCoordination::new(hosts.clone())),
            Self::Consul { url, service } => Arc::new(ConsulCoordination::new(url, service)?),
            Self::Etcd { url, prefix } => Arc::new(EtcdCoordination::new(url, prefix)?),
        };
        Ok(service)
    }
}
