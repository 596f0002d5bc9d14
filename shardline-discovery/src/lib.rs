//! Coordination backends for Shardline
//!
//! This crate answers one question for the search client: which hosts of
//! the cluster are alive right now?
//!
//! ## Backends
//!
//! - **Static** - In-memory list, for tests and fixed deployments
//! - **Consul** - Passing instances of a registered service
//! - **etcd** - Live-node keys under a prefix
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shardline_discovery::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let consul = ConsulCoordination::new("http://localhost:8500", "solr")?;
//!
//!     for address in consul.list_active_hosts().await? {
//!         println!("live: {}", address);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ### From configuration
//!
//! ```rust,ignore
//! use shardline_discovery::CoordinationConfig;
//!
//! let config: CoordinationConfig = toml::from_str(r#"
//!     kind = "etcd"
//!     url = "http://localhost:2379"
//!     prefix = "/live_nodes"
//! "#)?;
//! let coordination = config.build()?;
//! ```

pub mod config;
pub mod consul;
pub mod etcd;
pub mod memory;
pub mod service;

pub use config::CoordinationConfig;
pub use consul::ConsulCoordination;
pub use etcd::EtcdCoordination;
pub use memory::StaticCoordination;
pub use service::{CoordinationError, CoordinationService, live_node_address};
