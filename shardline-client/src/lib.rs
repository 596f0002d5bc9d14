//! # Shardline Client
//!
//! HTTP client for search clusters whose hosts all serve the same
//! collections. Requests are spread randomly over healthy hosts; a host
//! that fails is quarantined for a while and the request is retried once
//! on another host.
//!
//! ## Features
//!
//! - **Host quarantine**: Failed hosts sit out a configurable window (5 minutes by default)
//! - **Single retry**: Every request gets exactly one more attempt after a failure
//! - **Coordination refresh**: Stale host lists are replaced from Consul, etcd or a static source
//! - **Total-outage fallback**: With every host quarantined, the longest-failed one is tried again
//! - **Opaque responses**: Bodies come back as `serde_json::Value`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shardline_client::{SearchClient, SearchClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SearchClientConfig::builder()
//!         .host("http://10.0.0.1:8983/solr/")
//!         .host("http://10.0.0.2:8983/solr/")
//!         .build();
//!
//!     let client = SearchClient::new(config)?;
//!     let response = client
//!         .get("collection1/select", &[("q", "title:rust"), ("rows", "10")])
//!         .await?;
//!
//!     println!("{}", response["response"]["numFound"]);
//!     Ok(())
//! }
//! ```
//!
//! ## With Coordination Refresh
//!
//! ```rust,no_run
//! use shardline_client::{CoordinationConfig, SearchClient, SearchClientConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SearchClientConfig::builder()
//!         .host("http://10.0.0.1:8983/solr/")
//!         .timeout(Duration::from_secs(10))
//!         .quarantine(Duration::from_secs(120))
//!         .coordination(CoordinationConfig::Consul {
//!             url: "http://127.0.0.1:8500".to_string(),
//!             service: "solr".to_string(),
//!         })
//!         .build();
//!
//!     let client = SearchClient::new(config)?;
//!
//!     // On failure the host list is reloaded from Consul before the retry
//!     client
//!         .post_json("collection1/update", &[("commit", "true")], &serde_json::json!([
//!             {"id": "1", "title": "Failover"}
//!         ]))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod pool;
mod refresh;
mod request;
mod response;

pub use client::{MAX_ATTEMPTS, SearchClient};
pub use config::{ENV_PREFIX, SearchClientConfig, SearchClientConfigBuilder};
pub use error::{Result, SearchClientError};
pub use pool::{DEFAULT_QUARANTINE, HostPool};
pub use refresh::{HostRefresher, base_url_for};
pub use request::{FIXED_PARAMS, SearchRequest};
pub use response::{MAX_BODY_EXCERPT, RawResponse};

// Re-export common types
pub use bytes::Bytes;
pub use http::{Method, StatusCode};
pub use serde_json::Value;
pub use shardline_discovery::{CoordinationConfig, CoordinationError, CoordinationService};

/// Prelude for common imports.
///
/// ```
/// use shardline_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::SearchClient;
    pub use crate::config::{SearchClientConfig, SearchClientConfigBuilder};
    pub use crate::error::{Result, SearchClientError};
    pub use crate::pool::HostPool;
    pub use crate::request::SearchRequest;
    pub use shardline_discovery::{CoordinationConfig, CoordinationService};
}
