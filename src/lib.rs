// Shardline - failover client for sharded search clusters
//
// Spreads requests over interchangeable search hosts, quarantines hosts
// that fail, and reloads the host list from a coordination service.

// Re-export the client
pub use shardline_client::*;

// Re-export coordination backends
pub use shardline_discovery as discovery;
pub use shardline_discovery::{
    ConsulCoordination, EtcdCoordination, StaticCoordination, live_node_address,
};

/// Prelude for common imports.
pub mod prelude {
    pub use shardline_client::prelude::*;
    pub use shardline_discovery::{ConsulCoordination, EtcdCoordination, StaticCoordination};
}
