//! Coordination service contract

use async_trait::async_trait;
use thiserror::Error;

/// Coordination service errors
#[derive(Debug, Error)]
pub enum CoordinationError {
    /// The backend cannot be reached or refuses to answer.
    #[error("Coordination service unavailable: {0}")]
    Unavailable(String),

    /// The HTTP call to the backend failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Coordination backend returned {status}: {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Response body, or a placeholder when it could not be read.
        message: String,
    },

    /// The backend answered with a body that could not be interpreted.
    #[error("Invalid coordination response: {0}")]
    InvalidResponse(String),

    /// The backend was configured with an unusable URL or name.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Source of truth for which search hosts are currently alive.
///
/// Implementations return bare addresses (`host:port`, no scheme and no
/// path). Callers decide how an address maps onto a request URL.
#[async_trait]
pub trait CoordinationService: Send + Sync {
    /// List the addresses of all currently active hosts.
    async fn list_active_hosts(&self) -> Result<Vec<String>, CoordinationError>;

    /// Short backend name used in log events.
    fn backend(&self) -> &'static str;
}

/// Reduce a live-node name to its bare address.
///
/// Search clusters register nodes as `host:port_context` (for example
/// `10.0.0.1:8983_solr`); the context suffix starting at the first
/// underscore after the port separator is dropped, so host names may contain
/// underscores. Surrounding slashes left over from key paths are trimmed.
pub fn live_node_address(name: &str) -> &str {
    let name = name.trim_matches('/');
    let port_start = name.rfind(':').map_or(0, |colon| colon + 1);
    match name[port_start..].find('_') {
        Some(underscore) => &name[..port_start + underscore],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_node_address() {
        assert_eq!(live_node_address("10.0.0.1:8983_solr"), "10.0.0.1:8983");
        assert_eq!(live_node_address("/search-1:8983_solr/"), "search-1:8983");
        assert_eq!(live_node_address("search-2:8983"), "search-2:8983");
        assert_eq!(live_node_address("solr_1:8983_solr"), "solr_1:8983");
        assert_eq!(live_node_address("my_search_host:8983"), "my_search_host:8983");
        assert_eq!(live_node_address("[::1]:8983_solr"), "[::1]:8983");
    }

    #[test]
    fn test_error_display() {
        let err = CoordinationError::Backend {
            status: 503,
            message: "leader election in progress".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Coordination backend returned 503: leader election in progress"
        );
    }
}
