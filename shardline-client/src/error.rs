//! Search client error types.

use thiserror::Error;

/// Result type for search client operations.
pub type Result<T> = std::result::Result<T, SearchClientError>;

/// Search client errors.
#[derive(Debug, Error)]
pub enum SearchClientError {
    /// The pool has no configured host and nothing quarantined to fall back on.
    #[error("Cannot find a host")]
    NoHostAvailable,

    /// The host answered with a non-success status.
    #[error("Upstream error: {status} {reason}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Reason phrase reported with the status.
        reason: String,
    },

    /// The host answered 200 but the body was not JSON.
    #[error("Parsing error: {body}")]
    Decode {
        /// Excerpt of the raw body.
        body: String,
    },

    /// The HTTP call itself failed (connect, DNS, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Both the first attempt and the retry failed.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Message of the last failure.
        message: String,
        /// The last failure.
        #[source]
        source: Box<SearchClientError>,
    },

    /// The request path could not be resolved against a host URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The selected host is not a usable base URL.
    #[error("Invalid host: {0}")]
    InvalidHost(String),

    /// A request body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SearchClientError {
    /// Check if this error counts against the host that served the attempt.
    ///
    /// Host failures trigger quarantine, coordination refresh and the retry.
    pub fn is_host_failure(&self) -> bool {
        matches!(
            self,
            Self::Upstream { .. }
                | Self::Decode { .. }
                | Self::Transport(_)
                | Self::InvalidHost(_)
        )
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout(),
            Self::RetryExhausted { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Get the HTTP status code if the host answered with an error status.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::RetryExhausted { source, .. } => source.status_code(),
            _ => None,
        }
    }

    pub(crate) fn retry_exhausted(attempts: u32, last: SearchClientError) -> Self {
        Self::RetryExhausted {
            attempts,
            message: last.to_string(),
            source: Box::new(last),
        }
    }
}
