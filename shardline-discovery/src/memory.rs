//! In-memory coordination (for testing and fixed deployments)

use crate::service::{CoordinationError, CoordinationService};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory coordination service.
///
/// Holds a host list that can be swapped at runtime and can be switched
/// into an unavailable state to simulate a coordination outage.
#[derive(Clone, Default)]
pub struct StaticCoordination {
    hosts: Arc<RwLock<Vec<String>>>,
    unavailable: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl StaticCoordination {
    /// Create a coordination service reporting the given addresses
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: Arc::new(RwLock::new(hosts.into_iter().map(Into::into).collect())),
            ..Default::default()
        }
    }

    /// Replace the reported addresses
    pub async fn set_hosts<I, S>(&self, hosts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.hosts.write().await = hosts.into_iter().map(Into::into).collect();
    }

    /// Make every subsequent lookup fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of lookups served so far, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoordinationService for StaticCoordination {
    async fn list_active_hosts(&self) -> Result<Vec<String>, CoordinationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoordinationError::Unavailable(
                "static coordination marked unavailable".to_string(),
            ));
        }

        Ok(self.hosts.read().await.clone())
    }

    fn backend(&self) -> &'static str {
        "static"
    }
}
