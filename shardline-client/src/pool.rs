//! Host pool with time-bounded quarantine.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default time a failed host stays quarantined.
pub const DEFAULT_QUARANTINE: Duration = Duration::from_secs(5 * 60);

/// Set of interchangeable hosts plus a blacklist of recent failures.
///
/// Expired blacklist entries are pruned lazily, on the next selection.
/// All state sits behind one mutex, so a pool can be shared between tasks.
#[derive(Debug)]
pub struct HostPool {
    quarantine: Duration,
    state: Mutex<PoolState>,
}

#[derive(Debug)]
struct PoolState {
    hosts: Vec<String>,
    blacklist: HashMap<String, Instant>,
    rng: StdRng,
}

impl HostPool {
    /// Create a pool with an entropy-seeded random source.
    pub fn new<I, S>(hosts: I, quarantine: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_rng(hosts, quarantine, StdRng::from_os_rng())
    }

    /// Create a pool whose random selection is reproducible.
    pub fn with_seed<I, S>(hosts: I, quarantine: Duration, seed: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_rng(hosts, quarantine, StdRng::seed_from_u64(seed))
    }

    fn with_rng<I, S>(hosts: I, quarantine: Duration, rng: StdRng) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            quarantine,
            state: Mutex::new(PoolState {
                hosts: dedup(hosts),
                blacklist: HashMap::new(),
                rng,
            }),
        }
    }

    /// Quarantine window.
    pub fn quarantine(&self) -> Duration {
        self.quarantine
    }

    /// Pick the host for the next request.
    pub fn select(&self) -> Option<String> {
        self.select_at(Instant::now())
    }

    /// Pick the host for a request issued at `now`.
    ///
    /// Healthy hosts are chosen uniformly at random. When every configured
    /// host is quarantined, the host that failed longest ago is released
    /// from the blacklist and returned instead.
    pub fn select_at(&self, now: Instant) -> Option<String> {
        let mut state = self.state.lock();
        let quarantine = self.quarantine;
        state
            .blacklist
            .retain(|_, marked_at| now.saturating_duration_since(*marked_at) < quarantine);

        let PoolState {
            hosts,
            blacklist,
            rng,
        } = &mut *state;

        let candidates: Vec<&String> = hosts
            .iter()
            .filter(|host| !blacklist.contains_key(*host))
            .collect();

        if !candidates.is_empty() {
            let host = candidates[rng.random_range(0..candidates.len())].clone();
            debug!(host = %host, healthy = candidates.len(), "Selected host");
            return Some(host);
        }

        let oldest = blacklist
            .iter()
            .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(host, _)| host.clone())?;
        blacklist.remove(&oldest);

        warn!(host = %oldest, "All hosts quarantined, falling back to the oldest failure");
        Some(oldest)
    }

    /// Quarantine `host` starting now.
    pub fn mark_bad(&self, host: &str) {
        self.mark_bad_at(host, Instant::now());
    }

    /// Quarantine `host` starting at `now`; re-marking restarts the window.
    pub fn mark_bad_at(&self, host: &str, now: Instant) {
        self.state.lock().blacklist.insert(host.to_string(), now);
    }

    /// Replace the configured hosts. Quarantined hosts stay quarantined.
    pub fn replace_hosts<I, S>(&self, hosts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.lock().hosts = dedup(hosts);
    }

    /// Snapshot of the configured hosts.
    pub fn hosts(&self) -> Vec<String> {
        self.state.lock().hosts.clone()
    }

    /// Snapshot of quarantined hosts, oldest failure first.
    ///
    /// Entries whose window has passed but which no selection has pruned
    /// yet are included.
    pub fn blacklisted(&self) -> Vec<(String, Instant)> {
        let state = self.state.lock();
        let mut entries: Vec<_> = state
            .blacklist
            .iter()
            .map(|(host, marked_at)| (host.clone(), *marked_at))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    /// Check whether `host` is inside its quarantine window at `now`.
    pub fn is_quarantined_at(&self, host: &str, now: Instant) -> bool {
        self.state
            .lock()
            .blacklist
            .get(host)
            .is_some_and(|marked_at| now.saturating_duration_since(*marked_at) < self.quarantine)
    }

    /// Check whether `host` is currently quarantined.
    pub fn is_quarantined(&self, host: &str) -> bool {
        self.is_quarantined_at(host, Instant::now())
    }
}

fn dedup<I, S>(hosts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut unique: Vec<String> = Vec::new();
    for host in hosts {
        let host = host.into();
        if !unique.contains(&host) {
            unique.push(host);
        }
    }
    unique
}
