//! Search client configuration.

use crate::pool::DEFAULT_QUARANTINE;
use crate::request::parse_host;
use crate::{Result, SearchClientError};
use serde::Deserialize;
use shardline_discovery::CoordinationConfig;
use std::path::Path;
use std::time::Duration;

/// Prefix of the environment variables read by [`SearchClientConfig::from_env`].
pub const ENV_PREFIX: &str = "SHARDLINE";

/// Search client configuration.
#[derive(Debug, Clone)]
pub struct SearchClientConfig {
    /// Base URLs of the search hosts, e.g. `http://10.0.0.1:8983/solr/`.
    pub hosts: Vec<String>,
    /// Timeout of one HTTP attempt.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// How long a failed host is kept out of rotation.
    pub quarantine: Duration,
    /// Where to fetch a fresh host list after a failure.
    pub coordination: Option<CoordinationConfig>,
    /// Seed for host selection; entropy-seeded when `None`.
    pub selection_seed: Option<u64>,
    /// User agent string.
    pub user_agent: String,
}

impl Default for SearchClientConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            quarantine: DEFAULT_QUARANTINE,
            coordination: None,
            selection_seed: None,
            user_agent: format!("shardline-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// On-disk form of the configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    hosts: Vec<String>,
    timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    quarantine_secs: Option<u64>,
    coordination: Option<CoordinationConfig>,
    selection_seed: Option<u64>,
    user_agent: Option<String>,
}

impl SearchClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SearchClientConfigBuilder {
        SearchClientConfigBuilder::default()
    }

    /// Parse a TOML document.
    ///
    /// ```toml
    /// hosts = ["http://10.0.0.1:8983/solr/"]
    /// timeout_secs = 15
    /// quarantine_secs = 300
    ///
    /// [coordination]
    /// kind = "consul"
    /// url = "http://127.0.0.1:8500"
    /// service = "solr"
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(source).map_err(|e| SearchClientError::Config(e.to_string()))?;

        let defaults = Self::default();
        Ok(Self {
            hosts: file.hosts,
            timeout: file.timeout_secs.map_or(defaults.timeout, Duration::from_secs),
            connect_timeout: file
                .connect_timeout_secs
                .map_or(defaults.connect_timeout, Duration::from_secs),
            quarantine: file
                .quarantine_secs
                .map_or(defaults.quarantine, Duration::from_secs),
            coordination: file.coordination,
            selection_seed: file.selection_seed,
            user_agent: file.user_agent.unwrap_or(defaults.user_agent),
        })
    }

    /// Load a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| SearchClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Read `SHARDLINE_HOSTS` (comma separated), `SHARDLINE_TIMEOUT_SECS`
    /// and `SHARDLINE_QUARANTINE_SECS`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}_{key}")).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(hosts) = lookup("HOSTS") {
            config.hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|host| !host.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(secs) = lookup("TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_secs("TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = lookup("QUARANTINE_SECS") {
            config.quarantine = Duration::from_secs(parse_secs("QUARANTINE_SECS", &secs)?);
        }

        Ok(config)
    }

    /// Check the configuration before a client is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(SearchClientError::Config(
                "timeout must be greater than zero".to_string(),
            ));
        }

        for host in &self.hosts {
            parse_host(host).map_err(|e| SearchClientError::Config(e.to_string()))?;
        }

        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| SearchClientError::Config(format!("{ENV_PREFIX}_{key}={value}: {e}")))
}

/// Builder for search client configuration.
#[derive(Debug, Default)]
pub struct SearchClientConfigBuilder {
    config: SearchClientConfig,
}

impl SearchClientConfigBuilder {
    /// Add one host base URL.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.hosts.push(host.into());
        self
    }

    /// Add several host base URLs.
    pub fn hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.hosts.extend(hosts.into_iter().map(Into::into));
        self
    }

    /// Set the timeout of one HTTP attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the quarantine window for failed hosts.
    pub fn quarantine(mut self, quarantine: Duration) -> Self {
        self.config.quarantine = quarantine;
        self
    }

    /// Refresh the host list from a coordination service after failures.
    pub fn coordination(mut self, coordination: CoordinationConfig) -> Self {
        self.config.coordination = Some(coordination);
        self
    }

    /// Make host selection reproducible.
    pub fn selection_seed(mut self, seed: u64) -> Self {
        self.config.selection_seed = Some(seed);
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SearchClientConfig {
        self.config
    }
}
