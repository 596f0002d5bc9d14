//! Search client implementation.

use bytes::Bytes;
use http::{Method, header};
use serde::Serialize;
use serde_json::Value;
use shardline_discovery::CoordinationService;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::{
    HostPool, HostRefresher, RawResponse, Result, SearchClientConfig, SearchClientError,
    SearchRequest,
};

/// Physical attempts per logical request: the first one plus one retry.
pub const MAX_ATTEMPTS: u32 = 2;

/// Client for a search cluster of interchangeable hosts.
///
/// Each request goes to a randomly chosen healthy host. A host that fails
/// is quarantined, the host list is refreshed from the coordination
/// service when one is configured, and the request is retried once.
///
/// Clones share the same host pool.
#[derive(Clone)]
pub struct SearchClient {
    inner: reqwest::Client,
    config: Arc<SearchClientConfig>,
    pool: Arc<HostPool>,
    refresher: Option<HostRefresher>,
}

impl SearchClient {
    /// Create a new search client with the given configuration.
    pub fn new(config: SearchClientConfig) -> Result<Self> {
        config.validate()?;

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| SearchClientError::Config(format!("failed to build HTTP client: {e}")))?;

        let pool = match config.selection_seed {
            Some(seed) => HostPool::with_seed(config.hosts.iter().cloned(), config.quarantine, seed),
            None => HostPool::new(config.hosts.iter().cloned(), config.quarantine),
        };

        let refresher = config
            .coordination
            .as_ref()
            .map(|coordination| coordination.build())
            .transpose()
            .map_err(|e| SearchClientError::Config(e.to_string()))?
            .map(HostRefresher::new);

        Ok(Self {
            inner,
            config: Arc::new(config),
            pool: Arc::new(pool),
            refresher,
        })
    }

    /// Use `service` to refresh the host list, replacing any configured one.
    pub fn with_coordination(mut self, service: Arc<dyn CoordinationService>) -> Self {
        self.refresher = Some(HostRefresher::new(service));
        self
    }

    /// Get the client configuration.
    pub fn config(&self) -> &SearchClientConfig {
        &self.config
    }

    /// Get the host pool.
    pub fn pool(&self) -> &HostPool {
        &self.pool
    }

    /// Snapshot of the configured hosts.
    pub fn hosts(&self) -> Vec<String> {
        self.pool.hosts()
    }

    /// Send a GET request.
    pub async fn get<K, V>(&self, path: &str, params: &[(K, V)]) -> Result<Value>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.execute(SearchRequest::new(Method::GET, path, params, None))
            .await
    }

    /// Send a POST request with a raw body.
    pub async fn post<K, V>(
        &self,
        path: &str,
        params: &[(K, V)],
        body: impl Into<Bytes>,
    ) -> Result<Value>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.execute(SearchRequest::new(
            Method::POST,
            path,
            params,
            Some(body.into()),
        ))
        .await
    }

    /// Send a POST request with a JSON-serialized body.
    pub async fn post_json<K, V, T>(
        &self,
        path: &str,
        params: &[(K, V)],
        body: &T,
    ) -> Result<Value>
    where
        K: AsRef<str>,
        V: AsRef<str>,
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(body)?;
        self.post(path, params, body).await
    }

    /// Execute a request with host failover.
    ///
    /// Fails with [`SearchClientError::NoHostAvailable`] without touching
    /// the network when the pool is empty. Otherwise makes at most
    /// [`MAX_ATTEMPTS`] attempts and reports
    /// [`SearchClientError::RetryExhausted`] if all of them fail.
    pub async fn execute(&self, request: SearchRequest) -> Result<Value> {
        let mut last_error = None;

        for attempt in 1..=MAX_ATTEMPTS {
            let Some(host) = self.pool.select() else {
                return Err(SearchClientError::NoHostAvailable);
            };

            debug!(attempt, host = %host, path = request.path(), "Sending search request");

            match self.execute_once(&host, &request).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_host_failure() => return Err(e),
                Err(e) => {
                    error!(
                        attempt,
                        host = %host,
                        method = %request.method(),
                        path = request.path(),
                        params = ?request.params(),
                        body = %request.body_excerpt(),
                        error = %e,
                        "Search request failed"
                    );
                    warn!(
                        host = %host,
                        quarantine_secs = self.pool.quarantine().as_secs(),
                        "Marking host as bad"
                    );
                    self.pool.mark_bad(&host);

                    if let Some(refresher) = &self.refresher {
                        refresher.refresh(&self.pool).await;
                    }

                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(last) => SearchClientError::retry_exhausted(MAX_ATTEMPTS, last),
            None => SearchClientError::NoHostAvailable,
        })
    }

    /// Execute request once against `host` without retry.
    async fn execute_once(&self, host: &str, request: &SearchRequest) -> Result<Value> {
        let url = request.url_for(host)?;

        let mut builder = self
            .inner
            .request(request.method().clone(), url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        RawResponse::from_reqwest(response).await?.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shardline_discovery::{CoordinationConfig, StaticCoordination};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(host: String) -> SearchClient {
        let config = SearchClientConfig::builder()
            .host(host)
            .timeout(Duration::from_secs(2))
            .selection_seed(7)
            .build();
        SearchClient::new(config).unwrap()
    }

    /// Serve every connection with `status_line` and an empty body.
    async fn raw_host(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }
                let response =
                    format!("{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });

        format!("http://{addr}/solr/")
    }

    #[test]
    fn test_client_creation() {
        let config = SearchClientConfig::builder()
            .hosts(["http://10.0.0.1:8983/solr/", "http://10.0.0.2:8983/solr/"])
            .timeout(Duration::from_secs(5))
            .build();

        let client = SearchClient::new(config).unwrap();
        assert_eq!(client.hosts().len(), 2);
        assert_eq!(client.config().timeout, Duration::from_secs(5));
        assert_eq!(client.pool().quarantine(), Duration::from_secs(300));
        assert!(client.refresher.is_none());
    }

    #[test]
    fn test_client_with_coordination_config() {
        let config = SearchClientConfig::builder()
            .coordination(CoordinationConfig::Consul {
                url: "http://127.0.0.1:8500".to_string(),
                service: "solr".to_string(),
            })
            .build();

        let client = SearchClient::new(config).unwrap();
        let refresher = client.refresher.as_ref().unwrap();
        assert_eq!(refresher.service().backend(), "consul");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SearchClientConfig::builder().host("not a url").build();
        assert!(matches!(
            SearchClient::new(config),
            Err(SearchClientError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_pool_fails_fast() {
        let client = SearchClient::new(SearchClientConfig::default()).unwrap();

        let result = client.get("select", &[("q", "*:*")]).await;
        assert!(matches!(result, Err(SearchClientError::NoHostAvailable)));
    }

    #[tokio::test]
    async fn test_invalid_path_is_not_a_host_failure() {
        let config = SearchClientConfig::builder()
            .host("http://127.0.0.1:1/solr/")
            .build();
        let client = SearchClient::new(config).unwrap();

        let result = client.get::<&str, &str>("http://[::1", &[]).await;
        assert!(matches!(result, Err(SearchClientError::InvalidUrl(_))));
        assert!(client.pool().blacklisted().is_empty());
    }

    #[tokio::test]
    async fn test_execute_decodes_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solr/collection1/select"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"numFound": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(format!("{}/solr/", server.uri()));
        let request = SearchRequest::new(Method::GET, "collection1/select", &[("q", "*:*")], None);

        assert_eq!(client.execute(request).await.unwrap(), json!({"numFound": 0}));
        assert!(client.pool().blacklisted().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_retries_once() {
        let server = MockServer::start().await;
        Mock::given(path("/solr/collection1/select"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let host = format!("{}/solr/", server.uri());
        let client = client_for(host.clone());

        let err = client
            .get::<&str, &str>("collection1/select", &[])
            .await
            .unwrap_err();

        match &err {
            SearchClientError::RetryExhausted { source, .. } => match source.as_ref() {
                SearchClientError::Upstream { status, reason } => {
                    assert_eq!(*status, 503);
                    assert_eq!(reason, "Service Unavailable");
                }
                other => panic!("unexpected source: {other:?}"),
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(client.pool().is_quarantined(&host));
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_wire_reason() {
        let host = raw_host("HTTP/1.1 500 Server Error").await;
        let client = client_for(host);

        let err = client
            .get::<&str, &str>("collection1/select", &[])
            .await
            .unwrap_err();

        match err {
            SearchClientError::RetryExhausted { source, message, .. } => {
                match *source {
                    SearchClientError::Upstream { status, reason } => {
                        assert_eq!(status, 500);
                        assert_eq!(reason, "Server Error");
                    }
                    other => panic!("unexpected source: {other:?}"),
                }
                assert!(message.ends_with("500 Server Error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unusable_host_is_quarantined_and_retried() {
        let server = MockServer::start().await;
        Mock::given(path("/solr/collection1/select"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let coordination = StaticCoordination::new([server.address().to_string()]);
        let client = client_for(format!("{}/solr/", server.uri()))
            .with_coordination(Arc::new(coordination.clone()));
        client.pool().replace_hosts(["http://::1:8983/solr/"]);

        let value = client
            .get::<&str, &str>("collection1/select", &[])
            .await
            .unwrap();

        assert_eq!(value, json!({"ok": true}));
        assert!(client.pool().is_quarantined("http://::1:8983/solr/"));
        assert_eq!(coordination.calls(), 1);
        assert_eq!(client.hosts(), vec![format!("{}/solr/", server.uri())]);
    }

    #[tokio::test]
    async fn test_unusable_host_alone_exhausts_retry() {
        let client = client_for("http://127.0.0.1:1/solr/".to_string());
        client.pool().replace_hosts(["http://::1:8983/solr/"]);

        let err = client
            .get::<&str, &str>("collection1/select", &[])
            .await
            .unwrap_err();

        match err {
            SearchClientError::RetryExhausted { attempts, source, .. } => {
                assert_eq!(attempts, MAX_ATTEMPTS);
                assert!(matches!(*source, SearchClientError::InvalidHost(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
