//! Logical search request.

use crate::response::body_excerpt;
use crate::{Result, SearchClientError};
use bytes::Bytes;
use http::Method;
use url::Url;

/// Query parameters added to every request, overriding caller values.
///
/// JSON output, no response header, and named lists encoded as JSON maps.
pub const FIXED_PARAMS: [(&str, &str); 3] =
    [("wt", "json"), ("omitHeader", "true"), ("json.nl", "map")];

/// One caller request, independent of the host that will serve it.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    body: Option<Bytes>,
}

impl SearchRequest {
    /// Create a request.
    pub fn new<K, V>(
        method: Method,
        path: impl Into<String>,
        params: &[(K, V)],
        body: Option<Bytes>,
    ) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self {
            method,
            path: path.into(),
            params: params
                .iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
                .collect(),
            body,
        }
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the host base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Caller-supplied query parameters.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Request body.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Printable excerpt of the body for log events.
    pub fn body_excerpt(&self) -> String {
        self.body
            .as_deref()
            .map(body_excerpt)
            .unwrap_or_default()
    }

    /// Caller parameters merged with [`FIXED_PARAMS`].
    ///
    /// Repeated caller keys are kept in order; a caller key that collides
    /// with a fixed parameter is dropped.
    pub fn query(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .filter(|(key, _)| !FIXED_PARAMS.iter().any(|(fixed, _)| *fixed == key.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(FIXED_PARAMS)
            .collect()
    }

    /// Full URL for this request against `host`.
    ///
    /// A host that is not a base URL fails with
    /// [`SearchClientError::InvalidHost`]; a path that cannot be joined onto
    /// it fails with [`SearchClientError::InvalidUrl`].
    pub fn url_for(&self, host: &str) -> Result<Url> {
        let base = parse_host(host)?;
        let mut url = base
            .join(&self.path)
            .map_err(|e| SearchClientError::InvalidUrl(format!("{}: {e}", self.path)))?;

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in self.query() {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

/// Parse `host` as a base URL that request paths can be joined onto.
pub(crate) fn parse_host(host: &str) -> Result<Url> {
    let url =
        Url::parse(host).map_err(|e| SearchClientError::InvalidHost(format!("{host}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(SearchClientError::InvalidHost(format!(
            "{host}: cannot be a base URL"
        )));
    }
    Ok(url)
}
