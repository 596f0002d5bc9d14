//! Raw HTTP response and JSON decoding.

use crate::{Result, SearchClientError};
use bytes::Bytes;
use http::StatusCode;
use hyper::ext::ReasonPhrase;
use serde_json::Value;

/// Longest body excerpt carried by a decode error.
pub const MAX_BODY_EXCERPT: usize = 1024;

/// Status line and body of one HTTP response, detached from the transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    reason: String,
    body: Bytes,
}

impl RawResponse {
    /// Create a response from its parts.
    pub fn new(status: StatusCode, reason: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Read a reqwest response to completion.
    ///
    /// The reason phrase is the one sent by the host. hyper only records it
    /// when it differs from the canonical phrase, so the canonical one is the
    /// fallback.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let reason = match response.extensions().get::<ReasonPhrase>() {
            Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
            None => status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
        };
        let body = response.bytes().await?;

        Ok(Self::new(status, reason, body))
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the reason phrase.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Get the response body as bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decode the body as JSON.
    ///
    /// Anything other than `200 OK` is an upstream failure, whatever the
    /// body says. The decoded value is returned as-is, without any shape
    /// checks.
    pub fn decode(&self) -> Result<Value> {
        if self.status != StatusCode::OK {
            return Err(SearchClientError::Upstream {
                status: self.status.as_u16(),
                reason: self.reason.clone(),
            });
        }

        serde_json::from_slice(&self.body).map_err(|_| SearchClientError::Decode {
            body: body_excerpt(&self.body),
        })
    }
}

/// Lossy UTF-8 view of at most [`MAX_BODY_EXCERPT`] bytes of `body`.
pub(crate) fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= MAX_BODY_EXCERPT {
        return text.into_owned();
    }

    let mut end = MAX_BODY_EXCERPT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
