//! Upstream Contract
//!
//! Shapes exchanged between the cache layer and whatever performs the real
//! GitHub request: the `{status, data, headers}` response and the
//! conditional-request validators sent with it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

/// HTTP status GitHub answers with when a conditional request matched.
pub const STATUS_NOT_MODIFIED: u16 = 304;

/// Boxed future produced by a request function.
pub type RequestFuture = Pin<Box<dyn Future<Output = anyhow::Result<UpstreamResponse>> + Send>>;

/// Caller-provided request function kept by the cache to refresh a stale key.
pub type RefreshFn = Arc<dyn Fn(ConditionalHeaders) -> RequestFuture + Send + Sync>;

// == Upstream Response ==
/// Response returned by the upstream client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed JSON body, absent on 304 and empty responses
    pub data: Option<Value>,
    /// Response headers, names lower-cased
    pub headers: HashMap<String, String>,
}

impl UpstreamResponse {
    /// A 200 response carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            status: 200,
            data: Some(data),
            headers: HashMap::new(),
        }
    }

    /// A bodiless 304 response.
    pub fn not_modified() -> Self {
        Self {
            status: STATUS_NOT_MODIFIED,
            data: None,
            headers: HashMap::new(),
        }
    }

    /// Adds a header, lower-casing its name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == STATUS_NOT_MODIFIED
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn etag(&self) -> Option<String> {
        self.header("etag").map(str::to_string)
    }

    pub fn last_modified(&self) -> Option<String> {
        self.header("last-modified").map(str::to_string)
    }
}

// == Conditional Headers ==
/// Validators attached to a request so GitHub can answer 304.
///
/// 304 responses do not count against the GitHub rate limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalHeaders {
    /// Sent as `If-None-Match`
    pub if_none_match: Option<String>,
    /// Sent as `If-Modified-Since`
    pub if_modified_since: Option<String>,
}

impl ConditionalHeaders {
    pub fn new(etag: Option<String>, last_modified: Option<String>) -> Self {
        Self {
            if_none_match: etag,
            if_modified_since: last_modified,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.if_none_match.is_none() && self.if_modified_since.is_none()
    }

    /// Header name/value pairs ready to attach to an HTTP request.
    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(etag) = &self.if_none_match {
            pairs.push(("If-None-Match", etag.as_str()));
        }
        if let Some(modified) = &self.if_modified_since {
            pairs.push(("If-Modified-Since", modified.as_str()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = UpstreamResponse::ok(json!({}))
            .with_header("ETag", "\"abc\"")
            .with_header("Last-Modified", "Wed, 21 Oct 2015 07:28:00 GMT");

        assert_eq!(response.etag().as_deref(), Some("\"abc\""));
        assert_eq!(
            response.header("LAST-MODIFIED"),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );
    }

    #[test]
    fn test_not_modified() {
        let response = UpstreamResponse::not_modified();
        assert!(response.is_not_modified());
        assert!(response.data.is_none());
    }

    #[test]
    fn test_conditional_pairs() {
        assert!(ConditionalHeaders::default().to_pairs().is_empty());

        let headers = ConditionalHeaders::new(Some("\"v1\"".into()), None);
        assert!(!headers.is_empty());
        assert_eq!(headers.to_pairs(), vec![("If-None-Match", "\"v1\"")]);
    }
}
