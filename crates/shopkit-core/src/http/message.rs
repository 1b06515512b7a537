//! Immutable request and response values flowing through the plugin chain
//!
//! Every transformation returns a new value; nothing is edited in place, so a
//! retried request is always re-sent exactly as the retry plugin received it.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderMap, Method, StatusCode, Uri};
use serde_json::Value;

use crate::{Error, Result};

/// An outbound HTTP request
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Create a request without headers or body
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Parse `uri` and create a request; relative URIs (no host) are accepted
    pub fn parse(method: Method, uri: &str) -> Result<Self> {
        let uri = uri
            .parse::<Uri>()
            .map_err(|e| Error::invalid_argument(format!("Invalid URI '{}': {}", uri, e)))?;
        Ok(Self::new(method, uri))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// First value of a header, if it is valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether the target carries a host
    pub fn has_host(&self) -> bool {
        self.uri.host().map(|h| !h.is_empty()).unwrap_or(false)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// Replace every value of `name` with `value`
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set `name` only when the request does not carry it yet
    pub fn with_header_if_absent(mut self, name: HeaderName, value: HeaderValue) -> Self {
        if !self.headers.contains_key(&name) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Merge `headers` into the request, replacing same-named entries
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        let mut last: Option<HeaderName> = None;
        for (name, value) in headers {
            match name {
                Some(name) => {
                    self.headers.insert(name.clone(), value);
                    last = Some(name);
                }
                None => {
                    if let Some(name) = &last {
                        self.headers.append(name.clone(), value);
                    }
                }
            }
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }

    /// Overwrite scheme and authority (host and port) keeping path and query
    pub fn with_origin(self, scheme: Scheme, authority: Authority) -> Result<Self> {
        let path_and_query = self
            .uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        let uri = Uri::builder()
            .scheme(scheme)
            .authority(authority)
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| Error::invalid_argument(format!("Invalid request URI: {}", e)))?;
        Ok(self.with_uri(uri))
    }

    /// Replace the path keeping origin and query
    pub fn with_path(self, path: &str) -> Result<Self> {
        let path_and_query = match self.uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        };
        let mut parts = self.uri.clone().into_parts();
        parts.path_and_query = Some(
            path_and_query
                .parse::<PathAndQuery>()
                .map_err(|e| Error::invalid_argument(format!("Invalid path '{}': {}", path, e)))?,
        );
        let uri = Uri::from_parts(parts)
            .map_err(|e| Error::invalid_argument(format!("Invalid request URI: {}", e)))?;
        Ok(self.with_uri(uri))
    }
}

/// An HTTP response as received from the transport
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// First value of a header, if it is valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Declared content type, empty when absent
    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Body decoded as UTF-8, lossy
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Mediated response content
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Body parsed as JSON
    Json(Value),
    /// Raw body text (non-JSON content type or unparsable JSON)
    Text(String),
}

impl Content {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Content::Json(value) => Some(value),
            Content::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Json(_) => None,
            Content::Text(text) => Some(text),
        }
    }

    /// Convert to a JSON value; text becomes a JSON string
    pub fn into_value(self) -> Value {
        match self {
            Content::Json(value) => value,
            Content::Text(text) => Value::String(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_request_has_no_host() {
        let request = Request::parse(Method::GET, "/products.json?limit=5").unwrap();
        assert!(!request.has_host());
        assert_eq!(request.uri().path(), "/products.json");
        assert_eq!(request.uri().query(), Some("limit=5"));
    }

    #[test]
    fn test_with_origin_keeps_path_and_query() {
        let request = Request::parse(Method::GET, "/products.json?limit=5")
            .unwrap()
            .with_origin(Scheme::HTTPS, Authority::from_static("demo-shop.myshopify.com"))
            .unwrap();
        assert_eq!(
            request.uri().to_string(),
            "https://demo-shop.myshopify.com/products.json?limit=5"
        );
    }

    #[test]
    fn test_with_path_keeps_query() {
        let request = Request::parse(Method::GET, "https://x.test/a?page=2")
            .unwrap()
            .with_path("/admin/a")
            .unwrap();
        assert_eq!(request.uri().to_string(), "https://x.test/admin/a?page=2");
    }

    #[test]
    fn test_transformers_leave_original_untouched() {
        let original = Request::parse(Method::POST, "/orders.json").unwrap();
        let changed = original
            .clone()
            .with_header(HeaderName::from_static("x-test"), HeaderValue::from_static("1"))
            .with_body("{}");
        assert!(original.headers().is_empty());
        assert!(original.body().is_none());
        assert_eq!(changed.header("x-test"), Some("1"));
    }

    #[test]
    fn test_header_if_absent() {
        let request = Request::parse(Method::GET, "/")
            .unwrap()
            .with_header(http::header::ACCEPT, HeaderValue::from_static("text/html"))
            .with_header_if_absent(http::header::ACCEPT, HeaderValue::from_static("application/json"));
        assert_eq!(request.header("accept"), Some("text/html"));
    }

    #[test]
    fn test_content_into_value() {
        assert_eq!(
            Content::Text("plain".to_string()).into_value(),
            Value::String("plain".to_string())
        );
        let json = Content::Json(serde_json::json!({"a": 1}));
        assert_eq!(json.as_json().unwrap()["a"], 1);
        assert!(json.as_text().is_none());
    }
}
