use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use http::HeaderMap;

use super::{Next, Plugin};
use crate::http::message::{Request, Response};
use crate::{Error, Result};

/// Adds default headers the caller did not set
#[derive(Debug, Clone)]
pub struct HeaderDefaults {
    headers: HeaderMap,
}

impl HeaderDefaults {
    /// `Accept: application/json` plus the given `User-Agent`
    pub fn new(user_agent: &str) -> Result<Self> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| Error::invalid_argument(format!("Invalid user agent '{}': {}", user_agent, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, user_agent);
        Ok(Self { headers })
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[async_trait]
impl Plugin for HeaderDefaults {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let request = self
            .headers
            .iter()
            .fold(request, |request, (name, value)| {
                request.with_header_if_absent(name.clone(), value.clone())
            });
        next.run(request).await
    }
}
