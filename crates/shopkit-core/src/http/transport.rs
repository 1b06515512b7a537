//! Transport boundary: the capability that actually moves bytes
//!
//! The plugin chain terminates in a [`Transport`]. The default implementation
//! wraps `reqwest`; tests substitute scripted transports.

use async_trait::async_trait;

use crate::config::HttpConfig;
use crate::http::message::{Request, Response};
use crate::{Error, Result};

/// Sends one fully qualified request and returns the raw response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}

/// `reqwest` backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport from HTTP settings
    pub fn new(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(!config.validate_tls)
            // Redirects are followed by the redirect plugin, not by reqwest.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(anyhow::Error::new(e)),
            })?;

        Ok(Self { client })
    }

    /// Wrap an already configured `reqwest` client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        if !request.has_host() {
            return Err(Error::invalid_argument(format!(
                "Request URI '{}' has no host",
                request.uri()
            )));
        }

        let mut builder = self
            .client
            .request(request.method().clone(), request.uri().to_string())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response::new(status, headers, body))
    }
}
