//! Shop API client
//!
//! Builds requests from a path, parameters and headers, drives them through
//! the plugin chain and mediates the response.
//!
//! # Example
//!
//! ```no_run
//! use shopkit_core::{Client, Credential, HeaderMap, Result};
//! use serde_json::json;
//!
//! async fn example() -> Result<()> {
//!     let mut client = Client::new("demo-shop.myshopify.com")?;
//!     client.authenticate(Credential::bearer_token("0123456789abcdef")?);
//!     let shop = client.get("shop.json", json!({}), HeaderMap::new()).await?;
//!     println!("{:?}", shop);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use serde_json::{Map, Value};
use url::Url;

use crate::config::HttpConfig;
use crate::credential::CredentialProvider;
use crate::http::mediator::ResponseMediator;
use crate::http::message::{Content, Request, Response};
use crate::http::plugin::{
    Authentication, ErrorDetector, HeaderDefaults, History, Logger, PathPrepend, Plugin, PluginChain,
    PluginKind, RateLimit, Redirect, Retry, ShopDomain,
};
use crate::http::transport::{ReqwestTransport, Transport};
use crate::utils::validate_shop_domain;
use crate::{Error, Result};

/// Base path of every API resource
pub const DEFAULT_BASE_PATH: &str = "/admin";

/// Client for one shop endpoint
pub struct Client {
    endpoint: String,
    base_path: PathPrepend,
    config: HttpConfig,
    transport: Arc<dyn Transport>,
    chain: PluginChain,
    history: Arc<History>,
}

impl Client {
    /// Client for `https://<shop_domain>` with default settings
    pub fn new(shop_domain: &str) -> Result<Self> {
        Self::with_config(shop_domain, HttpConfig::default())
    }

    /// Client for `https://<shop_domain>`
    pub fn with_config(shop_domain: &str, config: HttpConfig) -> Result<Self> {
        validate_shop_domain(shop_domain)?;
        let transport = ReqwestTransport::new(&config)?;
        Self::with_endpoint(&format!("https://{}", shop_domain), Arc::new(transport), config)
    }

    /// Client for an arbitrary endpoint (proxy, test server) over `transport`
    pub fn with_endpoint(endpoint: &str, transport: Arc<dyn Transport>, config: HttpConfig) -> Result<Self> {
        config.validate()?;
        let endpoint = normalize_endpoint(endpoint)?;
        let base_path = PathPrepend::new(DEFAULT_BASE_PATH);
        let history = Arc::new(History::new());

        let chain = PluginChain::new()
            .with(PluginKind::ErrorDetector, ErrorDetector::new())
            .with(PluginKind::History, history.clone())
            .with(PluginKind::Retry, Retry::new(config.retries))
            .with(PluginKind::RateLimit, RateLimit::new())
            .with(PluginKind::Logger, Logger::new())
            .with(PluginKind::Redirect, Redirect::new(config.max_redirects))
            .with(PluginKind::ShopDomain, ShopDomain::new(&endpoint, false)?)
            .with(PluginKind::PathPrepend, base_path.clone())
            .with(PluginKind::HeaderDefaults, HeaderDefaults::new(&config.user_agent)?);

        tracing::debug!(target: "shopkit::http", %endpoint, plugins = ?chain, "client created");

        Ok(Self {
            endpoint,
            base_path,
            config,
            transport,
            chain,
            history,
        })
    }

    /// Scheme and authority requests are sent to, e.g. `https://demo-shop.myshopify.com`
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn base_path(&self) -> &str {
        self.base_path.base()
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Authenticate every later call with `credential`, replacing any previous one
    pub fn authenticate(&mut self, credential: impl CredentialProvider + 'static) {
        self.chain
            .insert(PluginKind::Authentication, Arc::new(Authentication::new(credential)));
    }

    pub fn is_authenticated(&self) -> bool {
        self.chain.contains(PluginKind::Authentication)
    }

    /// Attach a caching plugin in the innermost slot
    pub fn add_cache(&mut self, cache: impl Plugin + 'static) {
        self.chain.insert(PluginKind::Cache, Arc::new(cache));
    }

    pub fn remove_cache(&mut self) {
        self.chain.remove(PluginKind::Cache);
    }

    /// Swap the plugin in the `kind` slot
    ///
    /// The history slot belongs to the client and cannot be replaced.
    pub fn replace_plugin(
        &mut self,
        kind: PluginKind,
        plugin: impl Plugin + 'static,
    ) -> Result<Option<Arc<dyn Plugin>>> {
        if kind == PluginKind::History {
            return Err(Error::invalid_argument("The history plugin cannot be replaced"));
        }
        Ok(self.chain.insert(kind, Arc::new(plugin)))
    }

    /// Occupied chain slots, outermost first
    pub fn plugin_kinds(&self) -> Vec<PluginKind> {
        self.chain.kinds()
    }

    /// The last request that produced a successful response
    pub fn last_request(&self) -> Option<Request> {
        self.history.last_request()
    }

    /// The last successful response
    pub fn last_response(&self) -> Option<Response> {
        self.history.last_response()
    }

    pub fn history(&self) -> &Arc<History> {
        &self.history
    }

    /// Absolute URI for an API path, with `params` as the query string
    ///
    /// Absolute `http(s)://` paths are returned unchanged apart from the query.
    pub fn build_uri(&self, path: &str, params: &Value) -> Result<String> {
        let target = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            let path = format!("/{}", path.trim_start_matches('/'));
            if self.base_path.is_prefixed(&path) {
                format!("{}{}", self.endpoint, path)
            } else {
                format!("{}{}{}", self.endpoint, self.base_path.base(), path)
            }
        };

        let pairs = query_pairs(params)?;
        if pairs.is_empty() {
            return Ok(target);
        }

        let mut url = Url::parse(&target)
            .map_err(|e| Error::invalid_argument(format!("Invalid URI '{}': {}", target, e)))?;
        url.query_pairs_mut().extend_pairs(pairs);
        Ok(url.to_string())
    }

    pub async fn get(&self, path: &str, params: Value, headers: HeaderMap) -> Result<Content> {
        let response = self.call(Method::GET, path, params, headers).await?;
        Ok(ResponseMediator::get_content(&response))
    }

    /// HEAD has no content; the raw response is returned
    pub async fn head(&self, path: &str, params: Value, headers: HeaderMap) -> Result<Response> {
        self.call(Method::HEAD, path, params, headers).await
    }

    pub async fn post(&self, path: &str, params: Value, headers: HeaderMap) -> Result<Content> {
        let response = self.call(Method::POST, path, params, headers).await?;
        Ok(ResponseMediator::get_content(&response))
    }

    pub async fn put(&self, path: &str, params: Value, headers: HeaderMap) -> Result<Content> {
        let response = self.call(Method::PUT, path, params, headers).await?;
        Ok(ResponseMediator::get_content(&response))
    }

    pub async fn patch(&self, path: &str, params: Value, headers: HeaderMap) -> Result<Content> {
        let response = self.call(Method::PATCH, path, params, headers).await?;
        Ok(ResponseMediator::get_content(&response))
    }

    /// DELETE sends `params` both as the query string and as the body
    pub async fn delete(&self, path: &str, params: Value, headers: HeaderMap) -> Result<Content> {
        let response = self.call(Method::DELETE, path, params, headers).await?;
        Ok(ResponseMediator::get_content(&response))
    }

    /// POST a pre-encoded body as is
    pub async fn post_raw(&self, path: &str, body: impl Into<Bytes>, headers: HeaderMap) -> Result<Content> {
        let uri = self.build_uri(path, &Value::Null)?;
        let request = Request::parse(Method::POST, &uri)?
            .with_headers(headers)
            .with_body(body);
        let response = self.send(request).await?;
        Ok(ResponseMediator::get_content(&response))
    }

    /// Drive a prepared request through the chain as a new logical call
    pub async fn send(&self, request: Request) -> Result<Response> {
        self.chain.dispatch(request, self.transport.as_ref()).await
    }

    async fn call(&self, method: Method, path: &str, params: Value, headers: HeaderMap) -> Result<Response> {
        let in_query = matches!(method, Method::GET | Method::HEAD | Method::DELETE);
        let has_body = !matches!(method, Method::GET | Method::HEAD);

        let uri = if in_query {
            self.build_uri(path, &params)?
        } else {
            self.build_uri(path, &Value::Null)?
        };

        let mut request = Request::parse(method, &uri)?.with_headers(headers);
        if has_body {
            if let Some(body) = json_body(&params)? {
                request = request
                    .with_header_if_absent(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                    .with_body(body);
            }
        }

        self.send(request).await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("base_path", &self.base_path.base())
            .field("plugins", &self.chain)
            .finish_non_exhaustive()
    }
}

/// `scheme://authority` of `endpoint`, without path or trailing slash
fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::invalid_argument(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::invalid_argument(format!("Endpoint '{}' has no host", endpoint)))?;

    Ok(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Serialized body, or `None` for empty parameters
fn json_body(params: &Value) -> Result<Option<Vec<u8>>> {
    let empty = match params {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Ok(None);
    }
    Ok(Some(serde_json::to_vec(params)?))
}

/// Flatten query parameters: nested objects as `key[sub]`, arrays comma-joined
fn query_pairs(params: &Value) -> Result<Vec<(String, String)>> {
    match params {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => {
            let mut pairs = Vec::new();
            flatten(None, map, &mut pairs);
            Ok(pairs)
        }
        other => Err(Error::invalid_argument(format!(
            "Query parameters must be a JSON object, got {}",
            other
        ))),
    }
}

fn flatten(prefix: Option<&str>, map: &Map<String, Value>, pairs: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let key = match prefix {
            Some(prefix) => format!("{}[{}]", prefix, key),
            None => key.clone(),
        };
        match value {
            Value::Null => {}
            Value::Object(nested) => flatten(Some(&key), nested, pairs),
            Value::Array(items) => {
                let joined: Vec<String> = items.iter().filter_map(scalar).collect();
                pairs.push((key, joined.join(",")));
            }
            other => {
                if let Some(value) = scalar(other) {
                    pairs.push((key, value));
                }
            }
        }
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
