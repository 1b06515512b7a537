//! Shopkit Core - client SDK for a shop REST API
//!
//! This crate builds authenticated requests, drives them through a chain of
//! middleware plugins and mediates the JSON responses, including Link-header
//! pagination.
//!
//! # Main Components
//!
//! - **Error Handling**: Error types using `thiserror` and `anyhow`
//! - **Credentials**: Shared-secret (Basic) and bearer-token authentication
//! - **Plugin Chain**: Error detection, history, retry, rate limits, logging,
//!   redirects, host/path normalization, default headers, authentication
//! - **Response Mediation**: Content decoding, pagination links, call limits
//! - **Client / Resource / Pager**: Verb methods, REST resources and
//!   exhaustive pagination walks
//!
//! # Example
//!
//! ```no_run
//! use shopkit_core::{Result, SdkConfig, ShopSdk};
//! use serde_json::Value;
//!
//! async fn example() -> Result<()> {
//!     let sdk = ShopSdk::new(
//!         SdkConfig::new("key", "secret", "demo-shop.myshopify.com").with_password("password"),
//!     )?;
//!     let products = sdk.resource("products")?;
//!     let all = sdk.pager().fetch_all(&products, |p| p.list(Value::Null)).await?;
//!     println!("{}", all);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod pagination;
pub mod resource;
pub mod sdk;
pub mod utils;

// Re-export main types for convenience
pub use client::{Client, DEFAULT_BASE_PATH};
pub use config::{HttpConfig, SdkConfig};
pub use credential::{AccessToken, Credential, CredentialKind, CredentialProvider};
pub use error::{Error, ErrorKind, Result};
pub use crate::http::{
    CallId, Content, HeaderMap, HeaderValue, Method, Next, Pagination, Plugin, PluginChain, PluginKind,
    ReqwestTransport, Request, Response, ResponseMediator, StatusCode, Transport,
};
pub use pagination::{PageableApi, Pager, DEFAULT_MAX_PER_PAGE};
pub use resource::Resource;
pub use sdk::ShopSdk;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
