//! HTTP layer for shop API communication
//!
//! This module provides:
//! - Immutable request and response values
//! - A transport boundary with a `reqwest` implementation
//! - The plugin chain wrapping every outbound call
//! - Response mediation (content, pagination links, call limits)

pub mod mediator;
pub mod message;
pub mod plugin;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use mediator::{Pagination, ResponseMediator, API_CALL_LIMIT_HEADER};
pub use message::{Content, Request, Response};
pub use plugin::{CallId, Next, Plugin, PluginChain, PluginKind};
pub use transport::{ReqwestTransport, Transport};

// Re-export commonly used types
pub use http::{HeaderMap, HeaderValue, Method, StatusCode};
