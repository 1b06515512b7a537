//! Request middleware chain
//!
//! A [`Plugin`] receives the in-flight request and a [`Next`] continuation
//! standing for the rest of the chain, terminating in a [`Transport`]. It may
//! rewrite the request, rewrite the response, short-circuit, or run the
//! continuation several times.
//!
//! ```text
//! ErrorDetector → History → Retry → RateLimit → Logger → Redirect
//!   → ShopDomain → PathPrepend → HeaderDefaults → Authentication → Cache
//!   → transport
//! ```
//!
//! The order is fixed by [`PluginKind`]; a [`PluginChain`] holds at most one
//! plugin per kind.

mod authentication;
mod domain;
mod error_detector;
mod headers;
mod history;
mod logger;
mod rate_limit;
mod redirect;
mod retry;

pub use authentication::Authentication;
pub use domain::{PathPrepend, ShopDomain};
pub use error_detector::ErrorDetector;
pub use headers::HeaderDefaults;
pub use history::{Exchange, History};
pub use logger::Logger;
pub use rate_limit::RateLimit;
pub use redirect::Redirect;
pub use retry::{default_delay, default_decider, Retry, RetryDecider, RetryDelay};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::http::message::{Request, Response};
use crate::http::transport::Transport;
use crate::Result;

/// One interceptor in the chain
#[async_trait]
pub trait Plugin: Send + Sync {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response>;
}

#[async_trait]
impl<P: Plugin + ?Sized> Plugin for Arc<P> {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        (**self).handle(request, next).await
    }
}

/// Identity of one logical call, shared by all of its retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(u64);

impl CallId {
    /// Allocate a token no other call in this process has seen
    pub fn fresh() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call-{}", self.0)
    }
}

/// The remainder of the chain
///
/// `Next` is `Copy`; running it twice re-enters every downstream plugin.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    plugins: &'a [Arc<dyn Plugin>],
    transport: &'a dyn Transport,
    call: CallId,
}

impl<'a> Next<'a> {
    pub(crate) fn new(plugins: &'a [Arc<dyn Plugin>], transport: &'a dyn Transport, call: CallId) -> Self {
        Self {
            plugins,
            transport,
            call,
        }
    }

    /// Hand `request` to the next plugin, or to the transport at the end
    pub async fn run(self, request: Request) -> Result<Response> {
        match self.plugins.split_first() {
            Some((plugin, rest)) => {
                let next = Next {
                    plugins: rest,
                    ..self
                };
                plugin.handle(request, next).await
            }
            None => self.transport.send(request).await,
        }
    }

    /// The logical call this continuation belongs to
    pub fn call_id(&self) -> CallId {
        self.call
    }

    /// Number of plugins left before the transport
    pub fn remaining(&self) -> usize {
        self.plugins.len()
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.plugins.len())
            .field("call", &self.call)
            .finish()
    }
}

/// Chain slots, outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginKind {
    ErrorDetector,
    History,
    Retry,
    RateLimit,
    Logger,
    Redirect,
    ShopDomain,
    PathPrepend,
    HeaderDefaults,
    Authentication,
    Cache,
}

impl PluginKind {
    pub const ALL: [PluginKind; 11] = [
        PluginKind::ErrorDetector,
        PluginKind::History,
        PluginKind::Retry,
        PluginKind::RateLimit,
        PluginKind::Logger,
        PluginKind::Redirect,
        PluginKind::ShopDomain,
        PluginKind::PathPrepend,
        PluginKind::HeaderDefaults,
        PluginKind::Authentication,
        PluginKind::Cache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluginKind::ErrorDetector => "error_detector",
            PluginKind::History => "history",
            PluginKind::Retry => "retry",
            PluginKind::RateLimit => "rate_limit",
            PluginKind::Logger => "logger",
            PluginKind::Redirect => "redirect",
            PluginKind::ShopDomain => "shop_domain",
            PluginKind::PathPrepend => "path_prepend",
            PluginKind::HeaderDefaults => "header_defaults",
            PluginKind::Authentication => "authentication",
            PluginKind::Cache => "cache",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered set of plugins, at most one per [`PluginKind`]
#[derive(Clone, Default)]
pub struct PluginChain {
    slots: BTreeMap<PluginKind, Arc<dyn Plugin>>,
    ordered: Vec<Arc<dyn Plugin>>,
}

impl PluginChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`PluginChain::insert`]
    pub fn with(mut self, kind: PluginKind, plugin: impl Plugin + 'static) -> Self {
        self.insert(kind, Arc::new(plugin));
        self
    }

    /// Put `plugin` in the `kind` slot, returning the plugin it replaced
    pub fn insert(&mut self, kind: PluginKind, plugin: Arc<dyn Plugin>) -> Option<Arc<dyn Plugin>> {
        let previous = self.slots.insert(kind, plugin);
        self.rebuild();
        tracing::trace!(target: "shopkit::http", plugin = %kind, replaced = previous.is_some(), "plugin installed");
        previous
    }

    /// Empty the `kind` slot
    pub fn remove(&mut self, kind: PluginKind) -> Option<Arc<dyn Plugin>> {
        let previous = self.slots.remove(&kind);
        if previous.is_some() {
            self.rebuild();
        }
        previous
    }

    pub fn get(&self, kind: PluginKind) -> Option<&Arc<dyn Plugin>> {
        self.slots.get(&kind)
    }

    pub fn contains(&self, kind: PluginKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// Occupied slots, outermost first
    pub fn kinds(&self) -> Vec<PluginKind> {
        self.slots.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Drive `request` through every plugin as a new logical call
    pub async fn dispatch(&self, request: Request, transport: &dyn Transport) -> Result<Response> {
        Next::new(&self.ordered, transport, CallId::fresh())
            .run(request)
            .await
    }

    fn rebuild(&mut self) {
        self.ordered = self.slots.values().cloned().collect();
    }
}

impl fmt::Debug for PluginChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.slots.keys()).finish()
    }
}
