//! Link-header pagination
//!
//! A [`Pager`] remembers the pagination links of the last page it saw and can
//! walk them. [`Pager::fetch_all`] follows `next` links until none is left,
//! merging every page into one value.

use std::future::Future;

use http::Method;
use serde_json::Value;

use crate::client::Client;
use crate::http::mediator::{Pagination, ResponseMediator};
use crate::http::message::Request;
use crate::Result;

/// Largest page size requested by [`Pager::fetch_all`] unless configured otherwise
pub const DEFAULT_MAX_PER_PAGE: u32 = 100;

/// Envelope key unwrapped from page results
pub const ITEMS_KEY: &str = "items";

/// An endpoint with an adjustable page size
///
/// Setters take `&self`; implementations use interior mutability so a pager
/// can adjust the size while the endpoint is borrowed by the page call.
pub trait PageableApi {
    fn per_page(&self) -> Option<u32>;
    fn set_per_page(&self, per_page: Option<u32>);
}

/// Restores the page size when dropped
struct PerPageGuard<'a, A: PageableApi + ?Sized> {
    api: &'a A,
    original: Option<u32>,
}

impl<A: PageableApi + ?Sized> Drop for PerPageGuard<'_, A> {
    fn drop(&mut self) {
        self.api.set_per_page(self.original);
    }
}

/// Walks pagination links through a [`Client`]
#[derive(Debug)]
pub struct Pager<'c> {
    client: &'c Client,
    pagination: Option<Pagination>,
    max_per_page: u32,
}

impl<'c> Pager<'c> {
    pub fn new(client: &'c Client) -> Self {
        Self {
            client,
            pagination: None,
            max_per_page: DEFAULT_MAX_PER_PAGE,
        }
    }

    pub fn with_max_per_page(mut self, max_per_page: u32) -> Self {
        self.max_per_page = max_per_page;
        self
    }

    /// Links of the last page seen
    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    /// Fetch a single page by running `call` against `api`
    pub async fn fetch<'a, A, F, Fut>(&mut self, api: &'a A, call: F) -> Result<Value>
    where
        A: PageableApi + ?Sized,
        F: FnOnce(&'a A) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let result = call(api).await?;
        self.post_fetch();
        Ok(result)
    }

    /// Fetch every page, starting with `call` and following `next` links
    ///
    /// The page size is forced to the maximum for the duration of the walk and
    /// restored on every exit path. A failing page aborts the whole walk.
    pub async fn fetch_all<'a, A, F, Fut>(&mut self, api: &'a A, call: F) -> Result<Value>
    where
        A: PageableApi + ?Sized,
        F: FnOnce(&'a A) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let _restore = PerPageGuard {
            api,
            original: api.per_page(),
        };
        api.set_per_page(Some(self.max_per_page));

        let first = self.fetch(api, call).await?;
        let mut accumulated = unwrap_items(first);

        while let Some(next) = self.link(Pagination::NEXT) {
            let page = self.fetch_link(&next).await?;
            accumulated = merge_pages(accumulated, unwrap_items(page));
        }

        tracing::debug!(target: "shopkit::http", "pagination walk finished");
        Ok(accumulated)
    }

    /// Refresh the stored links from the client's last response
    pub fn post_fetch(&mut self) {
        self.pagination = self
            .client
            .last_response()
            .and_then(|response| ResponseMediator::get_pagination(&response));
    }

    pub fn has_next(&self) -> bool {
        self.has(Pagination::NEXT)
    }

    pub fn has_previous(&self) -> bool {
        self.has(Pagination::PREVIOUS)
    }

    pub async fn fetch_next(&mut self) -> Result<Option<Value>> {
        self.fetch_relation(Pagination::NEXT).await
    }

    pub async fn fetch_previous(&mut self) -> Result<Option<Value>> {
        self.fetch_relation(Pagination::PREVIOUS).await
    }

    pub async fn fetch_first(&mut self) -> Result<Option<Value>> {
        self.fetch_relation(Pagination::FIRST).await
    }

    pub async fn fetch_last(&mut self) -> Result<Option<Value>> {
        self.fetch_relation(Pagination::LAST).await
    }

    fn has(&self, rel: &str) -> bool {
        self.pagination.as_ref().map(|p| p.has(rel)).unwrap_or(false)
    }

    fn link(&self, rel: &str) -> Option<String> {
        self.pagination
            .as_ref()
            .and_then(|p| p.get(rel))
            .map(str::to_string)
    }

    async fn fetch_relation(&mut self, rel: &str) -> Result<Option<Value>> {
        match self.link(rel) {
            Some(uri) => self.fetch_link(&uri).await.map(Some),
            None => Ok(None),
        }
    }

    /// GET a literal link target and refresh the stored links from its response
    async fn fetch_link(&mut self, uri: &str) -> Result<Value> {
        let response = self.client.send(Request::parse(Method::GET, uri)?).await?;
        self.pagination = ResponseMediator::get_pagination(&response);
        Ok(ResponseMediator::get_content(&response).into_value())
    }
}

/// The `items` envelope content when present, the value itself otherwise
fn unwrap_items(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key(ITEMS_KEY) => map.remove(ITEMS_KEY).unwrap_or(Value::Null),
        other => other,
    }
}

/// Concatenate arrays; merge objects key-wise, concatenating array fields
fn merge_pages(accumulated: Value, page: Value) -> Value {
    match (accumulated, page) {
        (Value::Array(mut items), Value::Array(more)) => {
            items.extend(more);
            Value::Array(items)
        }
        (Value::Object(mut fields), Value::Object(more)) => {
            for (key, value) in more {
                let merged = match fields.remove(&key) {
                    Some(Value::Array(mut items)) => match value {
                        Value::Array(more) => {
                            items.extend(more);
                            Value::Array(items)
                        }
                        other => other,
                    },
                    _ => value,
                };
                fields.insert(key, merged);
            }
            Value::Object(fields)
        }
        (Value::Array(mut items), other) => {
            items.push(other);
            Value::Array(items)
        }
        (accumulated, page) => Value::Array(vec![accumulated, page]),
    }
}
