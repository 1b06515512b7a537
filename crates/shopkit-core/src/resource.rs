//! Generic REST resource over `<name>.json` and `<name>/<id>.json`

use std::fmt;
use std::sync::{Mutex, PoisonError};

use http::HeaderMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::client::Client;
use crate::pagination::PageableApi;
use crate::{Error, Result};

#[derive(Deserialize)]
struct CountBody {
    count: u64,
}

/// A named collection such as `products` or `orders`
pub struct Resource<'c> {
    client: &'c Client,
    name: String,
    per_page: Mutex<Option<u32>>,
}

impl<'c> Resource<'c> {
    pub fn new(client: &'c Client, name: &str) -> Result<Self> {
        let name = name.trim_matches('/');
        if name.is_empty() {
            return Err(Error::invalid_argument("Resource name cannot be empty"));
        }
        Ok(Self {
            client,
            name: name.to_string(),
            per_page: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// One page of the collection; adds `limit` when a page size is set
    pub async fn list(&self, params: Value) -> Result<Value> {
        let params = match self.per_page() {
            Some(limit) => with_default(params, "limit", Value::from(limit))?,
            None => params,
        };
        self.client
            .get(&self.collection_path(), params, HeaderMap::new())
            .await
            .map(|content| content.into_value())
    }

    pub async fn count(&self, params: Value) -> Result<u64> {
        let path = format!("{}/count.json", self.name);
        let content = self.client.get(&path, params, HeaderMap::new()).await?;
        let body: CountBody = serde_json::from_value(content.into_value())?;
        Ok(body.count)
    }

    pub async fn show(&self, id: impl fmt::Display, params: Value) -> Result<Value> {
        self.client
            .get(&self.member_path(id), params, HeaderMap::new())
            .await
            .map(|content| content.into_value())
    }

    pub async fn create(&self, payload: Value) -> Result<Value> {
        self.client
            .post(&self.collection_path(), payload, HeaderMap::new())
            .await
            .map(|content| content.into_value())
    }

    pub async fn update(&self, id: impl fmt::Display, payload: Value) -> Result<Value> {
        self.client
            .put(&self.member_path(id), payload, HeaderMap::new())
            .await
            .map(|content| content.into_value())
    }

    pub async fn delete(&self, id: impl fmt::Display) -> Result<Value> {
        self.client
            .delete(&self.member_path(id), Value::Null, HeaderMap::new())
            .await
            .map(|content| content.into_value())
    }

    fn collection_path(&self) -> String {
        format!("{}.json", self.name)
    }

    fn member_path(&self, id: impl fmt::Display) -> String {
        format!("{}/{}.json", self.name, id)
    }
}

impl PageableApi for Resource<'_> {
    fn per_page(&self) -> Option<u32> {
        *self.per_page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_per_page(&self, per_page: Option<u32>) {
        *self.per_page.lock().unwrap_or_else(PoisonError::into_inner) = per_page;
    }
}

impl fmt::Debug for Resource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("per_page", &self.per_page())
            .finish()
    }
}

/// Insert `key` into an object of parameters unless the caller set it
fn with_default(params: Value, key: &str, value: Value) -> Result<Value> {
    let mut map = match params {
        Value::Null => Map::new(),
        Value::Object(map) => map,
        other => {
            return Err(Error::invalid_argument(format!(
                "Query parameters must be a JSON object, got {}",
                other
            )))
        }
    };
    map.entry(key.to_string()).or_insert(value);
    Ok(Value::Object(map))
}
