use std::time::Instant;

use async_trait::async_trait;

use super::{Next, Plugin};
use crate::http::message::{Request, Response};
use crate::Result;

/// Emits one debug event per attempt and one per outcome
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for Logger {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let call = next.call_id();
        tracing::debug!(target: "shopkit::http", %call, %method, %uri, "sending request");

        let started = Instant::now();
        let result = next.run(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => tracing::debug!(
                target: "shopkit::http",
                %call,
                %method,
                %uri,
                status = response.status().as_u16(),
                elapsed_ms,
                "received response"
            ),
            Err(error) => tracing::debug!(
                target: "shopkit::http",
                %call,
                %method,
                %uri,
                %error,
                elapsed_ms,
                "request failed"
            ),
        }

        result
    }
}
