use async_trait::async_trait;
use http::StatusCode;

use super::{Next, Plugin};
use crate::http::mediator::ResponseMediator;
use crate::http::message::{Request, Response};
use crate::Result;

/// Turns throttled responses into `RateLimitExceeded` failures
///
/// A 429, or any response whose call-limit header reports usage above the
/// limit, fails with the limit and the recommended cooldown.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimit;

impl RateLimit {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for RateLimit {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let response = next.run(request).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let error = ResponseMediator::rate_limit_error(&response);
            tracing::debug!(target: "shopkit::http", call = %next.call_id(), %error, "rate limited");
            return Err(error);
        }

        if let Some(limit) = ResponseMediator::get_api_limit(&response)? {
            tracing::trace!(target: "shopkit::http", call = %next.call_id(), limit, "call limit reported");
        }

        Ok(response)
    }
}
