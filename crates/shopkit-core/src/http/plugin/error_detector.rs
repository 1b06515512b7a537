//! Classification of unsuccessful responses

use async_trait::async_trait;
use http::StatusCode;
use serde_json::Value;

use super::{Next, Plugin};
use crate::http::mediator::ResponseMediator;
use crate::http::message::{Request, Response};
use crate::{Error, Result};

/// Fails the call on 4xx and 5xx responses
///
/// - 429 becomes `RateLimitExceeded`
/// - 422 becomes `ValidationFailed` carrying the body's `errors`
/// - anything else becomes `Api` with a message taken from the body
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorDetector;

impl ErrorDetector {
    pub fn new() -> Self {
        Self
    }

    /// Map a final response to the failure it represents, if any
    pub fn classify(response: &Response) -> Option<Error> {
        let status = response.status();
        if !(status.is_client_error() || status.is_server_error()) {
            return None;
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Some(ResponseMediator::rate_limit_error(response));
        }

        let body = response.text();
        let details = serde_json::from_str::<Value>(&body).ok();
        let message = extract_message(details.as_ref(), &body, status);

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            return Some(Error::ValidationFailed {
                message,
                errors: details.and_then(|d| d.get("errors").cloned()),
            });
        }

        Some(Error::Api {
            status: status.as_u16(),
            message,
            details,
        })
    }
}

/// First of `errors`, `error`, `error_description`, `message`; raw body otherwise
fn extract_message(details: Option<&Value>, body: &str, status: StatusCode) -> String {
    if let Some(json) = details {
        for field in ["errors", "error", "error_description", "message"] {
            match json.get(field) {
                Some(Value::String(message)) => return message.clone(),
                Some(Value::Null) | None => continue,
                Some(other) => return other.to_string(),
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}

#[async_trait]
impl Plugin for ErrorDetector {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let response = next.run(request).await?;
        match Self::classify(&response) {
            Some(error) => Err(error),
            None => Ok(response),
        }
    }
}
