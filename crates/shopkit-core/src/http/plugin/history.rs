use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{ErrorDetector, Next, Plugin};
use crate::http::message::{Request, Response};
use crate::Result;

/// A request together with the response it produced
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub request: Request,
    pub response: Response,
}

/// Keeps the most recent successful exchange
///
/// Failures leave the stored exchange untouched, including 4xx/5xx
/// responses that the error detector will turn into errors further out.
#[derive(Debug, Default)]
pub struct History {
    last: RwLock<Option<Exchange>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_exchange(&self) -> Option<Exchange> {
        self.last.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.last
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|e| e.request.clone())
    }

    pub fn last_response(&self) -> Option<Response> {
        self.last
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|e| e.response.clone())
    }

    pub fn record(&self, request: Request, response: Response) {
        *self.last.write().unwrap_or_else(PoisonError::into_inner) = Some(Exchange { request, response });
    }

    pub fn clear(&self) {
        *self.last.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl Plugin for History {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let response = next.run(request.clone()).await?;
        if ErrorDetector::classify(&response).is_none() {
            self.record(request, response.clone());
        }
        Ok(response)
    }
}
