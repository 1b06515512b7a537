//! Scripted transport for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};

use crate::http::message::{Request, Response};
use crate::http::transport::Transport;
use crate::Result;

type Handler = Box<dyn Fn(&Request) -> Result<Response> + Send + Sync>;

/// Replays queued outcomes, then falls back to a handler (or an empty 200)
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<Result<Response>>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            handler: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Response> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::new()
        }
    }

    pub(crate) fn push(&self, outcome: Result<Response>) -> &Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(outcome) = self.script.lock().unwrap().pop_front() {
            return outcome;
        }
        match &self.handler {
            Some(handler) => handler(&request),
            None => Ok(response(200, &[], "")),
        }
    }
}

/// Build a response from a status, header pairs and a body
pub(crate) fn response(status: u16, headers: &[(&str, &str)], body: &str) -> Response {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.append(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    Response::new(StatusCode::from_u16(status).unwrap(), map, body.to_string())
}

/// A JSON response
pub(crate) fn json(status: u16, body: &str) -> Response {
    response(status, &[("content-type", "application/json")], body)
}
