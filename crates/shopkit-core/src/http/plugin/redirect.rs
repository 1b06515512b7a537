//! Redirect following
//!
//! - 303, and 301/302 for anything but GET/HEAD: method becomes GET, body dropped
//! - 307, 308 and 301/302 for GET/HEAD: request re-sent unchanged to the new target

use async_trait::async_trait;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use http::{Method, StatusCode, Uri};
use url::Url;

use super::{Next, Plugin};
use crate::http::message::{Request, Response};
use crate::{Error, Result};

/// Follows `Location` headers up to a maximum number of hops
#[derive(Debug, Clone, Copy)]
pub struct Redirect {
    max_redirects: usize,
}

impl Redirect {
    pub fn new(max_redirects: usize) -> Self {
        Self { max_redirects }
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    fn resolve(base: &Uri, location: &str) -> Result<Uri> {
        let joined = match Url::parse(&base.to_string()) {
            Ok(base) => base.join(location),
            Err(_) => Url::parse(location),
        }
        .map_err(|e| Error::invalid_argument(format!("Invalid redirect location '{}': {}", location, e)))?;

        joined
            .as_str()
            .parse::<Uri>()
            .map_err(|e| Error::invalid_argument(format!("Invalid redirect location '{}': {}", location, e)))
    }

    fn follow(request: Request, status: StatusCode, target: Uri) -> Request {
        let request = request.with_uri(target);
        let switch_to_get = status == StatusCode::SEE_OTHER
            || (matches!(status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND)
                && !matches!(*request.method(), Method::GET | Method::HEAD));

        if !switch_to_get {
            return request;
        }

        let method = if *request.method() == Method::HEAD {
            Method::HEAD
        } else {
            Method::GET
        };
        let mut headers = request.headers().clone();
        headers.remove(CONTENT_LENGTH);
        headers.remove(CONTENT_TYPE);

        Request::new(method, request.uri().clone()).with_headers(headers)
    }
}

impl Default for Redirect {
    fn default() -> Self {
        Self::new(10)
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

#[async_trait]
impl Plugin for Redirect {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let mut current = request;
        let mut hops = 0usize;

        loop {
            let response = next.run(current.clone()).await?;
            let status = response.status();
            if !is_redirect(status) {
                return Ok(response);
            }

            let location = match response.header(LOCATION.as_str()) {
                Some(location) => location.to_string(),
                None => {
                    tracing::debug!(target: "shopkit::http", %status, "redirect without Location, returning response");
                    return Ok(response);
                }
            };

            if hops >= self.max_redirects {
                tracing::warn!(target: "shopkit::http", hops, max = self.max_redirects, %location, "too many redirects");
                return Err(Error::TooManyRedirects {
                    max: self.max_redirects,
                    location,
                });
            }

            let target = Self::resolve(current.uri(), &location)?;
            tracing::debug!(target: "shopkit::http", %status, from = %current.uri(), to = %target, "following redirect");
            current = Self::follow(current, status, target);
            hops += 1;
        }
    }
}
