//! Bounded automatic retry
//!
//! Attempt counters are keyed by [`CallId`], so concurrent calls through one
//! chain never share a counter. A counter exists only while its call is inside
//! the retry loop; every exit path (success, exhaustion, refusal, or the future
//! being dropped) removes it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::{CallId, Next, Plugin};
use crate::http::message::{Request, Response};
use crate::{Error, Result};

/// Decides whether a failed attempt is tried again
pub type RetryDecider = Arc<dyn Fn(&Request, &Error) -> bool + Send + Sync>;

/// Computes the pause before the next attempt from the number of retries already made
pub type RetryDelay = Arc<dyn Fn(&Request, &Error, u32) -> Duration + Send + Sync>;

/// Retry only rate-limit failures
pub fn default_decider(_request: &Request, error: &Error) -> bool {
    error.is_rate_limit()
}

/// No pause before the first retry; afterwards the failure's reset delay
///
/// Failures without a reset delay get a random 100-1000 ms pause. The default
/// decider never retries those, so this branch only matters with a custom one.
pub fn default_delay(_request: &Request, error: &Error, retries: u32) -> Duration {
    if retries == 0 {
        return Duration::ZERO;
    }
    if let Some(reset) = error.reset_delay() {
        return reset;
    }
    Duration::from_millis(100 * rand::thread_rng().gen_range(1..=10))
}

type Counters = Mutex<HashMap<CallId, u32>>;

/// Re-runs the downstream chain after a failure
pub struct Retry {
    retries: u32,
    decider: RetryDecider,
    delay: RetryDelay,
    counters: Counters,
}

impl Retry {
    /// Allow up to `retries` extra attempts per call
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            decider: Arc::new(default_decider),
            delay: Arc::new(default_delay),
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_decider<F>(mut self, decider: F) -> Self
    where
        F: Fn(&Request, &Error) -> bool + Send + Sync + 'static,
    {
        self.decider = Arc::new(decider);
        self
    }

    pub fn with_delay<F>(mut self, delay: F) -> Self
    where
        F: Fn(&Request, &Error, u32) -> Duration + Send + Sync + 'static,
    {
        self.delay = Arc::new(delay);
        self
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Calls currently holding an attempt counter
    pub fn active_calls(&self) -> usize {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Attempts made so far for `call`, creating the counter on first use
    fn attempts(&self, call: CallId) -> u32 {
        *self
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(call)
            .or_insert(0)
    }

    fn increment(&self, call: CallId) {
        *self
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(call)
            .or_insert(0) += 1;
    }
}

impl Default for Retry {
    fn default() -> Self {
        Self::new(1)
    }
}

impl fmt::Debug for Retry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("retries", &self.retries)
            .field("active_calls", &self.active_calls())
            .finish_non_exhaustive()
    }
}

/// Removes the call's counter when the retry loop is left
struct CounterGuard<'a> {
    counters: &'a Counters,
    call: CallId,
}

impl Drop for CounterGuard<'_> {
    fn drop(&mut self) {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.call);
    }
}

#[async_trait]
impl Plugin for Retry {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let call = next.call_id();
        let _guard = CounterGuard {
            counters: &self.counters,
            call,
        };

        loop {
            let error = match next.run(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            let attempts = self.attempts(call);
            if attempts >= self.retries {
                log::error!(
                    "Request {} {} failed after {} retries, giving up: {}",
                    request.method(),
                    request.uri(),
                    attempts,
                    error
                );
                return Err(error);
            }

            if !(self.decider)(&request, &error) {
                log::debug!("Request {} {} failed, not retrying: {}", request.method(), request.uri(), error);
                return Err(error);
            }

            let delay = (self.delay)(&request, &error, attempts);
            log::warn!(
                "Request {} {} failed (retry {}/{}), retrying after {:?}: {}",
                request.method(),
                request.uri(),
                attempts + 1,
                self.retries,
                delay,
                error
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.increment(call);
        }
    }
}
