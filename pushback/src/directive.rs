//! The retry directive a throttled server hands back to a rejected client.
//!
//! On the wire a directive is carried by two response headers:
//!
//! - `Retry-After`: the wait, in whole seconds. Always present on a `429`.
//! - `Retry-Count`: the retry count the client should echo on its next
//!   attempt. Only sent by policies that keep their state on the client.

use http::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use std::convert::TryFrom;
use std::time::Duration;

use crate::error::AttemptError;

/// Name of the header that carries the echoed retry count, in both
/// directions.
pub const RETRY_COUNT: &str = "retry-count";

/// How long a rejected client should wait, and what it should echo back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDirective {
    wait: Duration,
    retry_count: Option<u32>,
}

impl RetryDirective {
    /// A directive to wait for `wait` with nothing to echo.
    pub const fn new(wait: Duration) -> Self {
        RetryDirective {
            wait,
            retry_count: None,
        }
    }

    /// Ask the client to echo `retry_count` on its next attempt.
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    /// How long to wait before the next attempt.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// The retry count to echo, if any.
    pub fn retry_count(&self) -> Option<u32> {
        self.retry_count
    }

    /// Write this directive onto a response's headers.
    ///
    /// Sub-second precision is dropped: `Retry-After` carries whole seconds.
    pub fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(RETRY_AFTER, HeaderValue::from(self.wait.as_secs()));
        if let Some(retry_count) = self.retry_count {
            headers.insert(RETRY_COUNT, HeaderValue::from(retry_count));
        }
    }

    /// Read a directive from the headers of a `429` response.
    ///
    /// A missing or unparsable `Retry-After` is an error: the caller has no
    /// way to know how long to wait. A malformed `Retry-Count` is ignored.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AttemptError> {
        let value = headers
            .get(RETRY_AFTER)
            .ok_or(AttemptError::MissingRetryAfter)?;
        let secs = value
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .ok_or_else(|| AttemptError::InvalidRetryAfter(value.clone()))?;

        Ok(RetryDirective {
            wait: Duration::from_secs(secs),
            retry_count: headers
                .get(RETRY_COUNT)
                .and_then(|value| value.to_str().ok())
                .and_then(|s| s.trim().parse::<u32>().ok()),
        })
    }
}

/// Parse a client-supplied `Retry-Count`.
///
/// Absent, non-numeric, and negative values read as zero; values too large
/// for a `u32` saturate.
pub(crate) fn parse_retry_count(value: Option<&HeaderValue>) -> u32 {
    value
        .and_then(|value| value.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}
