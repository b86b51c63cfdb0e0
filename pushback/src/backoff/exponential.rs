use http::HeaderValue;
use std::time::Duration;

use crate::config;
use crate::directive::{self, RetryDirective};
use crate::error::InvalidBackoff;

/// Doubles the wait on every retry, with the retry count kept by the client.
///
/// The client echoes its retry count in a `Retry-Count` request header. The
/// server clamps it to `[0, max_attempts - 1]`, directs a wait of
/// `min(initial * 2^count, max)`, and replies with `count + 1` for the
/// client to echo next time. An absent or unparsable count reads as zero.
///
/// Nothing is remembered between requests on the server; in exchange, the
/// server has to trust whatever count the client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialEchoed {
    initial: Duration,
    max: Duration,
    max_attempts: u32,
}

impl ExponentialEchoed {
    /// Create a new `ExponentialEchoed`.
    ///
    /// # Error
    ///
    /// Returns a config validation error if:
    /// - `initial` > `max`
    /// - `max` is zero
    /// - `max_attempts` is zero
    pub fn new(
        initial: Duration,
        max: Duration,
        max_attempts: u32,
    ) -> Result<Self, InvalidBackoff> {
        if initial > max {
            return Err(InvalidBackoff("maximum must not be less than initial delay"));
        }
        if max == Duration::from_millis(0) {
            return Err(InvalidBackoff("maximum must be non-zero"));
        }
        if max_attempts == 0 {
            return Err(InvalidBackoff("max attempts must be non-zero"));
        }

        Ok(ExponentialEchoed {
            initial,
            max,
            max_attempts,
        })
    }

    /// The wait directed for a client on its `retry_count`th retry.
    pub fn delay(&self, retry_count: u32) -> Duration {
        let mut remaining = self.clamp(retry_count);
        let mut delay = self.initial;
        if delay == Duration::from_millis(0) {
            return delay;
        }

        // `Duration::checked_mul` takes a u32, so double in steps of at most
        // 2^31.
        while remaining > 0 {
            let step = remaining.min(31);
            delay = match delay.checked_mul(1 << step) {
                Some(delay) if delay < self.max => delay,
                _ => return self.max,
            };
            remaining -= step;
        }
        delay.min(self.max)
    }

    fn clamp(&self, retry_count: u32) -> u32 {
        retry_count.min(self.max_attempts - 1)
    }

    pub(crate) fn compute(&self, echoed: Option<&HeaderValue>) -> RetryDirective {
        let retry_count = self.clamp(directive::parse_retry_count(echoed));
        let wait = self.delay(retry_count);

        tracing::debug!(retry_count, ?wait, "exponential backoff");
        RetryDirective::new(wait).with_retry_count(retry_count + 1)
    }
}

impl Default for ExponentialEchoed {
    fn default() -> Self {
        ExponentialEchoed::new(
            config::INITIAL_DELAY,
            config::MAX_DELAY,
            config::MAX_RETRY_ATTEMPTS,
        )
        .expect("Unable to create ExponentialEchoed")
    }
}
