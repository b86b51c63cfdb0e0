use std::sync::Mutex;
use tokio::time::Instant;

use super::Admit;
use crate::config;
use crate::error::InvalidBucket;

/// A [token bucket] admission gate.
///
/// The bucket starts full with `burst` tokens and refills continuously at
/// `rate` tokens per second, never holding more than `burst`. Each admitted
/// request takes one token.
///
/// Time is read from [`tokio::time::Instant`], so a paused runtime clock
/// controls refills.
///
/// [token bucket]: https://en.wikipedia.org/wiki/Token_bucket
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    burst: u32,
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    tokens: f64,
    refilled: Instant,
}

// ===== impl TokenBucket =====

impl TokenBucket {
    /// Create a new `TokenBucket`.
    ///
    /// # Error
    ///
    /// Returns a config validation error if:
    /// - `rate` is not finite
    /// - `rate` is not positive
    /// - `burst` is zero
    pub fn new(rate: f64, burst: u32) -> Result<Self, InvalidBucket> {
        if !rate.is_finite() {
            return Err(InvalidBucket("rate must be finite"));
        }
        if rate <= 0.0 {
            return Err(InvalidBucket("rate must be positive"));
        }
        if burst == 0 {
            return Err(InvalidBucket("burst must be non-zero"));
        }

        Ok(TokenBucket {
            rate,
            burst,
            state: Mutex::new(State {
                tokens: f64::from(burst),
                refilled: Instant::now(),
            }),
        })
    }

    /// Sustained admissions per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Largest instantaneous burst.
    pub fn burst(&self) -> u32 {
        self.burst
    }
}

impl Default for TokenBucket {
    fn default() -> Self {
        TokenBucket::new(config::RATE_LIMIT, config::BURST)
            .expect("Unable to create TokenBucket")
    }
}

impl Admit for TokenBucket {
    fn allow(&self) -> bool {
        let mut state = self.state.lock().expect("token bucket lock");

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.refilled);
        state.tokens =
            (state.tokens + elapsed.as_secs_f64() * self.rate).min(f64::from(self.burst));
        state.refilled = now;

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}
