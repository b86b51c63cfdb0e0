use rand::Rng;
use std::time::Duration;

use crate::config;
use crate::directive::RetryDirective;
use crate::error::InvalidBackoff;
use crate::load::RejectionCounter;

/// Scales the wait with current contention and adds symmetric [jitter].
///
/// The base wait grows by `scale` seconds for every request currently being
/// rejected, clamped to `[min, max]`. The directed wait is then drawn
/// uniformly from `base ± jitter * base`, floored at zero and truncated to
/// whole seconds. The busier the server, the longer and more spread out the
/// waits, which keeps rejected clients from retrying in lockstep.
///
/// Every rejection raises the server's [`RejectionCounter`], and every
/// admission lowers it again.
///
/// [jitter]: https://aws.amazon.com/blogs/architecture/exponential-backoff-and-jitter/
#[derive(Debug, Clone, PartialEq)]
pub struct LoadAdaptiveJitter {
    /// Smallest base wait.
    min: Duration,
    /// Largest base wait.
    max: Duration,
    /// Seconds of base wait per rejected request in flight.
    scale: f64,
    /// The ratio of the base wait that may be randomly added or removed.
    ///
    /// Must be in `[0.0, 1.0]`.
    jitter: f64,
}

impl LoadAdaptiveJitter {
    /// Create a new `LoadAdaptiveJitter`.
    ///
    /// # Error
    ///
    /// Returns a config validation error if:
    /// - `min` > `max`
    /// - `max` is zero
    /// - `scale` is negative or not finite
    /// - `jitter` is outside `[0.0, 1.0]` or not finite
    pub fn new(
        min: Duration,
        max: Duration,
        scale: f64,
        jitter: f64,
    ) -> Result<Self, InvalidBackoff> {
        if min > max {
            return Err(InvalidBackoff("maximum must not be less than minimum"));
        }
        if max == Duration::from_millis(0) {
            return Err(InvalidBackoff("maximum must be non-zero"));
        }
        if !scale.is_finite() {
            return Err(InvalidBackoff("scale must be finite"));
        }
        if scale < 0.0 {
            return Err(InvalidBackoff("scale must not be negative"));
        }
        if !jitter.is_finite() {
            return Err(InvalidBackoff("jitter must be finite"));
        }
        if !(0.0..=1.0).contains(&jitter) {
            return Err(InvalidBackoff("jitter must be between 0 and 1"));
        }

        Ok(LoadAdaptiveJitter {
            min,
            max,
            scale,
            jitter,
        })
    }

    /// The wait before jitter for `inflight` rejected requests.
    pub fn base(&self, inflight: u64) -> Duration {
        let secs = inflight as f64 * self.scale;
        Duration::from_secs_f64(secs.clamp(self.min.as_secs_f64(), self.max.as_secs_f64()))
    }

    /// Apply jitter to `base`; `unit` is a sample on `[-1.0, 1.0]`.
    fn jittered(&self, base: Duration, unit: f64) -> Duration {
        let base = base.as_secs_f64();
        let secs = (base + unit * self.jitter * base).max(0.0);
        Duration::from_secs(secs as u64)
    }

    pub(crate) fn compute(&self, rejected: &RejectionCounter) -> RetryDirective {
        // the count this rejection saw, read and raised in one step
        let inflight = rejected.increment().saturating_sub(1);
        let base = self.base(inflight);
        let unit = rand::thread_rng().gen_range(-1.0..=1.0);
        let wait = self.jittered(base, unit);

        tracing::debug!(inflight, ?base, ?wait, "load adaptive backoff");
        RetryDirective::new(wait)
    }

    pub(crate) fn admitted(&self, rejected: &RejectionCounter) {
        rejected.decrement();
    }
}

impl Default for LoadAdaptiveJitter {
    fn default() -> Self {
        LoadAdaptiveJitter::new(
            config::JITTER_MIN,
            config::JITTER_MAX,
            config::JITTER_SCALE,
            config::JITTER_RATIO,
        )
        .expect("Unable to create LoadAdaptiveJitter")
    }
}
