use std::time::Duration;

use crate::config;
use crate::directive::RetryDirective;

/// Always asks rejected clients to wait the same amount of time.
///
/// The wait does not react to load: a server under heavy contention hands
/// out the same directive as one that is barely over its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixed {
    wait: Duration,
}

impl Fixed {
    /// Create a policy that always directs a wait of `wait`.
    pub const fn new(wait: Duration) -> Self {
        Fixed { wait }
    }

    /// The constant wait.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    pub(crate) fn compute(&self) -> RetryDirective {
        RetryDirective::new(self.wait)
    }
}

impl Default for Fixed {
    fn default() -> Self {
        Fixed::new(config::FIXED_WAIT)
    }
}
