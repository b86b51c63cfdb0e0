//! Backoff policies a throttled server uses to tell rejected clients how
//! long to wait.
//!
//! A server runs exactly one [`BackoffPolicy`] for its whole lifetime. The
//! policy is consulted once per rejected request and produces a
//! [`RetryDirective`]:
//!
//! - [`Fixed`] always hands out the same wait, however loaded the server is.
//! - [`LoadAdaptiveJitter`] scales the wait with the number of requests
//!   currently being turned away and spreads clients out with random
//!   jitter, so rejected clients do not come back in lockstep.
//! - [`ExponentialEchoed`] doubles the wait on every retry. The retry count
//!   round-trips through the client in a `Retry-Count` header, so the
//!   server keeps no per-client state.

mod exponential;
mod fixed;
mod jitter;

pub use self::exponential::ExponentialEchoed;
pub use self::fixed::Fixed;
pub use self::jitter::LoadAdaptiveJitter;

use http::HeaderValue;
use std::fmt;
use std::str::FromStr;

use crate::directive::RetryDirective;
use crate::error::UnknownPolicy;
use crate::load::RejectionCounter;

/// What a policy may observe about a rejected request.
#[derive(Debug, Clone, Copy)]
pub struct RejectContext<'a> {
    retry_count: Option<&'a HeaderValue>,
    rejected: &'a RejectionCounter,
}

impl<'a> RejectContext<'a> {
    /// Build a context from the request's `Retry-Count` header, if any, and
    /// the server's rejection counter.
    pub fn new(retry_count: Option<&'a HeaderValue>, rejected: &'a RejectionCounter) -> Self {
        RejectContext {
            retry_count,
            rejected,
        }
    }

    /// The raw `Retry-Count` the client echoed.
    pub fn retry_count(&self) -> Option<&'a HeaderValue> {
        self.retry_count
    }

    /// The server's count of requests currently being rejected.
    pub fn rejected(&self) -> &'a RejectionCounter {
        self.rejected
    }
}

/// The backoff policy of one server.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffPolicy {
    /// See [`Fixed`].
    Fixed(Fixed),
    /// See [`LoadAdaptiveJitter`].
    LoadAdaptiveJitter(LoadAdaptiveJitter),
    /// See [`ExponentialEchoed`].
    ExponentialEchoed(ExponentialEchoed),
}

impl BackoffPolicy {
    /// Compute the directive for one rejected request.
    pub fn compute(&self, cx: RejectContext<'_>) -> RetryDirective {
        match self {
            BackoffPolicy::Fixed(policy) => policy.compute(),
            BackoffPolicy::LoadAdaptiveJitter(policy) => policy.compute(cx.rejected()),
            BackoffPolicy::ExponentialEchoed(policy) => policy.compute(cx.retry_count()),
        }
    }

    /// Notify the policy that a request was admitted.
    pub fn admitted(&self, rejected: &RejectionCounter) {
        if let BackoffPolicy::LoadAdaptiveJitter(policy) = self {
            policy.admitted(rejected);
        }
    }

    /// Which variant this is.
    pub fn kind(&self) -> PolicyKind {
        match self {
            BackoffPolicy::Fixed(_) => PolicyKind::Fixed,
            BackoffPolicy::LoadAdaptiveJitter(_) => PolicyKind::LoadAdaptiveJitter,
            BackoffPolicy::ExponentialEchoed(_) => PolicyKind::ExponentialEchoed,
        }
    }
}

impl From<Fixed> for BackoffPolicy {
    fn from(policy: Fixed) -> Self {
        BackoffPolicy::Fixed(policy)
    }
}

impl From<LoadAdaptiveJitter> for BackoffPolicy {
    fn from(policy: LoadAdaptiveJitter) -> Self {
        BackoffPolicy::LoadAdaptiveJitter(policy)
    }
}

impl From<ExponentialEchoed> for BackoffPolicy {
    fn from(policy: ExponentialEchoed) -> Self {
        BackoffPolicy::ExponentialEchoed(policy)
    }
}

/// Names a [`BackoffPolicy`] variant, e.g. when picking one at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// [`Fixed`]
    Fixed,
    /// [`LoadAdaptiveJitter`]
    LoadAdaptiveJitter,
    /// [`ExponentialEchoed`]
    ExponentialEchoed,
}

impl PolicyKind {
    /// The policy of this kind built from the constants in
    /// [`config`](crate::config).
    pub fn default_policy(self) -> BackoffPolicy {
        match self {
            PolicyKind::Fixed => Fixed::default().into(),
            PolicyKind::LoadAdaptiveJitter => LoadAdaptiveJitter::default().into(),
            PolicyKind::ExponentialEchoed => ExponentialEchoed::default().into(),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(PolicyKind::Fixed),
            "jitter" | "load-adaptive-jitter" => Ok(PolicyKind::LoadAdaptiveJitter),
            "exponential" | "exponential-echoed" => Ok(PolicyKind::ExponentialEchoed),
            _ => Err(UnknownPolicy(s.to_owned())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PolicyKind::Fixed => "fixed",
            PolicyKind::LoadAdaptiveJitter => "load-adaptive-jitter",
            PolicyKind::ExponentialEchoed => "exponential-echoed",
        })
    }
}
