//! Error types

use http::HeaderValue;
use std::fmt;

/// Alias for a type-erased error type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Token bucket validation error.
#[derive(Debug)]
pub struct InvalidBucket(pub(crate) &'static str);

impl fmt::Display for InvalidBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid token bucket: {}", self.0)
    }
}

impl std::error::Error for InvalidBucket {}

/// Backoff validation error.
#[derive(Debug)]
pub struct InvalidBackoff(pub(crate) &'static str);

impl fmt::Display for InvalidBackoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid backoff: {}", self.0)
    }
}

impl std::error::Error for InvalidBackoff {}

/// Scenario validation error.
#[derive(Debug)]
pub struct InvalidScenario(pub(crate) &'static str);

impl fmt::Display for InvalidScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scenario: {}", self.0)
    }
}

impl std::error::Error for InvalidScenario {}

/// Returned when a backoff policy name is not recognized.
#[derive(Debug)]
pub struct UnknownPolicy(pub(crate) String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown backoff policy {:?}; expected one of `fixed`, `jitter`, `exponential`",
            self.0
        )
    }
}

impl std::error::Error for UnknownPolicy {}

/// A terminal failure of one logical request.
///
/// None of these are retried by the orchestrator that produced them; they
/// end the request's retry sequence and are reported with its outcome.
#[derive(Debug)]
pub enum AttemptError {
    /// The transport failed on every connection attempt.
    Transport {
        /// How many connection attempts were made.
        attempts: u32,
        /// The error from the last attempt.
        source: BoxError,
    },
    /// The server rejected the request without a `Retry-After` header.
    MissingRetryAfter,
    /// The server's `Retry-After` header was not a whole number of seconds.
    InvalidRetryAfter(HeaderValue),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Transport { attempts, source } => {
                write!(f, "transport failed after {} attempts: {}", attempts, source)
            }
            AttemptError::MissingRetryAfter => {
                f.write_str("rate limited without a Retry-After header")
            }
            AttemptError::InvalidRetryAfter(value) => {
                write!(f, "rate limited with an invalid Retry-After: {:?}", value)
            }
        }
    }
}

impl std::error::Error for AttemptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttemptError::Transport { source, .. } => Some(&**source),
            _ => None,
        }
    }
}
