//! Client-side load generation.
//!
//! A [`Scheduler`] offers load at a fixed rate for a fixed time, launching
//! one [`Orchestrator`] run per request. Each run keeps reissuing its request
//! for as long as the server keeps directing it to wait, and reports an
//! [`Outcome`] once the request is done.

mod orchestrator;
mod scheduler;

pub use self::orchestrator::{Orchestrator, Outcome, RequestAttempt};
pub use self::scheduler::{Scenario, Scheduler};
