#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub
)]
#![forbid(unsafe_code)]
#![allow(elided_lifetimes_in_paths)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! `pushback` is a closed-loop congestion-control pair built on [Tower].
//!
//! On the server side, a [`Throttle`] middleware consults an admission
//! gate (a [`TokenBucket`] by default) for every request. Admitted requests
//! reach the inner service; rejected ones are answered with
//! `429 Too Many Requests` and a [`RetryDirective`] computed by the
//! configured [`BackoffPolicy`].
//!
//! On the client side, a [`Scheduler`] offers load at a fixed rate and
//! hands each request to its own [`Orchestrator`], which keeps reissuing the
//! request for as long as the server keeps directing it to wait.
//!
//! ```text
//! Scheduler -> Orchestrator -> (network) -> Throttle -> Admit -> BackoffPolicy
//!                   ^                                                |
//!                   +---------------- RetryDirective ----------------+
//! ```
//!
//! [Tower]: https://github.com/tower-rs/tower
//! [`Throttle`]: crate::throttle::Throttle
//! [`TokenBucket`]: crate::admission::TokenBucket
//! [`RetryDirective`]: crate::directive::RetryDirective
//! [`BackoffPolicy`]: crate::backoff::BackoffPolicy
//! [`Scheduler`]: crate::client::Scheduler
//! [`Orchestrator`]: crate::client::Orchestrator

pub mod admission;
pub mod backoff;
pub mod config;
pub mod directive;
pub mod error;
pub mod load;

#[cfg(feature = "client")]
#[cfg_attr(docsrs, doc(cfg(feature = "client")))]
pub mod client;
#[cfg(feature = "server")]
#[cfg_attr(docsrs, doc(cfg(feature = "server")))]
pub mod throttle;

pub use crate::error::BoxError;
