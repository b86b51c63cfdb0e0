//! Load accounting shared by every request handler of a server.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::admission::{Admit, TokenBucket};

/// Count of requests currently being turned away.
///
/// This is the only owner of the count: it can be raised by one, lowered by
/// one, and read. Lowering an empty counter leaves it at zero, so the count
/// never goes negative however rejections and admissions interleave.
#[derive(Debug, Default)]
pub struct RejectionCounter {
    inflight: AtomicU64,
}

impl RejectionCounter {
    /// Create a counter starting at zero.
    pub const fn new() -> Self {
        RejectionCounter {
            inflight: AtomicU64::new(0),
        }
    }

    /// Record one more rejected request, returning the new count.
    pub fn increment(&self) -> u64 {
        self.inflight.fetch_add(1, Ordering::SeqCst).saturating_add(1)
    }

    /// Record that a rejected request has been admitted, returning the new
    /// count.
    pub fn decrement(&self) -> u64 {
        match self
            .inflight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(previous) => previous - 1,
            Err(_) => 0,
        }
    }

    /// The current count.
    pub fn load(&self) -> u64 {
        self.inflight.load(Ordering::SeqCst)
    }
}

/// State shared by all invocations of one server's request handler.
///
/// Holds the admission gate, the count of requests currently being
/// rejected, and a running total of requests received.
#[derive(Debug)]
pub struct ServerLoad<A = TokenBucket> {
    gate: A,
    rejected: RejectionCounter,
    requests: AtomicU64,
}

impl<A> ServerLoad<A> {
    /// Wrap an admission gate with fresh counters.
    pub fn new(gate: A) -> Self {
        ServerLoad {
            gate,
            rejected: RejectionCounter::new(),
            requests: AtomicU64::new(0),
        }
    }

    /// The admission gate.
    pub fn gate(&self) -> &A {
        &self.gate
    }

    /// The count of requests currently being rejected.
    pub fn rejected(&self) -> &RejectionCounter {
        &self.rejected
    }

    /// Total requests received so far, admitted or not.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub(crate) fn record_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl<A: Admit> ServerLoad<A> {
    /// Ask the gate whether one more request may proceed.
    pub fn allow(&self) -> bool {
        self.gate.allow()
    }
}

impl Default for ServerLoad {
    fn default() -> Self {
        ServerLoad::new(TokenBucket::default())
    }
}
