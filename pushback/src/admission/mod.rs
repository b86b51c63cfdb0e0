//! Admission control for inbound requests.
//!
//! An [`Admit`] implementation is the single source of truth for whether a
//! request may proceed. It is shared by every in-flight request, so a
//! decision must be made through `&self`.

mod bucket;

pub use self::bucket::TokenBucket;

use std::sync::Arc;

/// Decides whether a single request may proceed.
pub trait Admit {
    /// Returns `true`, consuming one unit of budget, if the request is
    /// admitted.
    fn allow(&self) -> bool;
}

impl<A: Admit + ?Sized> Admit for &A {
    fn allow(&self) -> bool {
        (**self).allow()
    }
}

impl<A: Admit + ?Sized> Admit for Arc<A> {
    fn allow(&self) -> bool {
        (**self).allow()
    }
}

impl<A: Admit + ?Sized> Admit for Box<A> {
    fn allow(&self) -> bool {
        (**self).allow()
    }
}
