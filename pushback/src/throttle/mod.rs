//! Middleware that admits requests through a gate and answers the rest with
//! `429 Too Many Requests`.

pub mod future;
mod layer;

pub use self::layer::ThrottleLayer;

use self::future::ResponseFuture;
use http::{Request, Response, StatusCode};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_service::Service;

use crate::admission::{Admit, TokenBucket};
use crate::backoff::{BackoffPolicy, RejectContext};
use crate::directive::{RetryDirective, RETRY_COUNT};
use crate::load::ServerLoad;

/// Rejects requests the admission gate turns away, telling the client when
/// to come back.
///
/// Every call is counted in the shared [`ServerLoad`]. Admitted requests are
/// forwarded to the inner service. Rejected requests never reach it: they are
/// answered with `429 Too Many Requests`, a `Retry-After` header, and, for
/// policies that keep their state on the client, a `Retry-Count` header.
///
/// Clones share the same [`ServerLoad`], so every connection of a server is
/// subject to the same budget.
#[derive(Debug)]
pub struct Throttle<S, A = TokenBucket> {
    inner: S,
    load: Arc<ServerLoad<A>>,
    policy: BackoffPolicy,
}

// ===== impl Throttle =====

impl<S, A> Throttle<S, A> {
    /// Wrap `inner` with admission control against `load`.
    pub fn new(inner: S, load: Arc<ServerLoad<A>>, policy: BackoffPolicy) -> Self {
        Throttle {
            inner,
            load,
            policy,
        }
    }

    /// Get a reference to the shared load state.
    pub fn load(&self) -> &Arc<ServerLoad<A>> {
        &self.load
    }

    /// Get a reference to the backoff policy.
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Get a reference to the inner service
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Get a mutable reference to the inner service
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume `self`, returning the inner service
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, A, ReqBody, ResBody> Service<Request<ReqBody>> for Throttle<S, A>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    A: Admit,
    ResBody: From<&'static str>,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future, ResBody>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let requests = self.load.record_request();
        tracing::trace!(requests, "request received");

        if self.load.allow() {
            self.policy.admitted(self.load.rejected());
            return ResponseFuture::called(self.inner.call(request));
        }

        let cx = RejectContext::new(request.headers().get(RETRY_COUNT), self.load.rejected());
        let directive = self.policy.compute(cx);
        tracing::debug!(
            wait = ?directive.wait(),
            retry_count = ?directive.retry_count(),
            rejected = self.load.rejected().load(),
            "request rejected"
        );

        ResponseFuture::rejected(too_many_requests(&directive))
    }
}

impl<S: Clone, A> Clone for Throttle<S, A> {
    fn clone(&self) -> Self {
        Throttle {
            inner: self.inner.clone(),
            load: self.load.clone(),
            policy: self.policy.clone(),
        }
    }
}

fn too_many_requests<B>(directive: &RetryDirective) -> Response<B>
where
    B: From<&'static str>,
{
    let mut response = Response::new(B::from("Too Many Requests"));
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    directive.write_headers(response.headers_mut());
    response
}
