use std::sync::Arc;
use tower_layer::Layer;

use super::Throttle;
use crate::admission::TokenBucket;
use crate::backoff::BackoffPolicy;
use crate::load::ServerLoad;

/// Wraps services in [`Throttle`] middleware sharing one [`ServerLoad`].
#[derive(Debug)]
pub struct ThrottleLayer<A = TokenBucket> {
    load: Arc<ServerLoad<A>>,
    policy: BackoffPolicy,
}

impl<A> ThrottleLayer<A> {
    /// Creates a new layer.
    pub fn new(load: Arc<ServerLoad<A>>, policy: BackoffPolicy) -> Self {
        ThrottleLayer { load, policy }
    }
}

impl<A> Clone for ThrottleLayer<A> {
    fn clone(&self) -> Self {
        ThrottleLayer {
            load: self.load.clone(),
            policy: self.policy.clone(),
        }
    }
}

impl<S, A> Layer<S> for ThrottleLayer<A> {
    type Service = Throttle<S, A>;

    fn layer(&self, service: S) -> Self::Service {
        Throttle::new(service, self.load.clone(), self.policy.clone())
    }
}
