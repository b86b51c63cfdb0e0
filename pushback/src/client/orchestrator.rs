use http::header::HeaderValue;
use http::{Method, Request, Response, StatusCode, Uri};
use std::fmt;
use std::marker::PhantomData;
use tower::ServiceExt;
use tower_service::Service;

use crate::config;
use crate::directive::{RetryDirective, RETRY_COUNT};
use crate::error::{AttemptError, BoxError};

/// Progress of one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestAttempt {
    scenario: u32,
    sequence: u64,
    retry_count: u32,
    connect_attempts: u32,
}

impl RequestAttempt {
    fn new(scenario: u32, sequence: u64) -> Self {
        RequestAttempt {
            scenario,
            sequence,
            retry_count: 0,
            connect_attempts: 0,
        }
    }

    /// The scenario that emitted the request.
    pub fn scenario(&self) -> u32 {
        self.scenario
    }

    /// The request's sequence number within its scenario.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// How many times the request was reissued after a `429`.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Connection attempts made while issuing the latest attempt.
    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts
    }

    fn finish(self, result: Result<StatusCode, AttemptError>) -> Outcome {
        Outcome {
            attempt: self,
            result,
        }
    }
}

/// The final result of one logical request.
#[derive(Debug)]
pub struct Outcome {
    attempt: RequestAttempt,
    result: Result<StatusCode, AttemptError>,
}

impl Outcome {
    /// The scenario that emitted the request.
    pub fn scenario(&self) -> u32 {
        self.attempt.scenario
    }

    /// The request's sequence number within its scenario.
    pub fn sequence(&self) -> u64 {
        self.attempt.sequence
    }

    /// How many times the request was reissued after a `429`.
    pub fn retry_count(&self) -> u32 {
        self.attempt.retry_count
    }

    /// The request's state when it finished.
    pub fn attempt(&self) -> &RequestAttempt {
        &self.attempt
    }

    /// The final response status, or the error that ended the request.
    pub fn result(&self) -> Result<StatusCode, &AttemptError> {
        self.result.as_ref().map(|status| *status)
    }

    /// The final response status; local failures read as
    /// `500 Internal Server Error`.
    pub fn status(&self) -> StatusCode {
        match self.result {
            Ok(status) => status,
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Consume `self`, returning the final status or error.
    pub fn into_result(self) -> Result<StatusCode, AttemptError> {
        self.result
    }
}

/// Drives a single logical request to completion against a rate-limited
/// server.
///
/// Each [`run`] issues `GET uri` and looks at the response:
///
/// - Any status other than `429 Too Many Requests` ends the run.
/// - A `429` carrying a valid [`RetryDirective`] suspends the run for the
///   directed wait, then reissues the request, echoing the directive's retry
///   count if it had one. There is no client-side limit on retries; the
///   server's policy shapes the backoff.
/// - A `429` with a missing or unparsable `Retry-After` ends the run with an
///   error rather than retrying blindly.
///
/// Transport errors are retried immediately, up to a fixed number of
/// connection attempts per issued request, after which the run ends with
/// [`AttemptError::Transport`].
///
/// # Clone
///
/// Every run needs its own service handle, so the [`Scheduler`] clones the
/// orchestrator (and with it the inner service) for each request it emits.
///
/// [`run`]: Orchestrator::run
/// [`Scheduler`]: crate::client::Scheduler
pub struct Orchestrator<S, ReqBody> {
    service: S,
    uri: Uri,
    max_connect_attempts: u32,
    _body: PhantomData<fn(ReqBody)>,
}

// ===== impl Orchestrator =====

impl<S, ReqBody> Orchestrator<S, ReqBody> {
    /// Send requests for `uri` through `service`.
    pub fn new(service: S, uri: Uri) -> Self {
        Orchestrator {
            service,
            uri,
            max_connect_attempts: config::MAX_CONNECT_ATTEMPTS,
            _body: PhantomData,
        }
    }

    /// Set how many connection attempts to make for each issued request.
    ///
    /// At least one attempt is always made.
    pub fn with_max_connect_attempts(mut self, attempts: u32) -> Self {
        self.max_connect_attempts = attempts.max(1);
        self
    }

    /// The request target.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Get a reference to the inner service
    pub fn get_ref(&self) -> &S {
        &self.service
    }

    /// Get a mutable reference to the inner service
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Consume `self`, returning the inner service
    pub fn into_inner(self) -> S {
        self.service
    }
}

impl<S: Clone, ReqBody> Clone for Orchestrator<S, ReqBody> {
    fn clone(&self) -> Self {
        Orchestrator {
            service: self.service.clone(),
            uri: self.uri.clone(),
            max_connect_attempts: self.max_connect_attempts,
            _body: PhantomData,
        }
    }
}

impl<S: fmt::Debug, ReqBody> fmt::Debug for Orchestrator<S, ReqBody> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("service", &self.service)
            .field("uri", &self.uri)
            .field("max_connect_attempts", &self.max_connect_attempts)
            .finish()
    }
}

impl<S, ReqBody, ResBody> Orchestrator<S, ReqBody>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: Into<BoxError>,
    ReqBody: Default,
{
    /// Run request `sequence` of `scenario` until it finishes.
    pub async fn run(&mut self, scenario: u32, sequence: u64) -> Outcome {
        let mut attempt = RequestAttempt::new(scenario, sequence);
        let mut echoed = None;

        loop {
            let directive = {
                let response = match self.issue(&mut attempt, echoed).await {
                    Ok(response) => response,
                    Err(error) => return attempt.finish(Err(error)),
                };

                let status = response.status();
                if status != StatusCode::TOO_MANY_REQUESTS {
                    tracing::debug!(retry_count = attempt.retry_count, %status, "request finished");
                    return attempt.finish(Ok(status));
                }

                match RetryDirective::from_headers(response.headers()) {
                    Ok(directive) => directive,
                    Err(error) => {
                        tracing::warn!(retry_count = attempt.retry_count, %error, "giving up");
                        return attempt.finish(Err(error));
                    }
                }
            };

            tracing::debug!(
                retry_count = attempt.retry_count,
                wait = ?directive.wait(),
                "rate limited; backing off"
            );
            tokio::time::sleep(directive.wait()).await;

            attempt.retry_count = attempt.retry_count.saturating_add(1);
            echoed = directive.retry_count();
        }
    }

    async fn issue(
        &mut self,
        attempt: &mut RequestAttempt,
        echoed: Option<u32>,
    ) -> Result<Response<ResBody>, AttemptError> {
        attempt.connect_attempts = 0;

        loop {
            attempt.connect_attempts += 1;

            let source = match self.send(echoed).await {
                Ok(response) => return Ok(response),
                Err(source) => source,
            };
            if attempt.connect_attempts >= self.max_connect_attempts {
                tracing::debug!(connect_attempts = attempt.connect_attempts, error = %source, "transport failed");
                return Err(AttemptError::Transport {
                    attempts: attempt.connect_attempts,
                    source,
                });
            }
            tracing::trace!(connect_attempts = attempt.connect_attempts, error = %source, "transport failed; reconnecting");
        }
    }

    async fn send(&mut self, echoed: Option<u32>) -> Result<Response<ResBody>, BoxError> {
        let request = self.request(echoed);
        ServiceExt::<Request<ReqBody>>::ready(&mut self.service)
            .await
            .map_err(Into::<BoxError>::into)?;
        self.service
            .call(request)
            .await
            .map_err(Into::<BoxError>::into)
    }

    fn request(&self, echoed: Option<u32>) -> Request<ReqBody> {
        let mut request = Request::new(ReqBody::default());
        *request.method_mut() = Method::GET;
        *request.uri_mut() = self.uri.clone();
        if let Some(retry_count) = echoed {
            request
                .headers_mut()
                .insert(RETRY_COUNT, HeaderValue::from(retry_count));
        }
        request
    }
}
