use http::{Request, Response};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tower_service::Service;
use tracing::Instrument;

use super::{Orchestrator, Outcome};
use crate::error::{BoxError, InvalidScenario};

/// A fixed rate of offered load, held for a fixed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    id: u32,
    rate: u32,
    duration: Duration,
}

impl Scenario {
    /// Offer `rate` requests per second for `duration`.
    ///
    /// # Error
    ///
    /// Returns a validation error if `rate` is zero or faster than one
    /// request per nanosecond.
    pub fn new(id: u32, rate: u32, duration: Duration) -> Result<Self, InvalidScenario> {
        if rate == 0 {
            return Err(InvalidScenario("rate must be non-zero"));
        }
        if rate > 1_000_000_000 {
            return Err(InvalidScenario(
                "rate must not exceed one request per nanosecond",
            ));
        }

        Ok(Scenario { id, rate, duration })
    }

    /// Identifies the scenario in outcomes and logs.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Requests emitted per second.
    pub fn rate(&self) -> u32 {
        self.rate
    }

    /// How long requests are emitted for.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time between two emitted requests.
    pub fn period(&self) -> Duration {
        Duration::from_secs(1) / self.rate
    }
}

/// Paces logical requests at a scenario's rate.
///
/// Every tick assigns the next sequence number and spawns an
/// [`Orchestrator`] run for it onto the current Tokio runtime. The scheduler
/// never waits on those runs: a slow or throttled server does not slow the
/// offered load down, and runs still in flight when the scenario's duration
/// is up keep going until they finish on their own. Their [`Outcome`]s are
/// sent to the `outcomes` channel.
#[derive(Debug)]
pub struct Scheduler<S, ReqBody> {
    orchestrator: Orchestrator<S, ReqBody>,
    outcomes: mpsc::UnboundedSender<Outcome>,
}

impl<S, ReqBody> Scheduler<S, ReqBody> {
    /// Emit requests through clones of `orchestrator`, reporting to
    /// `outcomes`.
    pub fn new(
        orchestrator: Orchestrator<S, ReqBody>,
        outcomes: mpsc::UnboundedSender<Outcome>,
    ) -> Self {
        Scheduler {
            orchestrator,
            outcomes,
        }
    }
}

impl<S, ReqBody, ResBody> Scheduler<S, ReqBody>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<BoxError> + Send,
    ReqBody: Default + Send + 'static,
    ResBody: Send + 'static,
{
    /// Emit `scenario`'s requests, returning how many were emitted.
    ///
    /// The first request goes out one period after the call. Returns as soon
    /// as the scenario's duration has elapsed, without waiting for any of the
    /// emitted requests to finish.
    pub async fn run(&self, scenario: &Scenario) -> u64 {
        let period = scenario.period();
        let mut ticks = time::interval_at(Instant::now() + period, period);
        let deadline = time::sleep(scenario.duration());
        tokio::pin!(deadline);

        tracing::info!(
            scenario = scenario.id(),
            rate = scenario.rate(),
            duration = ?scenario.duration(),
            "scenario started"
        );

        let mut sequence = 0;
        loop {
            tokio::select! {
                biased;

                _ = &mut deadline => break,
                _ = ticks.tick() => {
                    sequence += 1;
                    self.launch(scenario.id(), sequence);
                }
            }
        }

        tracing::info!(scenario = scenario.id(), emitted = sequence, "scenario finished");
        sequence
    }

    fn launch(&self, scenario: u32, sequence: u64) {
        let mut orchestrator = self.orchestrator.clone();
        let outcomes = self.outcomes.clone();
        let span = tracing::debug_span!("request", scenario, sequence);

        tokio::spawn(
            async move {
                let outcome = orchestrator.run(scenario, sequence).await;
                // nobody may be listening anymore
                let _ = outcomes.send(outcome);
            }
            .instrument(span),
        );
    }
}
