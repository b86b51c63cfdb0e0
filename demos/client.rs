//! Offers load to the demo server and obeys its backoff directives.
//!
//! Runs the default scenarios one after another, then waits for every
//! outstanding request to finish before exiting.
//!
//! Every response body is read to the end before the orchestrator looks at
//! it, so that rejected requests hand their connection back to the pool
//! instead of closing it.

use hyper::body::Bytes;
use hyper::{Body, Client, Response, Uri};
use pushback::client::{Orchestrator, Outcome, Scenario, Scheduler};
use pushback::config;
use pushback::BoxError;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let uri: Uri = format!("http://{}/", SocketAddr::from(config::SERVER_ADDR)).parse()?;
    let client = ServiceBuilder::new()
        .timeout(config::IO_TIMEOUT)
        .and_then(buffered)
        .service(Client::new());

    let (tx, rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(report(rx));

    let orchestrator: Orchestrator<_, Body> = Orchestrator::new(client, uri);
    let scheduler = Scheduler::new(orchestrator, tx);
    for &(id, rate, duration) in config::SCENARIOS.iter() {
        let scenario = Scenario::new(id, rate, duration)?;
        scheduler.run(&scenario).await;
    }

    // outcomes stop once the last in-flight request is done
    drop(scheduler);
    reporter.await?;
    Ok(())
}

async fn buffered(response: Response<Body>) -> Result<Response<Bytes>, hyper::Error> {
    let (parts, body) = response.into_parts();
    let body = hyper::body::to_bytes(body).await?;
    Ok(Response::from_parts(parts, body))
}

async fn report(mut outcomes: mpsc::UnboundedReceiver<Outcome>) {
    let mut statuses = BTreeMap::new();

    while let Some(outcome) = outcomes.recv().await {
        match outcome.result() {
            Ok(status) => tracing::info!(
                scenario = outcome.scenario(),
                sequence = outcome.sequence(),
                retry_count = outcome.retry_count(),
                %status,
                "request finished"
            ),
            Err(error) => tracing::warn!(
                scenario = outcome.scenario(),
                sequence = outcome.sequence(),
                retry_count = outcome.retry_count(),
                %error,
                "request failed"
            ),
        }

        *statuses
            .entry((outcome.scenario(), outcome.status().as_u16()))
            .or_insert(0u64) += 1;
    }

    for ((scenario, status), count) in statuses {
        tracing::info!(scenario, status, count, "summary");
    }
}
