#![cfg(feature = "client")]
#[path = "../support.rs"]
mod support;

use http::{Request, Response, StatusCode, Uri};
use pushback::client::{Orchestrator, Outcome, Scenario, Scheduler};
use pushback::error::BoxError;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tower::service_fn;

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn emits_at_the_scenario_rate() {
    let _t = support::trace_init();

    let svc = service_fn(|_: Request<()>| async { Ok::<_, BoxError>(Response::new(())) });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(new_orchestrator(svc), tx);

    let scenario = Scenario::new(1, 10, Duration::from_millis(1_050)).unwrap();
    let started = Instant::now();
    let emitted = scheduler.run(&scenario).await;

    assert_eq!(emitted, 10);
    assert!(started.elapsed() >= Duration::from_millis(1_050));

    drop(scheduler);
    let mut sequences = drain(&mut rx)
        .await
        .iter()
        .map(Outcome::sequence)
        .collect::<Vec<_>>();
    sequences.sort_unstable();
    assert_eq!(sequences, (1..=10).collect::<Vec<_>>());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn does_not_wait_for_slow_requests() {
    let _t = support::trace_init();

    let svc = service_fn(|_: Request<()>| async {
        time::sleep(Duration::from_secs(60)).await;
        Ok::<_, BoxError>(Response::new(()))
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(new_orchestrator(svc), tx);

    let scenario = Scenario::new(2, 10, Duration::from_millis(1_050)).unwrap();
    let started = Instant::now();
    let emitted = scheduler.run(&scenario).await;

    assert_eq!(emitted, 10);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(rx.try_recv().is_err(), "no request can have finished yet");

    // the runs keep going after the scenario is over
    drop(scheduler);
    let outcomes = drain(&mut rx).await;
    assert_eq!(outcomes.len(), 10);
    assert!(outcomes.iter().all(|o| o.scenario() == 2));
    assert!(outcomes.iter().all(|o| o.status() == StatusCode::OK));
    assert!(started.elapsed() >= Duration::from_secs(60));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn zero_duration_emits_nothing() {
    let _t = support::trace_init();

    let svc = service_fn(|_: Request<()>| async { Ok::<_, BoxError>(Response::new(())) });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(new_orchestrator(svc), tx);

    let scenario = Scenario::new(3, 1_000, Duration::from_secs(0)).unwrap();
    assert_eq!(scheduler.run(&scenario).await, 0);

    drop(scheduler);
    assert!(drain(&mut rx).await.is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn scenarios_run_back_to_back() {
    let _t = support::trace_init();

    let svc = service_fn(|_: Request<()>| async { Ok::<_, BoxError>(Response::new(())) });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(new_orchestrator(svc), tx);

    let scenarios = [
        Scenario::new(1, 4, Duration::from_millis(1_100)).unwrap(),
        Scenario::new(2, 8, Duration::from_millis(600)).unwrap(),
    ];
    let mut emitted = Vec::new();
    for scenario in &scenarios {
        emitted.push(scheduler.run(scenario).await);
    }
    assert_eq!(emitted, vec![4, 4]);

    drop(scheduler);
    let outcomes = drain(&mut rx).await;
    assert_eq!(outcomes.iter().filter(|o| o.scenario() == 1).count(), 4);
    assert_eq!(outcomes.iter().filter(|o| o.scenario() == 2).count(), 4);
}

async fn drain(rx: &mut mpsc::UnboundedReceiver<Outcome>) -> Vec<Outcome> {
    let mut outcomes = Vec::new();
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }
    outcomes
}

fn new_orchestrator<S>(service: S) -> Orchestrator<S, ()> {
    Orchestrator::new(service, uri())
}

fn uri() -> Uri {
    Uri::from_static("http://localhost:8080/")
}
