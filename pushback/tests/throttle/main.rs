#![cfg(feature = "server")]
#[path = "../support.rs"]
mod support;

use http::header::RETRY_AFTER;
use http::{Method, Request, Response, StatusCode};
use pushback::admission::{Admit, TokenBucket};
use pushback::backoff::{BackoffPolicy, ExponentialEchoed, PolicyKind};
use pushback::directive::RETRY_COUNT;
use pushback::load::ServerLoad;
use pushback::throttle::{Throttle, ThrottleLayer};
use std::sync::Arc;
use std::time::Duration;
use support::Script;
use tokio_test::{assert_pending, assert_ready_ok, task};
use tower::{service_fn, ServiceExt};
use tower_layer::Layer;
use tower_test::mock;

#[tokio::test(flavor = "current_thread")]
async fn admitted_requests_reach_inner_service() {
    let _t = support::trace_init();

    let load = Arc::new(ServerLoad::new(Script::new(&[true])));
    let svc = Throttle::new(
        service_fn(support::hello::<()>),
        load.clone(),
        PolicyKind::Fixed.default_policy(),
    );

    let response = svc.oneshot(get()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), "Hello, World!");
    assert!(response.headers().get(RETRY_AFTER).is_none());
    assert_eq!(load.requests(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn fixed_rejection_carries_constant_retry_after() {
    let _t = support::trace_init();

    let load = Arc::new(ServerLoad::new(Script::deny(3)));
    let svc = Throttle::new(
        service_fn(support::hello::<()>),
        load.clone(),
        PolicyKind::Fixed.default_policy(),
    );

    for _ in 0..3 {
        let response = svc.clone().oneshot(get()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "5");
        assert!(response.headers().get(RETRY_COUNT).is_none());
        assert_eq!(response.body(), "Too Many Requests");
    }

    assert_eq!(load.requests(), 3);
    assert_eq!(load.rejected().load(), 0, "fixed policy does not track load");
}

#[tokio::test(flavor = "current_thread")]
async fn exponential_rejection_echoes_next_retry_count() {
    let _t = support::trace_init();

    let load = Arc::new(ServerLoad::new(Script::deny(4)));
    let svc = Throttle::new(
        service_fn(support::hello::<()>),
        load,
        PolicyKind::ExponentialEchoed.default_policy(),
    );

    let cases = [
        (None, "2", "1"),
        (Some("1"), "4", "2"),
        (Some("2"), "8", "3"),
        (Some("junk"), "2", "1"),
    ];
    for &(echoed, retry_after, next) in &cases {
        let mut request = get();
        if let Some(echoed) = echoed {
            request.headers_mut().insert(RETRY_COUNT, echoed.parse().unwrap());
        }

        let response = svc.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], retry_after);
        assert_eq!(response.headers()[RETRY_COUNT], next);
    }
}

#[tokio::test(flavor = "current_thread")]
async fn load_adaptive_counter_follows_rejections_and_admissions() {
    let _t = support::trace_init();

    let load = Arc::new(ServerLoad::new(Script::new(&[
        false, false, false, true, true, true, true,
    ])));
    let svc = Throttle::new(
        service_fn(support::hello::<()>),
        load.clone(),
        PolicyKind::LoadAdaptiveJitter.default_policy(),
    );

    let mut seen = Vec::new();
    for _ in 0..7 {
        let response = svc.clone().oneshot(get()).await.unwrap();
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let wait: u64 = response.headers()[RETRY_AFTER]
                .to_str()
                .unwrap()
                .parse()
                .unwrap();
            // base is 5s at low contention; ±70% then truncated
            assert!((1..=8).contains(&wait), "wait = {}", wait);
        }
        seen.push(load.rejected().load());
    }

    assert_eq!(seen, vec![1, 2, 3, 2, 1, 0, 0]);
    assert_eq!(load.requests(), 7);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn token_bucket_rejects_past_burst() {
    let _t = support::trace_init();

    let load = Arc::new(ServerLoad::new(TokenBucket::new(1.0, 2).unwrap()));
    let layer = ThrottleLayer::new(load.clone(), PolicyKind::Fixed.default_policy());
    let svc = layer.layer(service_fn(support::hello::<()>));

    let mut statuses = Vec::new();
    for _ in 0..3 {
        statuses.push(svc.clone().oneshot(get()).await.unwrap().status());
    }
    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(
        svc.clone().oneshot(get()).await.unwrap().status(),
        StatusCode::OK
    );
    assert_eq!(load.requests(), 4);
}

#[tokio::test(flavor = "current_thread")]
async fn rejected_requests_skip_inner_service() {
    let _t = support::trace_init();

    let load = Arc::new(ServerLoad::new(Script::new(&[false, true])));
    let (mut service, mut handle) = mock::spawn_with(move |mock: Mock| {
        Throttle::new(
            mock,
            load.clone(),
            BackoffPolicy::from(ExponentialEchoed::default()),
        )
    });

    assert_ready_ok!(service.poll_ready());
    let response = service.call(get()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    assert_ready_ok!(service.poll_ready());
    let mut fut = task::spawn(service.call(get()));
    assert_pending!(fut.poll());

    let (request, send) = handle.next_request().await.unwrap();
    assert_eq!(request.method(), Method::GET);
    send.send_response(Response::new(String::from("ok")));

    let response = fut.into_inner().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), "ok");
}

#[test]
fn gates_compose_through_smart_pointers() {
    let bucket = Arc::new(TokenBucket::new(1.0, 1).unwrap());
    let by_ref: &dyn Admit = &bucket;
    assert!(by_ref.allow());
    assert!(!bucket.allow());
}

type Mock = mock::Mock<Request<()>, Response<String>>;

fn get() -> Request<()> {
    Request::get("/").body(()).unwrap()
}
