//! A rate-limited "Hello, World!" server.
//!
//! Every connection shares one token bucket. Requests over budget are
//! answered with `429 Too Many Requests` and a `Retry-After` computed by the
//! backoff policy named on the command line:
//!
//! ```text
//! cargo run --example server -- fixed
//! cargo run --example server -- jitter
//! cargo run --example server -- exponential
//! ```

use hyper::service::make_service_fn;
use hyper::{Body, Request, Response, Server};
use pushback::backoff::PolicyKind;
use pushback::config;
use pushback::load::ServerLoad;
use pushback::throttle::ThrottleLayer;
use pushback::BoxError;
use std::convert::Infallible;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let policy = match env::args().nth(1) {
        Some(name) => name.parse::<PolicyKind>()?,
        None => PolicyKind::Fixed,
    };

    let load = Arc::new(ServerLoad::default());
    let throttle = ThrottleLayer::new(load.clone(), policy.default_policy());

    let make_service = make_service_fn(move |_| {
        let svc = ServiceBuilder::new()
            .timeout(config::IO_TIMEOUT)
            .layer(throttle.clone())
            .service_fn(hello);
        async move { Ok::<_, Infallible>(svc) }
    });

    let addr = SocketAddr::from(config::SERVER_ADDR);
    let server = Server::try_bind(&addr)?.serve(make_service);
    tracing::info!(%addr, %policy, "listening");

    server
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!(requests = load.requests(), "server stopped");
    Ok(())
}

async fn hello(_: Request<Body>) -> Result<Response<Body>, Infallible> {
    Ok(Response::new(Body::from("Hello, World!")))
}
