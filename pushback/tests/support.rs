#![allow(dead_code)]

use http::{Request, Response};
use pushback::admission::Admit;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Mutex;

pub(crate) fn trace_init() -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// An admission gate that plays back a fixed list of decisions, then admits
/// everything.
#[derive(Debug, Default)]
pub struct Script(Mutex<VecDeque<bool>>);

impl Script {
    pub fn new(decisions: &[bool]) -> Self {
        Script(Mutex::new(decisions.iter().copied().collect()))
    }

    pub fn deny(n: usize) -> Self {
        Script::new(&vec![false; n])
    }
}

impl Admit for Script {
    fn allow(&self) -> bool {
        self.0.lock().unwrap().pop_front().unwrap_or(true)
    }
}

pub async fn hello<B>(_: Request<B>) -> Result<Response<String>, Infallible> {
    Ok(Response::new("Hello, World!".to_owned()))
}
