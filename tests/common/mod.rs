//! Shared test helpers: a stub processing server that records raw request
//! bodies and answers with a scripted status and document.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type RecordedRequests = Arc<Mutex<Vec<Bytes>>>;

#[derive(Clone)]
struct StubState {
    requests: RecordedRequests,
    status: StatusCode,
    body: &'static str,
    delay: Duration,
}

pub async fn spawn_stub(status: StatusCode, body: &'static str) -> (String, RecordedRequests) {
    spawn_stub_with_delay(status, body, Duration::ZERO).await
}

/// Stub that waits `delay` before responding, so tests can observe the
/// session while a submission is in flight.
pub async fn spawn_stub_with_delay(
    status: StatusCode,
    body: &'static str,
    delay: Duration,
) -> (String, RecordedRequests) {
    let requests: RecordedRequests = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        requests: requests.clone(),
        status,
        body,
        delay,
    };

    let app = Router::new()
        .route("/process_voice", post(handle))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/process_voice"), requests)
}

async fn handle(State(state): State<StubState>, body: Bytes) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(body);
    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }
    (state.status, state.body.to_string())
}

pub fn body_contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
