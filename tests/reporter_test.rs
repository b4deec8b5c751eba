use std::{net::SocketAddr, time::Duration};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    routing::post,
};
use portfolio::reporter::ViewReporter;
use serde_json::{Value, json};
use tokio::{
    net::TcpListener,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError, unbounded_channel},
    time::{sleep, timeout},
};

type Capture = (UnboundedSender<(String, Value)>, StatusCode);

/// Records every report it receives as `(content-type, body)` and answers with `status`.
async fn capture_server_with(status: StatusCode) -> (String, UnboundedReceiver<(String, Value)>) {
    let (sender, receiver) = unbounded_channel();

    async fn capture(
        State((sender, status)): State<Capture>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let _ = sender.send((content_type, body));

        status
    }

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    let app = Router::new()
        .route("/api/incr", post(capture))
        .with_state((sender, status));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://127.0.0.1:{port}/api/incr"), receiver)
}

async fn capture_server() -> (String, UnboundedReceiver<(String, Value)>) {
    capture_server_with(StatusCode::ACCEPTED).await
}

async fn next_report(receiver: &mut UnboundedReceiver<(String, Value)>) -> (String, Value) {
    timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("report not received in time")
        .expect("capture server stopped")
}

async fn assert_quiet(receiver: &mut UnboundedReceiver<(String, Value)>) {
    sleep(Duration::from_millis(200)).await;

    assert!(matches!(receiver.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn reports_json_body_once() {
    let (endpoint, mut receiver) = capture_server().await;
    let reporter = ViewReporter::new(endpoint);

    reporter.report("blogs", "my-post");
    reporter.report("blogs", "my-post");

    let (content_type, body) = next_report(&mut receiver).await;
    assert_eq!(content_type, "application/json");
    assert_eq!(body, json!({"unit": "blogs", "slug": "my-post"}));

    assert_quiet(&mut receiver).await;
}

#[tokio::test]
async fn reports_again_when_pair_changes() {
    let (endpoint, mut receiver) = capture_server().await;
    let reporter = ViewReporter::new(endpoint);

    reporter.report("blogs", "my-post");
    let (_, first) = next_report(&mut receiver).await;

    reporter.report("blogs", "other-post");
    let (_, second) = next_report(&mut receiver).await;

    assert_eq!(first, json!({"unit": "blogs", "slug": "my-post"}));
    assert_eq!(second, json!({"unit": "blogs", "slug": "other-post"}));
    assert_quiet(&mut receiver).await;
}

#[tokio::test]
async fn reset_allows_same_pair_again() {
    let (endpoint, mut receiver) = capture_server().await;
    let reporter = ViewReporter::new(endpoint);

    reporter.report("projects", "crab");
    next_report(&mut receiver).await;

    reporter.reset();
    reporter.report("projects", "crab");
    let (_, body) = next_report(&mut receiver).await;

    assert_eq!(body, json!({"unit": "projects", "slug": "crab"}));
}

#[tokio::test]
async fn failed_report_is_not_retried() {
    let (endpoint, mut receiver) = capture_server_with(StatusCode::INTERNAL_SERVER_ERROR).await;
    let reporter = ViewReporter::new(endpoint);

    reporter.report("blogs", "my-post");
    let (_, failed) = next_report(&mut receiver).await;
    assert_eq!(failed, json!({"unit": "blogs", "slug": "my-post"}));

    reporter.report("blogs", "my-post");
    assert_quiet(&mut receiver).await;

    reporter.report("blogs", "other-post");
    let (_, next) = next_report(&mut receiver).await;
    assert_eq!(next, json!({"unit": "blogs", "slug": "other-post"}));
    assert_quiet(&mut receiver).await;
}
