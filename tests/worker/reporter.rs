use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use insight_flow::{
    config::WorkerConfig,
    worker::{
        HttpStatusReporter, ReporterErrorKind, StatusReporterPort, StatusUpdate,
        reporter_from_config,
    },
};
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Clone)]
struct Callback {
    status: StatusCode,
    received: Arc<Mutex<Vec<Value>>>,
}

async fn receive(State(callback): State<Callback>, Json(body): Json<Value>) -> StatusCode {
    callback.received.lock().expect("lock").push(body);
    callback.status
}

async fn spawn_callback(status: StatusCode) -> (String, Arc<Mutex<Vec<Value>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("callback should bind");
    let addr = listener.local_addr().expect("local addr");
    let app = Router::new()
        .route("/api/internal/analysis/update", post(receive))
        .with_state(Callback {
            status,
            received: Arc::clone(&received),
        });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/api/internal/analysis/update"), received)
}

#[tokio::test]
async fn http_reporter_posts_status_json() {
    let (url, received) = spawn_callback(StatusCode::OK).await;
    let reporter = HttpStatusReporter::new(url, Duration::from_secs(5)).expect("reporter builds");

    reporter
        .report(&StatusUpdate::failed("task-1", "boom"))
        .await
        .expect("report should succeed");

    let bodies = received.lock().expect("lock").clone();
    assert_eq!(
        bodies,
        vec![serde_json::json!({
            "task_id": "task-1",
            "status": "failed",
            "result": {"error": "boom", "details": "Worker processing failed"}
        })]
    );
}

#[tokio::test]
async fn non_success_status_is_a_rejected_report() {
    let (url, _received) = spawn_callback(StatusCode::INTERNAL_SERVER_ERROR).await;
    let reporter = HttpStatusReporter::new(url, Duration::from_secs(5)).expect("reporter builds");

    let err = reporter
        .report(&StatusUpdate::processing("task-2"))
        .await
        .expect_err("500 should fail");
    assert_eq!(err.kind, ReporterErrorKind::Rejected);
    assert!(err.message.contains("500"));
}

#[tokio::test]
async fn unreachable_callback_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let reporter = HttpStatusReporter::new(format!("http://{addr}/update"), Duration::from_secs(2))
        .expect("reporter builds");
    let err = reporter
        .report(&StatusUpdate::processing("task-3"))
        .await
        .expect_err("closed port should fail");
    assert!(matches!(
        err.kind,
        ReporterErrorKind::Transport | ReporterErrorKind::Timeout
    ));
}

#[tokio::test]
async fn missing_callback_url_selects_noop_reporter() {
    let config = WorkerConfig::default();
    let reporter = reporter_from_config(&config).expect("noop reporter builds");
    reporter
        .report(&StatusUpdate::processing("task-4"))
        .await
        .expect("noop reporter never fails");
}
