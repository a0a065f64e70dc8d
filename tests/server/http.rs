use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use insight_flow::{
    analysis::{
        Pipeline, StageRegistries,
        error::backend_failure,
        testing::{StageHooks, pipeline_with_hooks, sentiment_hook},
    },
    config::PipelineConfig,
    server::{AppState, router},
    worker::{AnalysisTask, TaskQueue},
};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;

fn app_with(
    pipeline: Pipeline,
    capacity: usize,
) -> (Router, TaskQueue, mpsc::Receiver<AnalysisTask>) {
    let (queue, task_rx) = TaskQueue::channel(capacity);
    let app = router(AppState {
        pipeline: Arc::new(pipeline),
        queue: queue.clone(),
    });
    (app, queue, task_rx)
}

fn default_pipeline() -> Pipeline {
    let registries = StageRegistries::with_defaults().expect("built-in stages register");
    Pipeline::from_config(&PipelineConfig::default(), &registries)
        .expect("default pipeline should build")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be json")
}

#[tokio::test]
async fn health_reports_service_name() {
    let (app, _queue, _rx) = app_with(default_pipeline(), 4);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!({
            "status": "ok",
            "service": "InsightFlow AI Worker API",
            "accepting_tasks": true
        })
    );
}

#[tokio::test]
async fn health_reports_closed_task_queue() {
    let (app, queue, _rx) = app_with(default_pipeline(), 4);
    queue.close_gate().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["accepting_tasks"], json!(false));
}

#[tokio::test]
async fn analyze_sync_returns_processed_result() {
    let (app, _queue, _rx) = app_with(default_pipeline(), 4);
    let response = app
        .oneshot(post_json(
            "/analyze_sync",
            json!({"task_id": "sync-1", "text_content": "顧客抱怨胃部不適，希望有促銷方案。"}),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["task_id"], "sync-1");
    assert_eq!(body["status"], "processed_sync");
    assert_eq!(body["analysis_output"]["sentiment"]["label"], "negative");
    assert_eq!(
        body["analysis_output"]["intent"]["product_category"],
        "腸胃照護產品"
    );
}

#[tokio::test]
async fn analyze_sync_failure_is_500_with_detail() {
    let hooks = StageHooks::fixed().with_sentiment(sentiment_hook(|_text| async {
        Err(backend_failure("model offline"))
    }));
    let (app, _queue, _rx) = app_with(pipeline_with_hooks(hooks, 5), 4);

    let response = app
        .oneshot(post_json(
            "/analyze_sync",
            json!({"task_id": "sync-2", "text_content": "text"}),
        ))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        read_json(response).await,
        json!({
            "detail": "Failed to process analysis synchronously: sentiment_analyzer stage failed: model offline"
        })
    );
}

#[tokio::test]
async fn analyze_sync_rejects_payload_without_text() {
    let (app, _queue, _rx) = app_with(default_pipeline(), 4);
    let response = app
        .oneshot(post_json("/analyze_sync", json!({"task_id": "sync-3"})))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(read_json(response).await["detail"].is_string());
}

#[tokio::test]
async fn submitted_task_is_queued_with_generated_id() {
    let (app, _queue, mut task_rx) = app_with(default_pipeline(), 4);
    let response = app
        .oneshot(post_json("/tasks", json!({"text_content": "睡眠品質不好"})))
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = read_json(response).await;
    assert_eq!(body["status"], "queued");
    let task_id = body["task_id"].as_str().expect("task id should be a string");

    let queued = task_rx.recv().await.expect("task should be queued");
    assert_eq!(queued.task_id, task_id);
    assert_eq!(queued.text_content, "睡眠品質不好");
}

#[tokio::test]
async fn full_or_closed_queue_returns_503() {
    let (app, queue, _rx) = app_with(default_pipeline(), 1);

    let first = app
        .clone()
        .oneshot(post_json("/tasks", json!({"task_id": "a", "text_content": "x"})))
        .await
        .expect("request should complete");
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let full = app
        .clone()
        .oneshot(post_json("/tasks", json!({"task_id": "b", "text_content": "x"})))
        .await
        .expect("request should complete");
    assert_eq!(full.status(), StatusCode::SERVICE_UNAVAILABLE);

    queue.close_gate().await;
    let closed = app
        .oneshot(post_json("/tasks", json!({"task_id": "c", "text_content": "x"})))
        .await
        .expect("request should complete");
    assert_eq!(closed.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(
        read_json(closed).await["detail"]
            .as_str()
            .is_some_and(|detail| detail.contains("closed"))
    );
}
