//! HTTP surface: health check, synchronous analysis, and task submission.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{
    analysis::{AnalysisResult, Pipeline},
    worker::{AnalysisTask, TaskQueue, protocol::generate_task_id},
};

pub const SERVICE_NAME: &str = "InsightFlow AI Worker API";

/// Shared by every handler. The pipeline is the same instance the worker uses.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub queue: TaskQueue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub task_id: String,
    pub text_content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub task_id: String,
    pub status: &'static str,
    pub analysis_output: AnalysisResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitTaskRequest {
    #[serde(default)]
    pub task_id: Option<String>,
    pub text_content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitTaskResponse {
    pub task_id: String,
    pub status: &'static str,
}

/// Error body in the `{"detail": ...}` shape callers of this service expect.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/analyze_sync", post(analyze_sync_handler))
        .route("/tasks", post(submit_task_handler))
        .with_state(state)
}

/// `accepting_tasks` turns false once shutdown has closed the task queue.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "accepting_tasks": state.queue.is_open(),
    }))
}

async fn analyze_sync_handler(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::info!(target: "server", task_id = %request.task_id, "analyze_sync_received");

    match state.pipeline.process(&request.text_content).await {
        Ok(analysis_output) => {
            tracing::info!(target: "server", task_id = %request.task_id, "analyze_sync_completed");
            Ok(Json(AnalyzeResponse {
                task_id: request.task_id,
                status: "processed_sync",
                analysis_output,
            }))
        }
        Err(err) => {
            tracing::error!(
                target: "server",
                task_id = %request.task_id,
                error = %err,
                "analyze_sync_failed"
            );
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to process analysis synchronously: {err}"),
            ))
        }
    }
}

async fn submit_task_handler(
    State(state): State<AppState>,
    payload: Result<Json<SubmitTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitTaskResponse>), ApiError> {
    let Json(request) = payload?;
    let task_id = request
        .task_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(generate_task_id);

    let task = AnalysisTask::new(task_id.clone(), request.text_content);
    state.queue.try_enqueue(task).await.map_err(|err| {
        tracing::warn!(target: "server", task_id = %task_id, error = %err, "task_rejected");
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
    })?;

    tracing::info!(target: "server", task_id = %task_id, "task_queued");
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitTaskResponse {
            task_id,
            status: "queued",
        }),
    ))
}

/// Serves until `shutdown` fires; in-flight requests are allowed to finish.
pub async fn serve(bind_addr: &str, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("unable to bind http listener {bind_addr}"))?;
    tracing::info!(target: "server", bind_addr = %bind_addr, "http_listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled_owned().await })
        .await
        .context("http server failed")?;

    tracing::info!(target: "server", "http_stopped");
    Ok(())
}
