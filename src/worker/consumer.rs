use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, time::timeout};
use tokio_util::sync::CancellationToken;

use crate::{
    analysis::Pipeline,
    worker::{
        reporter::StatusReporterPort,
        types::{AnalysisTask, StatusUpdate, TaskStatus},
    },
};

/// Drains the task queue, running each task through the shared pipeline and
/// reporting `processing` then `completed` or `failed`.
pub struct Worker {
    pipeline: Arc<Pipeline>,
    reporter: Arc<dyn StatusReporterPort>,
    task_timeout: Duration,
}

impl Worker {
    pub fn new(
        pipeline: Arc<Pipeline>,
        reporter: Arc<dyn StatusReporterPort>,
        task_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            reporter,
            task_timeout,
        }
    }

    /// Runs until the queue is closed or `shutdown` fires. A task already in
    /// progress is finished first; tasks still queued at shutdown are logged and dropped.
    #[tracing::instrument(name = "worker_run", target = "worker", skip_all)]
    pub async fn run(self, mut task_rx: mpsc::Receiver<AnalysisTask>, shutdown: CancellationToken) {
        tracing::info!(target: "worker", "worker_started");
        loop {
            let task = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                task = task_rx.recv() => task,
            };
            let Some(task) = task else {
                break;
            };
            self.handle(task).await;
        }

        task_rx.close();
        while let Ok(task) = task_rx.try_recv() {
            tracing::warn!(
                target: "worker",
                task_id = %task.task_id,
                "task_dropped_on_shutdown"
            );
        }
        tracing::info!(target: "worker", "worker_stopped");
    }

    /// Processes one task and returns the final status that was reported.
    #[tracing::instrument(
        name = "worker_task",
        target = "worker",
        skip(self, task),
        fields(task_id = %task.task_id)
    )]
    pub async fn handle(&self, task: AnalysisTask) -> TaskStatus {
        tracing::info!(target: "worker", "task_processing");
        self.report(StatusUpdate::processing(&task.task_id)).await;

        let update = match timeout(self.task_timeout, self.pipeline.process(&task.text_content))
            .await
        {
            Ok(Ok(result)) => {
                tracing::info!(
                    target: "worker",
                    recommendations = result.recommendations.len(),
                    "task_completed"
                );
                StatusUpdate::completed(&task.task_id, result)
            }
            Ok(Err(err)) => {
                tracing::error!(
                    target: "worker",
                    stage = %err.capability(),
                    error = %err,
                    "task_failed"
                );
                StatusUpdate::failed(&task.task_id, err.to_string())
            }
            Err(_) => {
                let message = format!(
                    "analysis timed out after {} ms",
                    self.task_timeout.as_millis()
                );
                tracing::error!(target: "worker", error = %message, "task_failed");
                StatusUpdate::failed(&task.task_id, message)
            }
        };

        let status = update.status;
        self.report(update).await;
        status
    }

    async fn report(&self, update: StatusUpdate) {
        if let Err(err) = self.reporter.report(&update).await {
            tracing::error!(
                target: "worker",
                task_id = %update.task_id,
                status = ?update.status,
                kind = ?err.kind,
                error = %err,
                "status_report_failed"
            );
        }
    }
}
