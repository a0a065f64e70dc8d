use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::WorkerConfig,
    worker::{
        error::{ReporterError, ReporterErrorKind},
        types::StatusUpdate,
    },
};

/// Delivers task status changes to whoever tracks the task.
#[async_trait]
pub trait StatusReporterPort: Send + Sync {
    async fn report(&self, update: &StatusUpdate) -> Result<(), ReporterError>;
}

/// POSTs each update as JSON. Any non-2xx response counts as a failure.
#[derive(Debug, Clone)]
pub struct HttpStatusReporter {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpStatusReporter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ReporterError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| {
                ReporterError::new(
                    ReporterErrorKind::Internal,
                    format!("failed to build http client: {err}"),
                )
            })?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

}

#[async_trait]
impl StatusReporterPort for HttpStatusReporter {
    async fn report(&self, update: &StatusUpdate) -> Result<(), ReporterError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(update)
            .send()
            .await
            .map_err(|err| {
                let kind = if err.is_timeout() {
                    ReporterErrorKind::Timeout
                } else {
                    ReporterErrorKind::Transport
                };
                ReporterError::new(kind, format!("status callback request failed: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReporterError::new(
                ReporterErrorKind::Rejected,
                format!("status callback returned {}", status.as_u16()),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStatusReporter;

#[async_trait]
impl StatusReporterPort for NoopStatusReporter {
    async fn report(&self, update: &StatusUpdate) -> Result<(), ReporterError> {
        tracing::debug!(
            target: "reporter",
            task_id = %update.task_id,
            status = ?update.status,
            "status_report_skipped"
        );
        Ok(())
    }
}

pub fn reporter_from_config(
    config: &WorkerConfig,
) -> Result<Arc<dyn StatusReporterPort>, ReporterError> {
    match config.callback_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(Arc::new(HttpStatusReporter::new(
            url,
            Duration::from_millis(config.callback_timeout_ms),
        )?)),
        _ => Ok(Arc::new(NoopStatusReporter)),
    }
}
