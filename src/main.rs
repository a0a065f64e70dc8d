use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{
    signal::unix::{SignalKind, signal},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use insight_flow::{
    analysis::{Pipeline, StageRegistries},
    cli::config_path_from_args,
    config::Config,
    logging::init_tracing,
    server::{self, AppState},
    worker::{TaskIngress, TaskQueue, Worker, reporter_from_config},
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args()?;
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let logging_guard = init_tracing(&config.logging)?;

    let registries =
        StageRegistries::with_defaults().context("failed to register built-in stages")?;
    let pipeline = Arc::new(
        Pipeline::from_config(&config.pipeline, &registries)
            .context("failed to build analysis pipeline")?,
    );

    let (queue, task_rx) = TaskQueue::channel(config.worker.queue_capacity);
    let shutdown = CancellationToken::new();
    let mut tasks: Vec<(&'static str, JoinHandle<Result<()>>)> = Vec::new();

    if config.worker.enabled {
        let reporter =
            reporter_from_config(&config.worker).context("failed to build status reporter")?;
        let worker = Worker::new(
            Arc::clone(&pipeline),
            reporter,
            Duration::from_millis(config.worker.task_timeout_ms),
        );
        let worker_shutdown = shutdown.clone();
        tasks.push((
            "worker",
            tokio::spawn(async move {
                worker.run(task_rx, worker_shutdown).await;
                Ok(())
            }),
        ));

        let ingress = TaskIngress::new(config.worker.socket_path.clone());
        let listener = ingress.bind()?;
        let ingress_queue = queue.clone();
        let ingress_shutdown = shutdown.clone();
        tasks.push((
            "ingress",
            tokio::spawn(async move {
                ingress
                    .serve(listener, ingress_queue, ingress_shutdown)
                    .await
            }),
        ));
    } else {
        drop(task_rx);
        queue.close_gate().await;
    }

    if config.server.enabled {
        let state = AppState {
            pipeline: Arc::clone(&pipeline),
            queue: queue.clone(),
        };
        let bind_addr = config.server.bind_addr.clone();
        let server_shutdown = shutdown.clone();
        tasks.push((
            "server",
            tokio::spawn(async move { server::serve(&bind_addr, state, server_shutdown).await }),
        ));
    }

    if tasks.is_empty() {
        tracing::warn!(target: "main", "neither worker nor server is enabled; exiting");
        return Ok(());
    }

    tracing::info!(
        target: "main",
        run_id = %logging_guard.run_id(),
        config = %config_path.display(),
        worker_enabled = config.worker.enabled,
        server_enabled = config.server.enabled,
        "insight_flow_started"
    );

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let signal_name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    };

    tracing::info!(target: "main", signal = signal_name, "shutdown_requested");
    queue.close_gate().await;
    shutdown.cancel();

    let mut first_error = None;
    for (name, handle) in tasks {
        let outcome = handle
            .await
            .with_context(|| format!("{name} task join failed"))
            .and_then(|result| result.with_context(|| format!("{name} task failed")));
        if let Err(err) = outcome {
            tracing::error!(
                target: "main",
                task = name,
                error = %format!("{err:#}"),
                "task_exit_error"
            );
            first_error.get_or_insert(err);
        }
    }

    tracing::info!(target: "main", signal = signal_name, "insight_flow_stopped");
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
