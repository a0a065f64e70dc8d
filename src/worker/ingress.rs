use std::{
    fs,
    io::ErrorKind,
    os::unix::fs::FileTypeExt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{UnixListener, UnixStream},
};
use tokio_util::sync::CancellationToken;

use crate::worker::{
    protocol::{IngressMessage, IngressReply, encode_ingress_reply, parse_ingress_line},
    queue::TaskQueue,
};

/// Unix-socket listener that feeds NDJSON task lines into the [`TaskQueue`].
pub struct TaskIngress {
    pub socket_path: PathBuf,
}

impl TaskIngress {
    pub fn new(socket_path: PathBuf) -> Self {
        Self { socket_path }
    }

    /// Prepares the socket path and binds it. Split from [`TaskIngress::serve`] so callers
    /// can be sure the socket exists before spawning the accept loop.
    pub fn bind(&self) -> Result<UnixListener> {
        prepare_socket_path(&self.socket_path)?;
        UnixListener::bind(&self.socket_path)
            .with_context(|| format!("unable to bind socket {}", self.socket_path.display()))
    }

    #[tracing::instrument(
        name = "task_ingress",
        target = "ingress",
        skip(self, listener, queue, shutdown),
        fields(socket = %self.socket_path.display())
    )]
    pub async fn serve(
        &self,
        listener: UnixListener,
        queue: TaskQueue,
        shutdown: CancellationToken,
    ) -> Result<()> {
        tracing::info!(target: "ingress", "ingress_listening");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _)) => {
                            let queue = queue.clone();
                            let shutdown = shutdown.child_token();
                            tokio::spawn(async move {
                                if let Err(err) = handle_connection(stream, queue, shutdown).await {
                                    tracing::warn!(
                                        target: "ingress",
                                        error = %format!("{err:#}"),
                                        "connection_failed"
                                    );
                                }
                            });
                        }
                        Err(err) => {
                            tracing::warn!(target: "ingress", error = %err, "accept_failed");
                        }
                    }
                }
            }
        }

        cleanup_socket_path(&self.socket_path)?;
        tracing::info!(target: "ingress", "ingress_stopped");
        Ok(())
    }
}

async fn handle_connection(
    stream: UnixStream,
    queue: TaskQueue,
    shutdown: CancellationToken,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match parse_ingress_line(line) {
            Ok(IngressMessage::Task(task)) => {
                let task_id = task.task_id.clone();
                let enqueued = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    enqueued = queue.enqueue(task) => enqueued,
                };
                match enqueued {
                    Ok(()) => {
                        tracing::info!(target: "ingress", task_id = %task_id, "task_accepted");
                        IngressReply::Accepted { task_id }
                    }
                    Err(err) => {
                        tracing::warn!(
                            target: "ingress",
                            task_id = %task_id,
                            error = %err,
                            "task_rejected"
                        );
                        IngressReply::Rejected {
                            reason: err.to_string(),
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(target: "ingress", error = %err, "invalid_ingress_line");
                IngressReply::Rejected {
                    reason: format!("invalid message: {err}"),
                }
            }
        };

        let encoded = encode_ingress_reply(&reply)?;
        write_half.write_all(encoded.as_bytes()).await?;
        write_half.flush().await?;
    }

    Ok(())
}

fn prepare_socket_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create {}", parent.display()))?;
    }

    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.file_type().is_socket() || metadata.is_file() {
                fs::remove_file(path)
                    .with_context(|| format!("unable to remove stale socket {}", path.display()))?;
            } else {
                bail!(
                    "socket path exists but is not removable as file/socket: {}",
                    path.display()
                );
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("unable to inspect {}", path.display()));
        }
    }

    Ok(())
}

fn cleanup_socket_path(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("unable to remove {}", path.display())),
    }
}
