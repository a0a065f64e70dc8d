use std::{env, path::PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines},
    net::{UnixStream, unix::OwnedReadHalf},
};
use uuid::Uuid;

const USAGE: &str =
    "usage: insight-flow-cli --socket-path <path> [--task-id <id>] [feedback text...]";

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    socket_path: PathBuf,
    task_id: Option<String>,
    text: Option<String>,
}

fn cli_options_from_args() -> Result<CliOptions> {
    parse_cli_options(env::args().skip(1))
}

fn parse_cli_options<I>(mut args: I) -> Result<CliOptions>
where
    I: Iterator<Item = String>,
{
    let mut socket_path = None;
    let mut task_id = None;
    let mut words = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--socket-path" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --socket-path"))?;
                socket_path = Some(PathBuf::from(value));
            }
            "--task-id" => {
                let value = args
                    .next()
                    .ok_or_else(|| anyhow!("missing value for --task-id"))?;
                if value.trim().is_empty() {
                    bail!("task id cannot be empty");
                }
                task_id = Some(value);
            }
            flag if flag.starts_with("--") => {
                bail!("unknown argument: {flag}. {USAGE}");
            }
            word => words.push(word.to_string()),
        }
    }

    let socket_path =
        socket_path.ok_or_else(|| anyhow!("missing required argument --socket-path. {USAGE}"))?;
    let text = (!words.is_empty()).then(|| words.join(" "));
    if task_id.is_some() && text.is_none() {
        bail!("--task-id needs feedback text on the command line");
    }

    Ok(CliOptions {
        socket_path,
        task_id,
        text,
    })
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaskMessage<'a> {
    Task {
        task_id: String,
        text_content: &'a str,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IngressReply {
    Accepted { task_id: String },
    Rejected { reason: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = cli_options_from_args()?;
    let stream = UnixStream::connect(&options.socket_path)
        .await
        .with_context(|| {
            format!(
                "failed to connect to InsightFlow socket {}",
                options.socket_path.display()
            )
        })?;
    let (read_half, mut write_half) = stream.into_split();
    let mut replies = BufReader::new(read_half).lines();

    if let Some(text) = &options.text {
        let task_id = options.task_id.clone().unwrap_or_else(new_task_id);
        return submit(&mut write_half, &mut replies, task_id, text).await;
    }

    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut rejected = 0usize;
    while let Some(line) = stdin_lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if let Err(err) = submit(&mut write_half, &mut replies, new_task_id(), text).await {
            eprintln!("[error] {err:#}");
            rejected += 1;
        }
    }

    if rejected > 0 {
        bail!("{rejected} task(s) were rejected");
    }
    Ok(())
}

async fn submit<W>(
    writer: &mut W,
    replies: &mut Lines<BufReader<OwnedReadHalf>>,
    task_id: String,
    text: &str,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let message = TaskMessage::Task {
        task_id,
        text_content: text,
    };
    let encoded = serde_json::to_string(&message)?;
    writer.write_all(encoded.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    let line = replies
        .next_line()
        .await?
        .ok_or_else(|| anyhow!("socket closed before the task was acknowledged"))?;
    let reply: IngressReply =
        serde_json::from_str(line.trim()).context("failed to decode ingress reply")?;
    match reply {
        IngressReply::Accepted { task_id } => {
            println!("{task_id}");
            Ok(())
        }
        IngressReply::Rejected { reason } => Err(anyhow!("task rejected: {reason}")),
    }
}

fn new_task_id() -> String {
    Uuid::now_v7().to_string()
}
