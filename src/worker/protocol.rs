//! Newline-delimited JSON spoken on the task ingress socket.
//!
//! Client → worker: `{"type":"task","task_id":"..","text_content":".."}` (`task_id`
//! optional). Worker → client: one `accepted` or `rejected` line per task line.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::worker::types::AnalysisTask;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressMessage {
    Task(AnalysisTask),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
enum WireMessage {
    Task {
        #[serde(default)]
        task_id: Option<String>,
        text_content: String,
    },
}

pub fn parse_ingress_line(line: &str) -> Result<IngressMessage, serde_json::Error> {
    let wire: WireMessage = serde_json::from_str(line)?;
    let message = match wire {
        WireMessage::Task {
            task_id,
            text_content,
        } => IngressMessage::Task(AnalysisTask {
            task_id: task_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(generate_task_id),
            text_content,
        }),
    };
    Ok(message)
}

pub fn generate_task_id() -> String {
    Uuid::now_v7().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngressReply {
    Accepted { task_id: String },
    Rejected { reason: String },
}

pub fn encode_ingress_reply(reply: &IngressReply) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_string(reply)?;
    Ok(format!("{encoded}\n"))
}
