use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;

/// A unit of queued work: one piece of feedback text to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTask {
    pub task_id: String,
    pub text_content: String,
}

impl AnalysisTask {
    pub fn new(task_id: impl Into<String>, text_content: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            text_content: text_content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Processing,
    Completed,
    Failed,
}

pub const FAILURE_DETAILS: &str = "Worker processing failed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusResult {
    Completed { analysis_output: AnalysisResult },
    Failed { error: String, details: String },
}

/// Body POSTed to the status callback. `result` is `null` while processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub task_id: String,
    pub status: TaskStatus,
    pub result: Option<StatusResult>,
}

impl StatusUpdate {
    pub fn processing(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Processing,
            result: None,
        }
    }

    pub fn completed(task_id: impl Into<String>, analysis_output: AnalysisResult) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Completed,
            result: Some(StatusResult::Completed { analysis_output }),
        }
    }

    pub fn failed(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed,
            result: Some(StatusResult::Failed {
                error: error.into(),
                details: FAILURE_DETAILS.to_string(),
            }),
        }
    }
}
