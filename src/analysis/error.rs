use std::fmt;

use thiserror::Error;

use crate::analysis::types::Capability;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorKind {
    InvalidInput,
    Backend,
    Timeout,
    DataUnavailable,
    Internal,
}

/// Failure raised by a single stage implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
    pub kind: StageErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(kind: StageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StageError {}

pub fn invalid_input(message: impl Into<String>) -> StageError {
    StageError::new(StageErrorKind::InvalidInput, message)
}

pub fn backend_failure(message: impl Into<String>) -> StageError {
    StageError::new(StageErrorKind::Backend, message)
}

pub fn timed_out(message: impl Into<String>) -> StageError {
    StageError::new(StageErrorKind::Timeout, message)
}

pub fn data_unavailable(message: impl Into<String>) -> StageError {
    StageError::new(StageErrorKind::DataUnavailable, message)
}

pub fn internal_error(message: impl Into<String>) -> StageError {
    StageError::new(StageErrorKind::Internal, message)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("unknown {capability} implementation '{key}'")]
    UnknownImplementation { capability: Capability, key: String },

    #[error("{capability} implementation '{key}' is already registered")]
    DuplicateImplementation { capability: Capability, key: String },

    #[error("failed to construct {capability} implementation '{key}': {source}")]
    StageConstruction {
        capability: Capability,
        key: String,
        #[source]
        source: StageError,
    },

    #[error("{stage} stage failed: {source}")]
    StageExecution {
        stage: Capability,
        #[source]
        source: StageError,
    },
}

impl PipelineError {
    pub fn stage(stage: Capability, source: StageError) -> Self {
        Self::StageExecution { stage, source }
    }

    /// Raised while building a pipeline; such a pipeline never becomes usable.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::StageExecution { .. })
    }

    pub fn capability(&self) -> Capability {
        match self {
            Self::UnknownImplementation { capability, .. }
            | Self::DuplicateImplementation { capability, .. }
            | Self::StageConstruction { capability, .. } => *capability,
            Self::StageExecution { stage, .. } => *stage,
        }
    }
}
