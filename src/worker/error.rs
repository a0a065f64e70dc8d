use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueErrorKind {
    Closed,
    Full,
    ReceiverDropped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueError {
    pub kind: QueueErrorKind,
    pub message: String,
}

impl QueueError {
    pub(crate) fn closed() -> Self {
        Self {
            kind: QueueErrorKind::Closed,
            message: "task queue gate is closed".to_string(),
        }
    }

    pub(crate) fn full() -> Self {
        Self {
            kind: QueueErrorKind::Full,
            message: "task queue is full".to_string(),
        }
    }

    pub(crate) fn receiver_dropped() -> Self {
        Self {
            kind: QueueErrorKind::ReceiverDropped,
            message: "task queue receiver is closed".to_string(),
        }
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for QueueError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReporterErrorKind {
    Transport,
    Timeout,
    Rejected,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterError {
    pub kind: ReporterErrorKind,
    pub message: String,
}

impl ReporterError {
    pub fn new(kind: ReporterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ReporterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ReporterError {}
