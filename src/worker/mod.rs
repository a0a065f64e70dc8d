//! Asynchronous consumption path: socket ingress → bounded queue → worker →
//! status callback.

pub mod consumer;
pub mod error;
pub mod ingress;
pub mod protocol;
pub mod queue;
pub mod reporter;
pub mod types;

pub use consumer::Worker;
pub use error::{QueueError, QueueErrorKind, ReporterError, ReporterErrorKind};
pub use ingress::TaskIngress;
pub use queue::TaskQueue;
pub use reporter::{
    HttpStatusReporter, NoopStatusReporter, StatusReporterPort, reporter_from_config,
};
pub use types::{AnalysisTask, FAILURE_DETAILS, StatusResult, StatusUpdate, TaskStatus};
