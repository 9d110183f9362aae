//! Background processing: queue consumers, job handlers and the periodic
//! scheduler that enqueues maintenance work.

mod handlers;
mod maintenance;
mod scheduler;
mod worker;

use thiserror::Error;

use crate::services::{EmailError, FileProcessingError, QueueError, SlackError};

pub use handlers::{JobHandler, JobHandlers};
pub use maintenance::{MaintenanceTask, PoolMetricsTask};
pub use scheduler::{JobFrequency, JobScheduler, ScheduledJob};
pub use worker::{failure_outcome, Outcome, Worker};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid job payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Email delivery failed: {0}")]
    Email(#[from] EmailError),

    #[error("Slack delivery failed: {0}")]
    Slack(#[from] SlackError),

    #[error("File processing failed: {0}")]
    File(#[from] FileProcessingError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Enqueue failed: {0}")]
    Queue(#[from] QueueError),

    #[error("Job task aborted: {0}")]
    Aborted(String),
}

impl JobError {
    /// Errors that no retry can fix; the job is dead-lettered at once.
    pub fn is_permanent(&self) -> bool {
        match self {
            JobError::Payload(_) => true,
            JobError::Email(e) => matches!(
                e,
                EmailError::InvalidAddress(_) | EmailError::Build(_) | EmailError::NotConfigured(_)
            ),
            JobError::File(e) => matches!(
                e,
                FileProcessingError::InvalidPath(_)
                    | FileProcessingError::UnsupportedType(_)
                    | FileProcessingError::Empty
                    | FileProcessingError::Image(_)
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_errors() {
        let payload_err = serde_json::from_str::<u32>("x").unwrap_err();
        assert!(JobError::Payload(payload_err).is_permanent());
        assert!(JobError::File(FileProcessingError::InvalidPath("../x".into())).is_permanent());
        assert!(JobError::Email(EmailError::InvalidAddress("nope".into())).is_permanent());
    }

    #[test]
    fn test_transient_errors() {
        assert!(!JobError::Email(EmailError::SendFailed("timeout".into())).is_permanent());
        assert!(!JobError::Database(sqlx::Error::PoolTimedOut).is_permanent());
        assert!(!JobError::Slack(SlackError::Rejected {
            status: 500,
            body: String::new()
        })
        .is_permanent());
    }
}
