//! Producer side of the durable job queue.

use chrono::{DateTime, Utc};
use domain::models::JobPayload;
use persistence::repositories::JobRepository;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::middleware::metrics::record_job_enqueued;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to encode job payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to store job: {0}")]
    Database(#[from] sqlx::Error),
}

/// Inserts jobs into the `jobs` table; the worker drains them.
#[derive(Clone)]
pub struct JobQueue {
    repo: JobRepository,
    max_attempts: i32,
}

impl JobQueue {
    pub fn new(pool: PgPool, max_attempts: i32) -> Self {
        Self {
            repo: JobRepository::new(pool),
            max_attempts,
        }
    }

    /// Enqueues a job that is due immediately.
    pub async fn enqueue(&self, payload: &JobPayload) -> Result<Uuid, QueueError> {
        self.enqueue_at(payload, Utc::now()).await
    }

    pub async fn enqueue_at(
        &self,
        payload: &JobPayload,
        run_at: DateTime<Utc>,
    ) -> Result<Uuid, QueueError> {
        let queue = payload.queue();
        let value = serde_json::to_value(payload)?;
        let job = self
            .repo
            .enqueue(queue.as_str(), payload.kind(), &value, self.max_attempts, run_at)
            .await?;

        record_job_enqueued(queue.as_str());
        tracing::debug!(job_id = %job.id, queue = %queue, kind = payload.kind(), "Job enqueued");
        Ok(job.id)
    }

    /// Fire-and-forget variant for notifications that must not fail the
    /// request that triggered them.
    pub async fn dispatch(&self, payload: JobPayload) {
        if let Err(e) = self.enqueue(&payload).await {
            tracing::error!(kind = payload.kind(), error = %e, "Failed to enqueue job");
        }
    }
}
