//! Job queue entities (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{JobStatus, Queue};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the jobs table.
#[derive(Debug, Clone, FromRow)]
pub struct JobEntity {
    pub id: Uuid,
    pub queue: String,
    pub kind: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub run_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobEntity> for domain::models::Job {
    type Error = String;

    fn try_from(entity: JobEntity) -> Result<Self, Self::Error> {
        let queue =
            Queue::parse(&entity.queue).ok_or_else(|| format!("unknown queue '{}'", entity.queue))?;
        let status = JobStatus::parse(&entity.status)
            .ok_or_else(|| format!("unknown job status '{}'", entity.status))?;
        Ok(Self {
            id: entity.id,
            queue,
            kind: entity.kind,
            payload: entity.payload,
            status,
            attempts: entity.attempts,
            max_attempts: entity.max_attempts,
            run_at: entity.run_at,
            locked_at: entity.locked_at,
            last_error: entity.last_error,
            created_at: entity.created_at,
            completed_at: entity.completed_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct JobStatsEntity {
    pub queue: String,
    pub status: String,
    pub count: i64,
}

impl From<JobStatsEntity> for domain::models::JobStats {
    fn from(entity: JobStatsEntity) -> Self {
        Self {
            queue: entity.queue,
            status: entity.status,
            count: entity.count,
        }
    }
}
