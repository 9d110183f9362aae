//! Periodic tasks registered with the scheduler.
//!
//! Maintenance work goes through the `maintenance` queue rather than running
//! inline, so it is retried and shows up in the job stats like any other job.

use domain::models::JobPayload;
use sqlx::PgPool;

use super::scheduler::{JobFrequency, ScheduledJob};
use crate::config::QueueConfig;
use crate::services::JobQueue;

/// Enqueues a fixed maintenance payload on every tick.
pub struct MaintenanceTask {
    name: &'static str,
    frequency: JobFrequency,
    payload: JobPayload,
    queue: JobQueue,
}

impl MaintenanceTask {
    pub fn new(
        name: &'static str,
        frequency: JobFrequency,
        payload: JobPayload,
        queue: JobQueue,
    ) -> Self {
        Self {
            name,
            frequency,
            payload,
            queue,
        }
    }

    /// Token purge (hourly), completed-job pruning (daily) and stale lock
    /// release (every minute).
    pub fn defaults(config: &QueueConfig, queue: &JobQueue) -> Vec<Self> {
        vec![
            Self::new(
                "purge_expired_tokens",
                JobFrequency::Hourly,
                JobPayload::PurgeExpiredTokens,
                queue.clone(),
            ),
            Self::new(
                "prune_completed_jobs",
                JobFrequency::Daily,
                JobPayload::PruneCompletedJobs {
                    older_than_days: config.completed_retention_days,
                },
                queue.clone(),
            ),
            Self::new(
                "release_stale_jobs",
                JobFrequency::Minutes(1),
                JobPayload::ReleaseStaleJobs {
                    older_than_secs: config.stale_lock_secs,
                },
                queue.clone(),
            ),
        ]
    }

    pub fn payload(&self) -> &JobPayload {
        &self.payload
    }
}

#[async_trait::async_trait]
impl ScheduledJob for MaintenanceTask {
    fn name(&self) -> &'static str {
        self.name
    }

    fn frequency(&self) -> JobFrequency {
        self.frequency
    }

    async fn execute(&self) -> Result<(), String> {
        self.queue
            .enqueue(&self.payload)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Publishes connection pool gauges.
pub struct PoolMetricsTask {
    pool: PgPool,
}

impl PoolMetricsTask {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ScheduledJob for PoolMetricsTask {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(15)
    }

    async fn execute(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool);
        Ok(())
    }
}
