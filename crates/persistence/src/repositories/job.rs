//! Durable job queue backed by the `jobs` table.
//!
//! Workers claim jobs with `FOR UPDATE SKIP LOCKED`, so several worker
//! processes can drain the same queue without handing out a job twice.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{JobEntity, JobStatsEntity};
use crate::metrics::QueryTimer;

const JOB_COLUMNS: &str = "id, queue, kind, payload, status, attempts, max_attempts, run_at, \
                           locked_at, last_error, created_at, completed_at";

#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(
        &self,
        queue: &str,
        kind: &str,
        payload: &serde_json::Value,
        max_attempts: i32,
        run_at: DateTime<Utc>,
    ) -> Result<JobEntity, sqlx::Error> {
        let timer = QueryTimer::new("enqueue_job");
        let result = sqlx::query_as::<_, JobEntity>(&format!(
            r#"
            INSERT INTO jobs (queue, kind, payload, max_attempts, run_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(queue)
        .bind(kind)
        .bind(payload)
        .bind(max_attempts)
        .bind(run_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Claims up to `limit` due jobs of a queue, marking them running and
    /// counting the attempt.
    pub async fn claim(&self, queue: &str, limit: i64) -> Result<Vec<JobEntity>, sqlx::Error> {
        let timer = QueryTimer::new("claim_jobs");
        let result = sqlx::query_as::<_, JobEntity>(&format!(
            r#"
            UPDATE jobs
            SET status = 'running', locked_at = NOW(), attempts = attempts + 1
            WHERE id IN (
                SELECT id FROM jobs
                WHERE queue = $1 AND status = 'pending' AND run_at <= NOW()
                ORDER BY run_at, created_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(queue)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn complete(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("complete_job");
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed', completed_at = NOW(), locked_at = NULL, last_error = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(())
    }

    /// Returns a failed attempt to the queue for another try at `run_at`.
    pub async fn schedule_retry(
        &self,
        id: Uuid,
        error: &str,
        run_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("schedule_job_retry");
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'pending', locked_at = NULL, last_error = $2, run_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(run_at)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(())
    }

    /// Dead-letters a job whose attempts are exhausted.
    pub async fn mark_failed(&self, id: Uuid, error: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("fail_job");
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'failed', locked_at = NULL, last_error = $2, completed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(())
    }

    /// Returns jobs stuck in `running` longer than the given age to `pending`.
    pub async fn release_stale(&self, older_than_secs: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("release_stale_jobs");
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'pending', locked_at = NULL
            WHERE status = 'running'
              AND locked_at < NOW() - make_interval(secs => $1::float8)
            "#,
        )
        .bind(older_than_secs)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Deletes completed jobs older than the retention window.
    pub async fn prune_completed(&self, older_than_days: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("prune_completed_jobs");
        let result = sqlx::query(
            r#"
            DELETE FROM jobs
            WHERE status = 'completed'
              AND completed_at < NOW() - make_interval(days => $1::int)
            "#,
        )
        .bind(older_than_days)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<JobEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_job");
        let result = sqlx::query_as::<_, JobEntity>(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Puts a dead-lettered job back into its queue with a fresh attempt budget.
    pub async fn retry_failed(&self, id: Uuid) -> Result<Option<JobEntity>, sqlx::Error> {
        let timer = QueryTimer::new("retry_failed_job");
        let result = sqlx::query_as::<_, JobEntity>(&format!(
            r#"
            UPDATE jobs
            SET status = 'pending', attempts = 0, run_at = NOW(), completed_at = NULL
            WHERE id = $1 AND status = 'failed'
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn stats(&self) -> Result<Vec<JobStatsEntity>, sqlx::Error> {
        let timer = QueryTimer::new("job_stats");
        let result = sqlx::query_as::<_, JobStatsEntity>(
            r#"
            SELECT queue, status, COUNT(*) AS count
            FROM jobs
            GROUP BY queue, status
            ORDER BY queue, status
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
