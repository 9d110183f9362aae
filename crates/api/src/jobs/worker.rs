//! Queue consumers.
//!
//! Every queue gets its own loop and a semaphore sized to its configured
//! concurrency. A loop only claims as many jobs as it has free permits, so a
//! claimed job never waits for a slot while its lock ages.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use domain::models::job::backoff_secs;
use domain::models::{Job, JobPayload, Queue};
use persistence::entities::JobEntity;
use persistence::repositories::JobRepository;
use sqlx::PgPool;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::handlers::JobHandler;
use super::JobError;
use crate::config::QueueConfig;
use crate::middleware::metrics::record_job_processed;
use crate::services::JobQueue;

/// What happens to a job after one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Retry { run_at: DateTime<Utc> },
    Failed,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Retry { .. } => "retried",
            Outcome::Failed => "failed",
        }
    }
}

/// Decides between another attempt and the dead-letter state for a job whose
/// handler just failed.
pub fn failure_outcome(
    job: &Job,
    error: &JobError,
    config: &QueueConfig,
    now: DateTime<Utc>,
) -> Outcome {
    if error.is_permanent() || job.is_exhausted() {
        return Outcome::Failed;
    }
    let delay = backoff_secs(job.attempts, config.backoff_base_secs, config.backoff_max_secs);
    Outcome::Retry {
        run_at: now + chrono::Duration::seconds(delay as i64),
    }
}

pub struct Worker {
    jobs: JobRepository,
    queue: JobQueue,
    handler: Arc<dyn JobHandler>,
    config: QueueConfig,
}

impl Worker {
    pub fn new(pool: PgPool, handler: Arc<dyn JobHandler>, config: QueueConfig) -> Self {
        Self {
            jobs: JobRepository::new(pool.clone()),
            queue: JobQueue::new(pool, config.max_attempts),
            handler,
            config,
        }
    }

    /// Spawns one consumer per queue. Each handle resolves once shutdown was
    /// signalled and that queue's in-flight jobs have drained (or the
    /// shutdown timeout elapsed).
    pub fn start(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let worker = Arc::new(self);
        Queue::ALL
            .into_iter()
            .map(|queue| tokio::spawn(Arc::clone(&worker).consume(queue, shutdown.clone())))
            .collect()
    }

    async fn consume(self: Arc<Self>, queue: Queue, mut shutdown: watch::Receiver<bool>) {
        let concurrency = self.config.concurrency(queue);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let poll_interval = self.config.poll_interval();

        info!(queue = %queue, concurrency, "Consumer started");

        while !*shutdown.borrow() {
            let available = semaphore.available_permits();
            if available == 0 {
                tokio::select! {
                    permit = semaphore.acquire() => drop(permit),
                    res = shutdown.changed() => if res.is_err() { break },
                }
                continue;
            }

            let claimed = match self.jobs.claim(queue.as_str(), available as i64).await {
                Ok(entities) => entities,
                Err(e) => {
                    error!(queue = %queue, error = %e, "Failed to claim jobs");
                    Vec::new()
                }
            };
            let count = claimed.len();

            for entity in claimed {
                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                let worker = Arc::clone(&self);
                tokio::spawn(async move {
                    worker.process(entity).await;
                    drop(permit);
                });
            }

            if count < available {
                tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => {}
                    res = shutdown.changed() => if res.is_err() { break },
                }
            }
        }

        let timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
        let drained = tokio::time::timeout(timeout, semaphore.acquire_many(concurrency as u32)).await;
        match drained {
            Ok(_) => info!(queue = %queue, "Consumer stopped"),
            Err(_) => warn!(
                queue = %queue,
                in_flight = concurrency - semaphore.available_permits(),
                "Shutdown timed out; unfinished jobs will be released as stale"
            ),
        }
    }

    async fn process(&self, entity: JobEntity) {
        let id = entity.id;
        let job = match Job::try_from(entity) {
            Ok(job) => job,
            Err(e) => {
                error!(job_id = %id, error = %e, "Unreadable job row");
                if let Err(e) = self.jobs.mark_failed(id, &e).await {
                    error!(job_id = %id, error = %e, "Failed to dead-letter job");
                }
                return;
            }
        };

        let started = Instant::now();
        let result = match job.decode() {
            Ok(payload) => self.handler.handle(payload).await,
            Err(e) => Err(JobError::from(e)),
        };
        let elapsed_ms = started.elapsed().as_millis();

        let (outcome, persisted) = match result {
            Ok(()) => {
                debug!(job_id = %job.id, kind = %job.kind, elapsed_ms, "Job completed");
                (Outcome::Completed, self.jobs.complete(job.id).await)
            }
            Err(err) => {
                let message = err.to_string();
                match failure_outcome(&job, &err, &self.config, Utc::now()) {
                    Outcome::Retry { run_at } => {
                        warn!(
                            job_id = %job.id,
                            kind = %job.kind,
                            attempt = job.attempts,
                            retry_at = %run_at,
                            error = %message,
                            "Job failed, retrying"
                        );
                        (
                            Outcome::Retry { run_at },
                            self.jobs.schedule_retry(job.id, &message, run_at).await,
                        )
                    }
                    outcome => {
                        error!(
                            job_id = %job.id,
                            kind = %job.kind,
                            attempt = job.attempts,
                            error = %message,
                            "Job failed permanently"
                        );
                        let persisted = self.jobs.mark_failed(job.id, &message).await;
                        self.forward_failure(&job, &message).await;
                        (outcome, persisted)
                    }
                }
            }
        };

        if let Err(e) = persisted {
            error!(job_id = %job.id, error = %e, "Failed to record job outcome");
        }
        record_job_processed(job.queue.as_str(), outcome.label());
    }

    /// Reports a dead-lettered job on the Slack queue. Slack jobs are not
    /// forwarded to themselves.
    async fn forward_failure(&self, job: &Job, message: &str) {
        if job.queue == Queue::Slack {
            return;
        }
        let text = failure_alert(job, message);
        self.queue.dispatch(JobPayload::slack(text)).await;
    }
}

fn failure_alert(job: &Job, message: &str) -> String {
    format!(
        "Falló el trabajo {} ({}) en la cola {} tras {} intento(s): {}",
        job.kind, job.id, job.queue, job.attempts, message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{EmailError, FileProcessingError};
    use domain::models::JobStatus;
    use uuid::Uuid;

    fn job(attempts: i32, max_attempts: i32) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            queue: Queue::Email,
            kind: "send_email".into(),
            payload: serde_json::json!({}),
            status: JobStatus::Running,
            attempts,
            max_attempts,
            run_at: now,
            locked_at: Some(now),
            last_error: None,
            created_at: now,
            completed_at: None,
        }
    }

    fn transient() -> JobError {
        JobError::Email(EmailError::SendFailed("connection reset".into()))
    }

    #[test]
    fn test_transient_error_is_retried_with_backoff() {
        let config = QueueConfig::default();
        let now = Utc::now();

        let first = failure_outcome(&job(1, 5), &transient(), &config, now);
        assert_eq!(
            first,
            Outcome::Retry {
                run_at: now + chrono::Duration::seconds(config.backoff_base_secs as i64)
            }
        );

        let third = failure_outcome(&job(3, 5), &transient(), &config, now);
        assert_eq!(
            third,
            Outcome::Retry {
                run_at: now + chrono::Duration::seconds(4 * config.backoff_base_secs as i64)
            }
        );
    }

    #[test]
    fn test_exhausted_job_is_dead_lettered() {
        let config = QueueConfig::default();
        let outcome = failure_outcome(&job(5, 5), &transient(), &config, Utc::now());
        assert_eq!(outcome, Outcome::Failed);
    }

    #[test]
    fn test_permanent_error_skips_retries() {
        let config = QueueConfig::default();
        let error = JobError::File(FileProcessingError::InvalidPath("/etc/passwd".into()));
        let outcome = failure_outcome(&job(1, 5), &error, &config, Utc::now());
        assert_eq!(outcome, Outcome::Failed);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Completed.label(), "completed");
        assert_eq!(
            Outcome::Retry {
                run_at: Utc::now()
            }
            .label(),
            "retried"
        );
        assert_eq!(Outcome::Failed.label(), "failed");
    }

    #[test]
    fn test_failure_alert_names_job() {
        let job = job(5, 5);
        let text = failure_alert(&job, "smtp down");
        assert!(text.contains("send_email"));
        assert!(text.contains(&job.id.to_string()));
        assert!(text.contains("email"));
        assert!(text.ends_with("smtp down"));
    }
}
