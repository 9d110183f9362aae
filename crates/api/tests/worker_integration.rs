//! Queue consumer behaviour against a real database: completion, retries
//! with backoff, dead-lettering and failure forwarding.

mod common;

use std::sync::Arc;
use std::time::Duration;

use ceres_api::config::{EmailConfig, QueueConfig, SlackConfig, StorageConfig};
use ceres_api::jobs::{JobError, JobHandler, JobHandlers, Worker};
use ceres_api::services::{EmailError, EmailService, FileStore, JobQueue, SlackClient};
use common::{count_jobs, create_professional, test_pool, unique_suffix};
use domain::models::{EmailTemplate, JobPayload};
use persistence::repositories::JobRepository;
use sqlx::PgPool;
use tokio::sync::watch;
use uuid::Uuid;

/// Fails every email addressed to a `falla+` mailbox; everything else succeeds.
struct ScriptedHandler;

#[async_trait::async_trait]
impl JobHandler for ScriptedHandler {
    async fn handle(&self, payload: JobPayload) -> Result<(), JobError> {
        match payload {
            JobPayload::SendEmail { to, .. } if to.starts_with("falla+") => {
                Err(EmailError::SendFailed("relay unavailable".into()).into())
            }
            _ => Ok(()),
        }
    }
}

fn fast_config() -> QueueConfig {
    QueueConfig {
        poll_interval_ms: 50,
        max_attempts: 2,
        backoff_base_secs: 0,
        backoff_max_secs: 0,
        shutdown_timeout_secs: 5,
        ..QueueConfig::default()
    }
}

async fn wait_for_status(pool: &PgPool, id: Uuid, status: &str) -> bool {
    let repo = JobRepository::new(pool.clone());
    for _ in 0..100 {
        if let Some(job) = repo.find_by_id(id).await.unwrap() {
            if job.status == status {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_worker_processes_retries_and_dead_letters() {
    let Some(pool) = test_pool().await else { return };
    let config = fast_config();
    let queue = JobQueue::new(pool.clone(), config.max_attempts);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = Worker::new(pool.clone(), Arc::new(ScriptedHandler), config).start(shutdown_rx);

    let ok_id = queue
        .enqueue(&JobPayload::slack(format!("aviso {}", unique_suffix())))
        .await
        .unwrap();
    let failing_email = format!("falla+{}@ceresenred.test", unique_suffix());
    let failing_id = queue
        .enqueue(&JobPayload::email(
            failing_email.clone(),
            None,
            EmailTemplate::ProfessionalVerified,
        ))
        .await
        .unwrap();

    assert!(wait_for_status(&pool, ok_id, "completed").await);
    assert!(wait_for_status(&pool, failing_id, "failed").await);

    let failed = JobRepository::new(pool.clone())
        .find_by_id(failing_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.attempts, 2);
    assert!(failed.last_error.unwrap().contains("relay unavailable"));

    // The dead-lettered email is reported on the Slack queue.
    assert_eq!(count_jobs(&pool, "slack_alert", &failing_id.to_string()).await, 1);

    shutdown_tx.send(true).unwrap();
    for handle in handles {
        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("consumer did not stop")
            .unwrap();
    }
}

#[tokio::test]
async fn test_undecodable_payload_is_dead_lettered_at_once() {
    let Some(pool) = test_pool().await else { return };
    let config = fast_config();

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO jobs (queue, kind, payload, max_attempts)
        VALUES ('maintenance', 'mystery', '{"kind": "mystery"}', 5)
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = Worker::new(pool.clone(), Arc::new(ScriptedHandler), config).start(shutdown_rx);

    assert!(wait_for_status(&pool, id, "failed").await);
    let job = JobRepository::new(pool.clone())
        .find_by_id(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.attempts, 1);

    shutdown_tx.send(true).unwrap();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn test_stale_running_jobs_are_released() {
    let Some(pool) = test_pool().await else { return };

    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO jobs (queue, kind, payload, status, attempts, locked_at, run_at)
        VALUES ('maintenance', 'purge_expired_tokens', '{"kind": "purge_expired_tokens"}',
                'running', 1, NOW() - INTERVAL '2 hours', NOW() + INTERVAL '1 day')
        RETURNING id
        "#,
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let released = JobRepository::new(pool.clone())
        .release_stale(600)
        .await
        .unwrap();
    assert!(released >= 1);

    let job = JobRepository::new(pool.clone())
        .find_by_id(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, "pending");
    assert!(job.locked_at.is_none());
}

fn handlers_with_uploads(pool: &PgPool, upload_dir: &std::path::Path) -> JobHandlers {
    JobHandlers::new(
        pool.clone(),
        EmailService::new(EmailConfig::default()).unwrap(),
        SlackClient::new(&SlackConfig::default()).unwrap(),
        FileStore::new(&StorageConfig {
            upload_dir: upload_dir.to_path_buf(),
            ..StorageConfig::default()
        }),
    )
}

async fn cv_url(pool: &PgPool, professional_id: Uuid) -> Option<String> {
    sqlx::query_scalar("SELECT cv_url FROM professionals WHERE id = $1")
        .bind(professional_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_oversized_cv_only_clears_its_own_link() {
    let Some(pool) = test_pool().await else { return };
    let app = common::app_with(&pool);
    let (_, profile) = create_professional(&app, "Hugo Curriculum", "Ceres").await;
    let professional_id: Uuid = profile["id"].as_str().unwrap().parse().unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let handlers = handlers_with_uploads(&pool, dir.path());
    let old_path = format!("professionals/{professional_id}/cv-viejo.pdf");
    let new_path = format!("professionals/{professional_id}/cv-nuevo.pdf");
    std::fs::create_dir_all(dir.path().join(format!("professionals/{professional_id}"))).unwrap();

    // A newer CV replaced the oversized one before the check ran.
    std::fs::write(dir.path().join(&old_path), vec![b'x'; 512]).unwrap();
    let newer_url = format!("https://ceresenred.test/uploads/{new_path}");
    sqlx::query("UPDATE professionals SET cv_url = $2 WHERE id = $1")
        .bind(professional_id)
        .bind(&newer_url)
        .execute(&pool)
        .await
        .unwrap();

    handlers
        .handle(JobPayload::CheckFileSize {
            path: old_path.clone(),
            max_bytes: 100,
            professional_id,
        })
        .await
        .unwrap();
    assert!(!dir.path().join(&old_path).exists());
    assert_eq!(cv_url(&pool, professional_id).await, Some(newer_url));

    // The oversized file is still the current CV.
    std::fs::write(dir.path().join(&new_path), vec![b'x'; 512]).unwrap();
    handlers
        .handle(JobPayload::CheckFileSize {
            path: new_path.clone(),
            max_bytes: 100,
            professional_id,
        })
        .await
        .unwrap();
    assert!(!dir.path().join(&new_path).exists());
    assert_eq!(cv_url(&pool, professional_id).await, None);
}
