//! One handler per job payload; each performs a single side effect.

use domain::models::JobPayload;
use persistence::repositories::{JobRepository, ProfessionalRepository, VerificationTokenRepository};
use sqlx::PgPool;
use tracing::{info, warn};

use super::JobError;
use crate::services::files::{check_file_size, process_image};
use crate::services::{EmailService, FileProcessingError, FileStore, SlackClient};

/// Executes a decoded job payload.
#[async_trait::async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, payload: JobPayload) -> Result<(), JobError>;
}

/// Production handler set wired to real transports and the database.
pub struct JobHandlers {
    email: EmailService,
    slack: SlackClient,
    files: FileStore,
    professionals: ProfessionalRepository,
    tokens: VerificationTokenRepository,
    jobs: JobRepository,
}

impl JobHandlers {
    pub fn new(pool: PgPool, email: EmailService, slack: SlackClient, files: FileStore) -> Self {
        Self {
            email,
            slack,
            files,
            professionals: ProfessionalRepository::new(pool.clone()),
            tokens: VerificationTokenRepository::new(pool.clone()),
            jobs: JobRepository::new(pool),
        }
    }

    async fn resize_image(
        &self,
        path: &str,
        max_dimension: u32,
        thumbnail_dimension: u32,
    ) -> Result<(), JobError> {
        let absolute = self.files.resolve(path)?;
        if !tokio::fs::try_exists(&absolute).await.unwrap_or(false) {
            // Replaced by a newer upload before the job ran.
            info!(path = %path, "Image no longer exists, skipping");
            return Ok(());
        }

        let processed = tokio::task::spawn_blocking(move || {
            process_image(&absolute, max_dimension, thumbnail_dimension)
        })
        .await
        .map_err(|e| JobError::Aborted(e.to_string()))??;

        info!(
            path = %path,
            width = processed.width,
            height = processed.height,
            "Image processed"
        );
        Ok(())
    }

    async fn enforce_file_size(
        &self,
        path: &str,
        max_bytes: u64,
        professional_id: uuid::Uuid,
    ) -> Result<(), JobError> {
        let absolute = self.files.resolve(path)?;
        match check_file_size(&absolute, max_bytes).await {
            Ok(size) => {
                info!(path = %path, size, "File size within limit");
                Ok(())
            }
            Err(FileProcessingError::TooLarge { actual, max }) => {
                warn!(path = %path, actual, max, "File exceeds limit, removing");
                self.files.remove(path).await?;
                let cleared = self
                    .professionals
                    .clear_cv_url_if_stored_at(professional_id, path)
                    .await?;
                if !cleared {
                    info!(path = %path, "CV link already points at a newer upload");
                }
                Ok(())
            }
            Err(FileProcessingError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path, "File no longer exists, skipping");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl JobHandler for JobHandlers {
    async fn handle(&self, payload: JobPayload) -> Result<(), JobError> {
        match payload {
            JobPayload::SendEmail {
                to,
                to_name,
                template,
            } => {
                self.email
                    .send_template(&to, to_name.as_deref(), &template)
                    .await?;
            }
            JobPayload::SlackAlert { text } => {
                self.slack.post(&text).await?;
            }
            JobPayload::ProcessImage {
                path,
                max_dimension,
                thumbnail_dimension,
            } => {
                self.resize_image(&path, max_dimension, thumbnail_dimension)
                    .await?;
            }
            JobPayload::CheckFileSize {
                path,
                max_bytes,
                professional_id,
            } => {
                self.enforce_file_size(&path, max_bytes, professional_id)
                    .await?;
            }
            JobPayload::PurgeExpiredTokens => {
                let removed = self.tokens.purge_expired().await?;
                info!(removed, "Purged verification tokens");
            }
            JobPayload::PruneCompletedJobs { older_than_days } => {
                let removed = self.jobs.prune_completed(older_than_days).await?;
                info!(removed, older_than_days, "Pruned completed jobs");
            }
            JobPayload::ReleaseStaleJobs { older_than_secs } => {
                let released = self.jobs.release_stale(older_than_secs).await?;
                if released > 0 {
                    warn!(released, older_than_secs, "Released stale job locks");
                }
            }
        }
        Ok(())
    }
}
