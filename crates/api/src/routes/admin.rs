//! Admin dashboard counters and job queue controls.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::{Job, JobStats, User};
use persistence::repositories::{AdminStats, JobRepository, StatsRepository};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/jobs/stats", get(get_job_stats))
        .route("/jobs/:id/retry", post(retry_job))
}

/// GET /api/v1/admin/stats
async fn get_stats(State(state): State<AppState>) -> Result<Json<AdminStats>, ApiError> {
    let stats = StatsRepository::new(state.pool.clone()).admin_stats().await?;
    Ok(Json(stats))
}

#[derive(Debug, Serialize)]
pub struct JobStatsResponse {
    pub queues: Vec<JobStats>,
}

/// GET /api/v1/admin/jobs/stats
async fn get_job_stats(State(state): State<AppState>) -> Result<Json<JobStatsResponse>, ApiError> {
    let queues = JobRepository::new(state.pool.clone())
        .stats()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(JobStatsResponse { queues }))
}

/// Moves a dead-lettered job back to `pending`.
///
/// POST /api/v1/admin/jobs/:id/retry
async fn retry_job(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    let repo = JobRepository::new(state.pool.clone());
    let entity = match repo.retry_failed(id).await? {
        Some(entity) => entity,
        None => {
            return Err(match repo.find_by_id(id).await? {
                Some(_) => ApiError::Conflict("Only failed jobs can be retried".into()),
                None => ApiError::NotFound("Job not found".into()),
            })
        }
    };

    let job = Job::try_from(entity).map_err(ApiError::Internal)?;
    tracing::info!(admin_id = %admin.id, job_id = %id, queue = %job.queue, "Job requeued");
    Ok(Json(job))
}
