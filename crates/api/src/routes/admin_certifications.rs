//! Certification moderation.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::certification::{ListCertificationsQuery, RejectCertificationRequest};
use domain::models::professional::ProfessionalWithUser;
use domain::models::{Certification, CertificationStatus, EmailTemplate, JobPayload, User};
use persistence::repositories::{CertificationRepository, ProfessionalRepository};
use shared::pagination::{PageParams, Paginated};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_certifications))
        .route("/:id/approve", post(approve_certification))
        .route("/:id/reject", post(reject_certification))
}

/// GET /api/v1/admin/certifications?status=pending
async fn list_certifications(
    State(state): State<AppState>,
    Query(query): Query<ListCertificationsQuery>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<Certification>>, ApiError> {
    let params = params.clamped(shared::pagination::MAX_PER_PAGE);
    let (items, total) = CertificationRepository::new(state.pool.clone())
        .list_by_status(
            query.status.as_ref().map(CertificationStatus::as_str),
            params.limit(),
            params.offset(),
        )
        .await?;

    Ok(Json(Paginated::new(
        items.into_iter().map(Into::into).collect(),
        params,
        total,
    )))
}

/// Only pending certifications can be reviewed; anything else is 409.
async fn review(
    state: &AppState,
    admin: &User,
    id: Uuid,
    status: CertificationStatus,
    reason: Option<&str>,
) -> Result<Certification, ApiError> {
    let repo = CertificationRepository::new(state.pool.clone());
    let reviewed: Certification = match repo.review(id, status.as_str(), reason, admin.id).await? {
        Some(entity) => entity.into(),
        None => {
            return Err(match repo.find_by_id(id).await? {
                Some(_) => ApiError::Conflict("Certification was already reviewed".into()),
                None => ApiError::NotFound("Certification not found".into()),
            })
        }
    };

    let owner: Option<ProfessionalWithUser> = ProfessionalRepository::new(state.pool.clone())
        .find_with_user(reviewed.professional_id)
        .await?
        .map(Into::into);

    if let Some(owner) = owner {
        state
            .queue
            .dispatch(JobPayload::email(
                owner.email,
                Some(owner.name),
                EmailTemplate::CertificationReviewed {
                    title: reviewed.title.clone(),
                    approved: status == CertificationStatus::Approved,
                    reason: reason.map(str::to_string),
                },
            ))
            .await;
    }

    tracing::info!(
        admin_id = %admin.id,
        certification_id = %id,
        status = status.as_str(),
        "Certification reviewed"
    );
    Ok(reviewed)
}

/// POST /api/v1/admin/certifications/:id/approve
async fn approve_certification(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Certification>, ApiError> {
    let certification = review(&state, &admin, id, CertificationStatus::Approved, None).await?;
    Ok(Json(certification))
}

/// POST /api/v1/admin/certifications/:id/reject
async fn reject_certification(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectCertificationRequest>,
) -> Result<Json<Certification>, ApiError> {
    request.validate()?;
    let certification = review(
        &state,
        &admin,
        id,
        CertificationStatus::Rejected,
        Some(request.reason.trim()),
    )
    .await?;
    Ok(Json(certification))
}
