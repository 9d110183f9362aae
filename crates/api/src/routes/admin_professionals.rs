//! Professional verification queue.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::professional::{
    ListProfessionalsQuery, ProfessionalWithUser, RejectProfessionalRequest,
};
use domain::models::{EmailTemplate, JobPayload, Professional, ProfessionalStatus, User};
use persistence::repositories::ProfessionalRepository;
use shared::pagination::{PageParams, Paginated};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_professionals))
        .route("/:id/verify", post(verify_professional))
        .route("/:id/reject", post(reject_professional))
}

/// GET /api/v1/admin/professionals?status=pending
async fn list_professionals(
    State(state): State<AppState>,
    Query(query): Query<ListProfessionalsQuery>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<ProfessionalWithUser>>, ApiError> {
    let params = params.clamped(shared::pagination::MAX_PER_PAGE);
    let (items, total) = ProfessionalRepository::new(state.pool.clone())
        .list_with_user(
            query.status.as_ref().map(ProfessionalStatus::as_str),
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

async fn set_status(
    state: &AppState,
    id: Uuid,
    status: ProfessionalStatus,
    reason: Option<&str>,
    template: EmailTemplate,
) -> Result<Professional, ApiError> {
    let repo = ProfessionalRepository::new(state.pool.clone());
    let owner: ProfessionalWithUser = repo
        .find_with_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?
        .into();

    let updated: Professional = repo
        .set_status(id, status.as_str(), reason)
        .await?
        .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?
        .into();

    state
        .queue
        .dispatch(JobPayload::email(owner.email, Some(owner.name), template))
        .await;

    Ok(updated)
}

/// POST /api/v1/admin/professionals/:id/verify
async fn verify_professional(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Professional>, ApiError> {
    let professional = set_status(
        &state,
        id,
        ProfessionalStatus::Verified,
        None,
        EmailTemplate::ProfessionalVerified,
    )
    .await?;

    tracing::info!(admin_id = %admin.id, professional_id = %id, "Professional verified");
    Ok(Json(professional))
}

/// POST /api/v1/admin/professionals/:id/reject
async fn reject_professional(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectProfessionalRequest>,
) -> Result<Json<Professional>, ApiError> {
    request.validate()?;
    let reason = request.reason.trim();

    let professional = set_status(
        &state,
        id,
        ProfessionalStatus::Rejected,
        Some(reason),
        EmailTemplate::ProfessionalRejected {
            reason: reason.to_string(),
        },
    )
    .await?;

    tracing::info!(admin_id = %admin.id, professional_id = %id, "Professional rejected");
    Ok(Json(professional))
}
