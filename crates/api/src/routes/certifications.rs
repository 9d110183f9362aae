//! Certifications submitted by the signed-in professional.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;
use crate::routes::professionals::own_profile;
use domain::models::certification::CreateCertificationRequest;
use domain::models::Certification;
use persistence::repositories::{CategoryRepository, CertificationRepository};

#[derive(Debug, Serialize)]
pub struct CertificationsResponse {
    pub certifications: Vec<Certification>,
}

/// GET /api/v1/professionals/me/certifications
pub async fn list_certifications(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<CertificationsResponse>, ApiError> {
    let professional = own_profile(&state, auth.user_id).await?;
    let certifications = CertificationRepository::new(state.pool.clone())
        .list_by_professional(professional.id, None)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(CertificationsResponse { certifications }))
}

/// Submits a certification for moderation.
///
/// POST /api/v1/professionals/me/certifications
pub async fn create_certification(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateCertificationRequest>,
) -> Result<(StatusCode, Json<Certification>), ApiError> {
    request.validate()?;
    let professional = own_profile(&state, auth.user_id).await?;

    if let Some(category_id) = request.category_id {
        CategoryRepository::new(state.pool.clone())
            .find_by_id(category_id)
            .await?
            .ok_or_else(|| ApiError::Validation("Category does not exist".into()))?;
    }

    let certification: Certification = CertificationRepository::new(state.pool.clone())
        .create(professional.id, &request)
        .await?
        .into();

    state
        .queue
        .dispatch(domain::models::JobPayload::slack(format!(
            "Nueva certificación para revisar: \"{}\" ({})",
            certification.title, certification.issuer
        )))
        .await;

    Ok((StatusCode::CREATED, Json(certification)))
}

/// Withdraws a certification that has not been reviewed yet.
///
/// DELETE /api/v1/professionals/me/certifications/:id
pub async fn delete_certification(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let professional = own_profile(&state, auth.user_id).await?;
    let repo = CertificationRepository::new(state.pool.clone());

    if repo.delete_pending(id, professional.id).await? {
        return Ok(StatusCode::NO_CONTENT);
    }

    match repo.find_by_id(id).await? {
        Some(existing) if existing.professional_id == professional.id => Err(ApiError::Conflict(
            "Only pending certifications can be withdrawn".into(),
        )),
        _ => Err(ApiError::NotFound("Certification not found".into())),
    }
}
