//! Services offered by the signed-in professional.

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
use domain::models::service::{CreateServiceRequest, UpdateServiceRequest};
use domain::models::Service;
use persistence::repositories::{CategoryRepository, ServiceRepository};

#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    pub services: Vec<Service>,
}

async fn ensure_active_category(state: &AppState, category_id: Uuid) -> Result<(), ApiError> {
    let active = CategoryRepository::new(state.pool.clone())
        .find_by_id(category_id)
        .await?
        .is_some_and(|c| c.active);
    if !active {
        return Err(ApiError::Validation(
            "Category does not exist or is inactive".into(),
        ));
    }
    Ok(())
}

/// GET /api/v1/professionals/me/services
pub async fn list_services(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<ServicesResponse>, ApiError> {
    let professional = own_profile(&state, auth.user_id).await?;
    let services = ServiceRepository::new(state.pool.clone())
        .list_by_professional(professional.id, false)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ServicesResponse { services }))
}

/// POST /api/v1/professionals/me/services
pub async fn create_service(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    request.validate()?;
    let professional = own_profile(&state, auth.user_id).await?;
    ensure_active_category(&state, request.category_id).await?;

    let service = ServiceRepository::new(state.pool.clone())
        .create(professional.id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(service.into())))
}

/// PATCH /api/v1/professionals/me/services/:id
pub async fn update_service(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<Service>, ApiError> {
    request.validate()?;
    let professional = own_profile(&state, auth.user_id).await?;
    if let Some(category_id) = request.category_id {
        ensure_active_category(&state, category_id).await?;
    }

    let service = ServiceRepository::new(state.pool.clone())
        .update(id, professional.id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".into()))?;
    Ok(Json(service.into()))
}

/// DELETE /api/v1/professionals/me/services/:id
pub async fn delete_service(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let professional = own_profile(&state, auth.user_id).await?;
    let deleted = ServiceRepository::new(state.pool.clone())
        .delete(id, professional.id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Service not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
