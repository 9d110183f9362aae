//! Weekly schedule of the signed-in professional.

use axum::{extract::State, Json};
use serde::Serialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;
use crate::routes::professionals::own_profile;
use domain::models::schedule::{validate_slots, ReplaceScheduleRequest};
use domain::models::ScheduleSlot;
use persistence::repositories::ScheduleRepository;

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub slots: Vec<ScheduleSlot>,
}

/// GET /api/v1/professionals/me/schedule
pub async fn get_schedule(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let professional = own_profile(&state, auth.user_id).await?;
    let slots = ScheduleRepository::new(state.pool.clone())
        .list(professional.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ScheduleResponse { slots }))
}

/// Replaces every slot in one transaction.
///
/// PUT /api/v1/professionals/me/schedule
pub async fn replace_schedule(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<ReplaceScheduleRequest>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    request.validate()?;
    let slots = validate_slots(&request.slots)?;

    let professional = own_profile(&state, auth.user_id).await?;
    let stored = ScheduleRepository::new(state.pool.clone())
        .replace(professional.id, &slots)
        .await?;

    tracing::debug!(professional_id = %professional.id, slots = stored.len(), "Schedule replaced");
    Ok(Json(ScheduleResponse {
        slots: stored.into_iter().map(Into::into).collect(),
    }))
}
