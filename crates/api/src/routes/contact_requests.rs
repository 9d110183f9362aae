//! Contact request inbox of the signed-in professional.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;
use crate::routes::professionals::own_profile;
use domain::models::contact_request::UpdateContactStatusRequest;
use domain::models::{ContactRequest, ContactStatus};
use persistence::repositories::ContactRequestRepository;
use shared::pagination::{PageParams, Paginated};

#[derive(Debug, Deserialize)]
pub struct ContactStatusFilter {
    pub status: Option<ContactStatus>,
}

/// GET /api/v1/professionals/me/contact-requests
pub async fn list_contact_requests(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(filter): Query<ContactStatusFilter>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<ContactRequest>>, ApiError> {
    let professional = own_profile(&state, auth.user_id).await?;
    let params = params.clamped(state.config.search.max_per_page);

    let (items, total) = ContactRequestRepository::new(state.pool.clone())
        .list_for_professional(
            professional.id,
            filter.status.as_ref().map(ContactStatus::as_str),
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

/// PATCH /api/v1/professionals/me/contact-requests/:id
pub async fn update_contact_request(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateContactStatusRequest>,
) -> Result<Json<ContactRequest>, ApiError> {
    let professional = own_profile(&state, auth.user_id).await?;
    let updated = ContactRequestRepository::new(state.pool.clone())
        .update_status(id, professional.id, request.status.as_str())
        .await?
        .ok_or_else(|| ApiError::NotFound("Contact request not found".into()))?;
    Ok(Json(updated.into()))
}
