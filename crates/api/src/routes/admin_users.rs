//! Admin user management.

use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::user::{AdminUpdateUserRequest, ListUsersQuery};
use domain::models::{User, UserResponse};
use persistence::repositories::{UserListFilters, UserRepository};
use shared::pagination::{PageParams, Paginated};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", patch(update_user))
}

/// GET /api/v1/admin/users?role=&status=&q=&page=
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<UserResponse>>, ApiError> {
    let params = params.clamped(shared::pagination::MAX_PER_PAGE);
    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let filters = UserListFilters {
        role: query.role.as_ref().map(|r| r.as_str()),
        status: query.status.as_ref().map(|s| s.as_str()),
        q,
    };

    let (users, total) = UserRepository::new(state.pool.clone())
        .list(&filters, params.limit(), params.offset())
        .await?;

    Ok(Json(Paginated::new(
        users
            .into_iter()
            .map(|u| UserResponse::from(User::from(u)))
            .collect(),
        params,
        total,
    )))
}

/// PATCH /api/v1/admin/users/:id
async fn update_user(
    State(state): State<AppState>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<AdminUpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if request.role.is_none() && request.status.is_none() {
        return Err(ApiError::Validation("No fields to update".into()));
    }
    if id == admin.id {
        return Err(ApiError::Validation(
            "Administrators cannot change their own role or status".into(),
        ));
    }

    let user: User = UserRepository::new(state.pool.clone())
        .update_role_status(
            id,
            request.role.as_ref().map(|r| r.as_str()),
            request.status.as_ref().map(|s| s.as_str()),
        )
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?
        .into();

    tracing::info!(
        admin_id = %admin.id,
        user_id = %user.id,
        role = user.role.as_str(),
        status = user.status.as_str(),
        "User updated by admin"
    );
    Ok(Json(user.into()))
}
