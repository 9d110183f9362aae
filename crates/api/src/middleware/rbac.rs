//! Role checks for the admin surface.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::models::User;
use persistence::repositories::UserRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

/// Requires an active admin. The role is reloaded from the database so a
/// demoted or suspended admin loses access before their token expires.
///
/// Runs after [`crate::middleware::require_user_auth`]; the loaded [`User`]
/// is stored in the request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(auth) = req.extensions().get::<UserAuth>().cloned() else {
        return ApiError::Unauthorized("Authentication required".to_string()).into_response();
    };

    if !auth.is_admin() {
        return forbidden();
    }

    let repo = UserRepository::new(state.pool.clone());
    let user: User = match repo.find_by_id(auth.user_id).await {
        Ok(Some(entity)) => entity.into(),
        Ok(None) => {
            return ApiError::Unauthorized("User no longer exists".to_string()).into_response()
        }
        Err(e) => return ApiError::from(e).into_response(),
    };

    if !user.is_admin() || !user.is_active() {
        tracing::warn!(user_id = %user.id, "Stale admin token rejected");
        return forbidden();
    }

    req.extensions_mut().insert(user);
    next.run(req).await
}

fn forbidden() -> Response {
    ApiError::Forbidden("Administrator role required".to_string()).into_response()
}
