//! Registration, login and account token endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;
use domain::models::user::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
    ResetPasswordRequest, TokenPair, VerifyEmailRequest,
};
use domain::models::UserResponse;

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let response = state
        .auth_service()
        .register(
            &request.email,
            &request.password,
            &request.name,
            request.phone.as_deref(),
            request.as_professional,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;
    let response = state
        .auth_service()
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    request.validate()?;
    let tokens = state.auth_service().refresh(&request.refresh_token).await?;
    Ok(Json(tokens))
}

/// POST /api/v1/auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    request.validate()?;
    let user = state.auth_service().verify_email(&request.token).await?;
    Ok(Json(user))
}

/// POST /api/v1/auth/forgot-password
///
/// Always 202, whether or not the address is registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    request.validate()?;

    if let Err(e) = state.auth_service().forgot_password(&request.email).await {
        tracing::error!(error = %e, "Failed to issue password reset");
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "If the email is registered, a reset link has been sent",
        }),
    ))
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;
    state
        .auth_service()
        .reset_password(&request.token, &request.password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .auth_service()
        .current_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user.into()))
}
