//! Writing and removing reviews.

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
use crate::routes::professionals::listed_profile;
use domain::models::review::CreateReviewRequest;
use domain::models::Review;
use domain::services::RatingSummary;
use persistence::repositories::ReviewRepository;

#[derive(Debug, Serialize)]
pub struct ReviewCreatedResponse {
    pub review: Review,
    pub rating: RatingSummary,
}

/// One review per author and professional; owners cannot review themselves.
///
/// POST /api/v1/professionals/:id/reviews
pub async fn create_review(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(professional_id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewCreatedResponse>), ApiError> {
    request.validate()?;

    let listed = listed_profile(&state, professional_id).await?;
    if listed.professional.user_id == auth.user_id {
        return Err(ApiError::Forbidden(
            "You cannot review your own profile".into(),
        ));
    }

    let comment = request
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let (review, rating) = ReviewRepository::new(state.pool.clone())
        .create(professional_id, auth.user_id, request.rating, comment)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict("You have already reviewed this professional".into())
            }
            other => other,
        })?;

    tracing::info!(
        professional_id = %professional_id,
        rating_avg = rating.rating_avg,
        review_count = rating.review_count,
        "Review created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ReviewCreatedResponse {
            review: review.into(),
            rating,
        }),
    ))
}

/// Author or admin only.
///
/// DELETE /api/v1/reviews/:id
pub async fn delete_review(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = ReviewRepository::new(state.pool.clone());
    let review = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;

    if review.author_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::Forbidden("Only the author can delete this review".into()));
    }

    repo.delete(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Review not found".into()))?;

    Ok(StatusCode::NO_CONTENT)
}
