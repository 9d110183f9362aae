//! Public professional profiles and the `/me` self-service profile endpoints.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::OptionalUserAuth;
use crate::middleware::UserAuth;
use crate::services::files::UploadKind;
use domain::models::contact_request::CreateContactRequest;
use domain::models::professional::{
    AvailabilityRequest, CreateProfessionalRequest, ProfessionalWithUser,
    UpdateProfessionalRequest,
};
use domain::models::{
    ContactRequest, EmailTemplate, JobPayload, Professional, PublicProfile, ReviewWithAuthor, User,
};
use persistence::repositories::{
    CertificationRepository, ContactRequestRepository, NewContactRequest, ProfessionalRepository,
    ReviewRepository, ScheduleRepository, ServiceRepository, UserRepository,
};
use shared::pagination::{PageParams, Paginated};

const RECENT_REVIEWS: i64 = 5;

/// Loads the caller's profile or fails with 404.
pub(crate) async fn own_profile(state: &AppState, user_id: Uuid) -> Result<Professional, ApiError> {
    ProfessionalRepository::new(state.pool.clone())
        .find_by_user_id(user_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("Professional profile not found".into()))
}

/// Loads a profile that is visible to the public or fails with 404.
pub(crate) async fn listed_profile(
    state: &AppState,
    id: Uuid,
) -> Result<ProfessionalWithUser, ApiError> {
    ProfessionalRepository::new(state.pool.clone())
        .find_with_user(id)
        .await?
        .map(ProfessionalWithUser::from)
        .filter(ProfessionalWithUser::is_listed)
        .ok_or_else(|| ApiError::NotFound("Professional not found".into()))
}

/// GET /api/v1/professionals/:id
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicProfile>, ApiError> {
    let listed = listed_profile(&state, id).await?;
    let pool = state.pool.clone();

    let services = ServiceRepository::new(pool.clone())
        .list_by_professional(id, true)
        .await?;
    let schedule = ScheduleRepository::new(pool.clone()).list(id).await?;
    let certifications = CertificationRepository::new(pool.clone())
        .list_by_professional(id, Some("approved"))
        .await?;
    let (reviews, _) = ReviewRepository::new(pool)
        .list_for_professional(id, RECENT_REVIEWS, 0)
        .await?;

    let p = listed.professional;
    Ok(Json(PublicProfile {
        id: p.id,
        name: listed.name,
        headline: p.headline,
        bio: p.bio,
        city: p.city,
        province: p.province,
        whatsapp: p.whatsapp,
        phone: listed.phone,
        years_experience: p.years_experience,
        available: p.available,
        rating_avg: p.rating_avg,
        review_count: p.review_count,
        profile_image_url: p.profile_image_url,
        services: services.into_iter().map(Into::into).collect(),
        schedule: schedule.into_iter().map(Into::into).collect(),
        certifications: certifications.into_iter().map(Into::into).collect(),
        recent_reviews: reviews.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/professionals/:id/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<Json<Paginated<ReviewWithAuthor>>, ApiError> {
    listed_profile(&state, id).await?;
    let params = params.clamped(state.config.search.max_per_page);

    let (reviews, total) = ReviewRepository::new(state.pool.clone())
        .list_for_professional(id, params.limit(), params.offset())
        .await?;

    Ok(Json(Paginated::new(
        reviews.into_iter().map(Into::into).collect(),
        params,
        total,
    )))
}

/// Sends a message to a professional. Anonymous callers must give a name
/// and email; signed-in callers default to their account details.
///
/// POST /api/v1/professionals/:id/contact
pub async fn contact(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    OptionalUserAuth(auth): OptionalUserAuth,
    Json(request): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactRequest>), ApiError> {
    request.validate()?;
    let listed = listed_profile(&state, id).await?;

    let requester: Option<User> = match &auth {
        Some(auth) => UserRepository::new(state.pool.clone())
            .find_by_id(auth.user_id)
            .await?
            .map(Into::into),
        None => None,
    };

    let name = request
        .name
        .clone()
        .or_else(|| requester.as_ref().map(|u| u.name.clone()))
        .ok_or_else(|| ApiError::Validation("Name is required".into()))?;
    let email = request
        .email
        .clone()
        .or_else(|| requester.as_ref().map(|u| u.email.clone()))
        .ok_or_else(|| ApiError::Validation("Email is required".into()))?;
    let phone = request
        .phone
        .clone()
        .or_else(|| requester.as_ref().and_then(|u| u.phone.clone()));

    let created: ContactRequest = ContactRequestRepository::new(state.pool.clone())
        .create(&NewContactRequest {
            professional_id: id,
            requester_id: requester.as_ref().map(|u| u.id),
            name: &name,
            email: &email,
            phone: phone.as_deref(),
            message: &request.message,
        })
        .await?
        .into();

    tracing::info!(professional_id = %id, contact_request_id = %created.id, "Contact request created");

    state
        .queue
        .dispatch(JobPayload::email(
            listed.email.clone(),
            Some(listed.name.clone()),
            EmailTemplate::ContactRequest {
                professional_name: listed.name,
                requester_name: name,
                requester_email: email,
                requester_phone: phone,
                message: request.message,
            },
        ))
        .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Creates the caller's profile in `pending` and notifies moderators.
///
/// POST /api/v1/professionals/me
pub async fn create_my_profile(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateProfessionalRequest>,
) -> Result<(StatusCode, Json<Professional>), ApiError> {
    request.validate()?;

    let repo = ProfessionalRepository::new(state.pool.clone());
    if repo.find_by_user_id(auth.user_id).await?.is_some() {
        return Err(ApiError::Conflict("Professional profile already exists".into()));
    }

    let user: User = UserRepository::new(state.pool.clone())
        .find_by_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?
        .into();

    let professional: Professional = repo.create(auth.user_id, &request).await?.into();
    tracing::info!(professional_id = %professional.id, user_id = %user.id, "Professional profile created");

    state
        .queue
        .dispatch(JobPayload::slack(format!(
            "Nuevo profesional pendiente de verificación: {} ({}, {})",
            user.name, professional.headline, professional.city
        )))
        .await;

    Ok((StatusCode::CREATED, Json(professional)))
}

/// GET /api/v1/professionals/me
pub async fn get_my_profile(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<Professional>, ApiError> {
    Ok(Json(own_profile(&state, auth.user_id).await?))
}

/// PATCH /api/v1/professionals/me
pub async fn update_my_profile(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<UpdateProfessionalRequest>,
) -> Result<Json<Professional>, ApiError> {
    request.validate()?;
    if request.is_empty() {
        return Err(ApiError::Validation("No fields to update".into()));
    }

    let current = own_profile(&state, auth.user_id).await?;
    let updated = ProfessionalRepository::new(state.pool.clone())
        .update(current.id, &request)
        .await?
        .ok_or_else(|| ApiError::NotFound("Professional profile not found".into()))?;

    Ok(Json(updated.into()))
}

/// PUT /api/v1/professionals/me/availability
pub async fn set_availability(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<AvailabilityRequest>,
) -> Result<Json<Professional>, ApiError> {
    let current = own_profile(&state, auth.user_id).await?;
    let updated = ProfessionalRepository::new(state.pool.clone())
        .set_availability(current.id, request.available)
        .await?
        .ok_or_else(|| ApiError::NotFound("Professional profile not found".into()))?;

    Ok(Json(updated.into()))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub mime_type: &'static str,
    pub size: u64,
}

/// Reads the `file` part of a multipart body, enforcing `max_bytes`.
async fn read_file_field(multipart: &mut Multipart, max_bytes: usize) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field.bytes().await?;
        if bytes.len() > max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "File exceeds the {max_bytes} byte limit"
            )));
        }
        return Ok(bytes.to_vec());
    }
    Err(ApiError::Validation("Multipart field 'file' is required".into()))
}

/// Stores a new profile image and queues resizing.
///
/// POST /api/v1/professionals/me/image
pub async fn upload_image(
    State(state): State<AppState>,
    auth: UserAuth,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let professional = own_profile(&state, auth.user_id).await?;
    let storage = &state.config.storage;
    let bytes = read_file_field(&mut multipart, storage.max_image_bytes).await?;

    let stored = state
        .files
        .save(UploadKind::ProfileImage, professional.id, &bytes)
        .await?;
    let url = state.config.upload_url(&stored.relative_path);

    let previous = ProfessionalRepository::new(state.pool.clone())
        .replace_profile_image_url(professional.id, &url)
        .await?;
    if let Some(old) = previous.as_deref().and_then(|u| state.config.upload_relative_path(u)) {
        if let Err(e) = state.files.remove_with_thumbnail(old).await {
            tracing::warn!(path = old, error = %e, "Failed to remove replaced profile image");
        }
    }

    state
        .queue
        .dispatch(JobPayload::ProcessImage {
            path: stored.relative_path,
            max_dimension: storage.image_max_dimension,
            thumbnail_dimension: storage.thumbnail_dimension,
        })
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            url,
            mime_type: stored.mime_type,
            size: stored.size,
        }),
    ))
}

/// Stores a CV (PDF) and queues the size check.
///
/// POST /api/v1/professionals/me/cv
pub async fn upload_cv(
    State(state): State<AppState>,
    auth: UserAuth,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let professional = own_profile(&state, auth.user_id).await?;
    let max_bytes = state.config.storage.max_cv_bytes;
    let bytes = read_file_field(&mut multipart, max_bytes).await?;

    let stored = state
        .files
        .save(UploadKind::Cv, professional.id, &bytes)
        .await?;
    let url = state.config.upload_url(&stored.relative_path);

    let previous = ProfessionalRepository::new(state.pool.clone())
        .replace_cv_url(professional.id, &url)
        .await?;
    if let Some(old) = previous.as_deref().and_then(|u| state.config.upload_relative_path(u)) {
        if let Err(e) = state.files.remove(old).await {
            tracing::warn!(path = old, error = %e, "Failed to remove replaced CV");
        }
    }

    state
        .queue
        .dispatch(JobPayload::CheckFileSize {
            path: stored.relative_path,
            max_bytes: max_bytes as u64,
            professional_id: professional.id,
        })
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            url,
            mime_type: stored.mime_type,
            size: stored.size,
        }),
    ))
}
