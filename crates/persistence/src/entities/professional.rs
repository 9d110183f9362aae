//! Professional profile entities (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::ProfessionalStatus;
use domain::services::SearchCandidate;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the professionals table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfessionalEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub headline: String,
    pub bio: Option<String>,
    pub city: String,
    pub province: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub whatsapp: Option<String>,
    pub years_experience: Option<i32>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub available: bool,
    pub rating_avg: f64,
    pub review_count: i32,
    pub profile_image_url: Option<String>,
    pub cv_url: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProfessionalEntity> for domain::models::Professional {
    fn from(entity: ProfessionalEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            headline: entity.headline,
            bio: entity.bio,
            city: entity.city,
            province: entity.province,
            address: entity.address,
            latitude: entity.latitude,
            longitude: entity.longitude,
            whatsapp: entity.whatsapp,
            years_experience: entity.years_experience,
            status: ProfessionalStatus::parse(&entity.status).unwrap_or(ProfessionalStatus::Pending),
            rejection_reason: entity.rejection_reason,
            available: entity.available,
            rating_avg: entity.rating_avg,
            review_count: entity.review_count,
            profile_image_url: entity.profile_image_url,
            cv_url: entity.cv_url,
            verified_at: entity.verified_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Professional row joined with its owning user.
#[derive(Debug, Clone, FromRow)]
pub struct ProfessionalWithUserEntity {
    #[sqlx(flatten)]
    pub professional: ProfessionalEntity,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_status: String,
}

impl From<ProfessionalWithUserEntity> for domain::models::professional::ProfessionalWithUser {
    fn from(entity: ProfessionalWithUserEntity) -> Self {
        Self {
            user_active: entity.user_status == "active",
            professional: entity.professional.into(),
            name: entity.name,
            email: entity.email,
            phone: entity.phone,
        }
    }
}

/// Row of the filtered search query.
#[derive(Debug, Clone, FromRow)]
pub struct SearchCandidateEntity {
    pub id: Uuid,
    pub name: String,
    pub headline: String,
    pub city: String,
    pub province: String,
    pub available: bool,
    pub rating_avg: f64,
    pub review_count: i32,
    pub profile_image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub categories: Vec<String>,
}

impl From<SearchCandidateEntity> for SearchCandidate {
    fn from(entity: SearchCandidateEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            headline: entity.headline,
            city: entity.city,
            province: entity.province,
            available: entity.available,
            rating_avg: entity.rating_avg,
            review_count: entity.review_count,
            profile_image_url: entity.profile_image_url,
            latitude: entity.latitude,
            longitude: entity.longitude,
            categories: entity.categories,
        }
    }
}
