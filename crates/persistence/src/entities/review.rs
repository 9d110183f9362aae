//! Review entities (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ReviewEntity {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub author_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewEntity> for domain::models::Review {
    fn from(entity: ReviewEntity) -> Self {
        Self {
            id: entity.id,
            professional_id: entity.professional_id,
            author_id: entity.author_id,
            rating: entity.rating,
            comment: entity.comment,
            created_at: entity.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ReviewWithAuthorEntity {
    #[sqlx(flatten)]
    pub review: ReviewEntity,
    pub author_name: String,
}

impl From<ReviewWithAuthorEntity> for domain::models::ReviewWithAuthor {
    fn from(entity: ReviewWithAuthorEntity) -> Self {
        Self {
            review: entity.review.into(),
            author_name: entity.author_name,
        }
    }
}
