//! User account entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{UserRole, UserStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            password_hash: entity.password_hash,
            name: entity.name,
            phone: entity.phone,
            role: UserRole::parse(&entity.role).unwrap_or(UserRole::Citizen),
            status: UserStatus::parse(&entity.status).unwrap_or(UserStatus::Suspended),
            email_verified_at: entity.email_verified_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
