//! Contact request entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::ContactStatus;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ContactRequestEntity {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub requester_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<ContactRequestEntity> for domain::models::ContactRequest {
    fn from(entity: ContactRequestEntity) -> Self {
        Self {
            id: entity.id,
            professional_id: entity.professional_id,
            requester_id: entity.requester_id,
            name: entity.name,
            email: entity.email,
            phone: entity.phone,
            message: entity.message,
            status: ContactStatus::parse(&entity.status).unwrap_or(ContactStatus::New),
            created_at: entity.created_at,
        }
    }
}
