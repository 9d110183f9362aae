//! Certification entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::CertificationStatus;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct CertificationEntity {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub issuer: String,
    pub issued_on: Option<NaiveDate>,
    pub file_url: Option<String>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<CertificationEntity> for domain::models::Certification {
    fn from(entity: CertificationEntity) -> Self {
        Self {
            id: entity.id,
            professional_id: entity.professional_id,
            category_id: entity.category_id,
            title: entity.title,
            issuer: entity.issuer,
            issued_on: entity.issued_on,
            file_url: entity.file_url,
            status: CertificationStatus::parse(&entity.status)
                .unwrap_or(CertificationStatus::Pending),
            rejection_reason: entity.rejection_reason,
            reviewed_by: entity.reviewed_by,
            reviewed_at: entity.reviewed_at,
            created_at: entity.created_at,
        }
    }
}
