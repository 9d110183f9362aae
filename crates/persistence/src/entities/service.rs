//! Service entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Service row joined with its category name and slug.
#[derive(Debug, Clone, FromRow)]
pub struct ServiceEntity {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_slug: String,
    pub title: String,
    pub description: Option<String>,
    pub price_from: Option<f64>,
    pub price_unit: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceEntity> for domain::models::Service {
    fn from(entity: ServiceEntity) -> Self {
        Self {
            id: entity.id,
            professional_id: entity.professional_id,
            category_id: entity.category_id,
            category_name: entity.category_name,
            category_slug: entity.category_slug,
            title: entity.title,
            description: entity.description,
            price_from: entity.price_from,
            price_unit: entity.price_unit,
            active: entity.active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
