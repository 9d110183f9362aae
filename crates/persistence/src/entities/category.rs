//! Taxonomy entities (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct CategoryGroupEntity {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub sort_order: i32,
}

impl From<CategoryGroupEntity> for domain::models::CategoryGroup {
    fn from(entity: CategoryGroupEntity) -> Self {
        Self {
            id: entity.id,
            slug: entity.slug,
            name: entity.name,
            sort_order: entity.sort_order,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CategoryEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryEntity> for domain::models::Category {
    fn from(entity: CategoryEntity) -> Self {
        Self {
            id: entity.id,
            group_id: entity.group_id,
            parent_id: entity.parent_id,
            name: entity.name,
            slug: entity.slug,
            description: entity.description,
            icon: entity.icon,
            active: entity.active,
            sort_order: entity.sort_order,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
