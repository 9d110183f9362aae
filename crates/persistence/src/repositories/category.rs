//! Category taxonomy repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{CategoryEntity, CategoryGroupEntity};
use crate::metrics::QueryTimer;

const CATEGORY_COLUMNS: &str = "id, group_id, parent_id, name, slug, description, icon, active, \
                                sort_order, created_at, updated_at";

/// Input for inserting a category once its placement has been resolved.
#[derive(Debug, Clone)]
pub struct NewCategory<'a> {
    pub group_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub icon: Option<&'a str>,
    pub sort_order: i32,
}

#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_groups(&self) -> Result<Vec<CategoryGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_category_groups");
        let result = sqlx::query_as::<_, CategoryGroupEntity>(
            "SELECT id, slug, name, sort_order FROM category_groups ORDER BY sort_order, name",
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_group_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryGroupEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_category_group_by_slug");
        let result = sqlx::query_as::<_, CategoryGroupEntity>(
            "SELECT id, slug, name, sort_order FROM category_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Flat list ordered for tree building: roots before their children.
    pub async fn list(
        &self,
        group_id: Option<Uuid>,
        include_inactive: bool,
    ) -> Result<Vec<CategoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_categories");
        let result = sqlx::query_as::<_, CategoryEntity>(&format!(
            r#"
            SELECT {CATEGORY_COLUMNS}
            FROM categories
            WHERE ($1::uuid IS NULL OR group_id = $1)
              AND ($2 OR active)
            ORDER BY parent_id NULLS FIRST, sort_order, name
            "#
        ))
        .bind(group_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CategoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_category_by_id");
        let result = sqlx::query_as::<_, CategoryEntity>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<CategoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_category_by_slug");
        let result = sqlx::query_as::<_, CategoryEntity>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn children_of(
        &self,
        parent_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<CategoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_category_children");
        let result = sqlx::query_as::<_, CategoryEntity>(&format!(
            r#"
            SELECT {CATEGORY_COLUMNS}
            FROM categories
            WHERE parent_id = $1 AND ($2 OR active)
            ORDER BY sort_order, name
            "#
        ))
        .bind(parent_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(&self, input: &NewCategory<'_>) -> Result<CategoryEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_category");
        let result = sqlx::query_as::<_, CategoryEntity>(&format!(
            r#"
            INSERT INTO categories (group_id, parent_id, name, slug, description, icon, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(input.group_id)
        .bind(input.parent_id)
        .bind(input.name)
        .bind(input.slug)
        .bind(input.description)
        .bind(input.icon)
        .bind(input.sort_order)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial update; `None` keeps the stored value.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        slug: Option<&str>,
        description: Option<&str>,
        icon: Option<&str>,
        active: Option<bool>,
        sort_order: Option<i32>,
    ) -> Result<Option<CategoryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_category");
        let result = sqlx::query_as::<_, CategoryEntity>(&format!(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                icon = COALESCE($5, icon),
                active = COALESCE($6, active),
                sort_order = COALESCE($7, sort_order),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(icon)
        .bind(active)
        .bind(sort_order)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Number of services in the category or any of its subcategories.
    pub async fn count_services_in_tree(&self, id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_category_services");
        let result = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM services s
            JOIN categories c ON c.id = s.category_id
            WHERE c.id = $1 OR c.parent_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes the category; subcategories cascade.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_category");
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }
}
