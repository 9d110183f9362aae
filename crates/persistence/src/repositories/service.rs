//! Service (offering) repository.

use domain::models::service::{CreateServiceRequest, UpdateServiceRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ServiceEntity;
use crate::metrics::QueryTimer;

const SERVICE_SELECT: &str = r#"
    SELECT s.id, s.professional_id, s.category_id, c.name AS category_name,
           c.slug AS category_slug, s.title, s.description, s.price_from, s.price_unit,
           s.active, s.created_at, s.updated_at
    FROM services s
    JOIN categories c ON c.id = s.category_id
"#;

#[derive(Clone)]
pub struct ServiceRepository {
    pool: PgPool,
}

impl ServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_professional(
        &self,
        professional_id: Uuid,
        only_active: bool,
    ) -> Result<Vec<ServiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_services");
        let result = sqlx::query_as::<_, ServiceEntity>(&format!(
            r#"
            {SERVICE_SELECT}
            WHERE s.professional_id = $1 AND (NOT $2 OR (s.active AND c.active))
            ORDER BY s.created_at
            "#
        ))
        .bind(professional_id)
        .bind(only_active)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Finds a service owned by the given professional.
    pub async fn find_owned(
        &self,
        id: Uuid,
        professional_id: Uuid,
    ) -> Result<Option<ServiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_service");
        let result = sqlx::query_as::<_, ServiceEntity>(&format!(
            "{SERVICE_SELECT} WHERE s.id = $1 AND s.professional_id = $2"
        ))
        .bind(id)
        .bind(professional_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        professional_id: Uuid,
        req: &CreateServiceRequest,
    ) -> Result<ServiceEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_service");
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO services (professional_id, category_id, title, description, price_from, price_unit)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(professional_id)
        .bind(req.category_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.price_from)
        .bind(&req.price_unit)
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        self.find_owned(id, professional_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn update(
        &self,
        id: Uuid,
        professional_id: Uuid,
        req: &UpdateServiceRequest,
    ) -> Result<Option<ServiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_service");
        let updated = sqlx::query(
            r#"
            UPDATE services
            SET category_id = COALESCE($3, category_id),
                title = COALESCE($4, title),
                description = COALESCE($5, description),
                price_from = COALESCE($6, price_from),
                price_unit = COALESCE($7, price_unit),
                active = COALESCE($8, active),
                updated_at = NOW()
            WHERE id = $1 AND professional_id = $2
            "#,
        )
        .bind(id)
        .bind(professional_id)
        .bind(req.category_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.price_from)
        .bind(&req.price_unit)
        .bind(req.active)
        .execute(&self.pool)
        .await?;
        timer.record();

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_owned(id, professional_id).await
    }

    pub async fn delete(&self, id: Uuid, professional_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_service");
        let result = sqlx::query("DELETE FROM services WHERE id = $1 AND professional_id = $2")
            .bind(id)
            .bind(professional_id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }
}
