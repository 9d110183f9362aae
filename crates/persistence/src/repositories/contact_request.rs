//! Contact request repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ContactRequestEntity;
use crate::metrics::QueryTimer;

const CONTACT_COLUMNS: &str =
    "id, professional_id, requester_id, name, email, phone, message, status, created_at";

/// Resolved contact request ready to be stored.
#[derive(Debug, Clone)]
pub struct NewContactRequest<'a> {
    pub professional_id: Uuid,
    pub requester_id: Option<Uuid>,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub message: &'a str,
}

#[derive(Clone)]
pub struct ContactRequestRepository {
    pool: PgPool,
}

impl ContactRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        input: &NewContactRequest<'_>,
    ) -> Result<ContactRequestEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_contact_request");
        let result = sqlx::query_as::<_, ContactRequestEntity>(&format!(
            r#"
            INSERT INTO contact_requests (professional_id, requester_id, name, email, phone, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(input.professional_id)
        .bind(input.requester_id)
        .bind(input.name)
        .bind(input.email)
        .bind(input.phone)
        .bind(input.message)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Inbox of a professional, newest first.
    pub async fn list_for_professional(
        &self,
        professional_id: Uuid,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ContactRequestEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_contact_requests");
        let items = sqlx::query_as::<_, ContactRequestEntity>(&format!(
            r#"
            SELECT {CONTACT_COLUMNS}
            FROM contact_requests
            WHERE professional_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(professional_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM contact_requests
            WHERE professional_id = $1 AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(professional_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok((items, total))
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        professional_id: Uuid,
        status: &str,
    ) -> Result<Option<ContactRequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_contact_request_status");
        let result = sqlx::query_as::<_, ContactRequestEntity>(&format!(
            r#"
            UPDATE contact_requests SET status = $3
            WHERE id = $1 AND professional_id = $2
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(professional_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
