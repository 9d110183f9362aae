//! Certification repository.

use domain::models::certification::CreateCertificationRequest;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CertificationEntity;
use crate::metrics::QueryTimer;

const CERTIFICATION_COLUMNS: &str = "id, professional_id, category_id, title, issuer, issued_on, \
    file_url, status, rejection_reason, reviewed_by, reviewed_at, created_at";

#[derive(Clone)]
pub struct CertificationRepository {
    pool: PgPool,
}

impl CertificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Certifications of a professional, optionally limited to one status.
    pub async fn list_by_professional(
        &self,
        professional_id: Uuid,
        status: Option<&str>,
    ) -> Result<Vec<CertificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_professional_certifications");
        let result = sqlx::query_as::<_, CertificationEntity>(&format!(
            r#"
            SELECT {CERTIFICATION_COLUMNS}
            FROM certifications
            WHERE professional_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(professional_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<CertificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_certification");
        let result = sqlx::query_as::<_, CertificationEntity>(&format!(
            "SELECT {CERTIFICATION_COLUMNS} FROM certifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        &self,
        professional_id: Uuid,
        req: &CreateCertificationRequest,
    ) -> Result<CertificationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_certification");
        let result = sqlx::query_as::<_, CertificationEntity>(&format!(
            r#"
            INSERT INTO certifications (professional_id, category_id, title, issuer, issued_on, file_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CERTIFICATION_COLUMNS}
            "#
        ))
        .bind(professional_id)
        .bind(req.category_id)
        .bind(&req.title)
        .bind(&req.issuer)
        .bind(req.issued_on)
        .bind(&req.file_url)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a certification that is still pending review.
    pub async fn delete_pending(&self, id: Uuid, professional_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_certification");
        let result = sqlx::query(
            "DELETE FROM certifications WHERE id = $1 AND professional_id = $2 AND status = 'pending'",
        )
        .bind(id)
        .bind(professional_id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Moderation queue, oldest first.
    pub async fn list_by_status(
        &self,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<CertificationEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_certifications");
        let items = sqlx::query_as::<_, CertificationEntity>(&format!(
            r#"
            SELECT {CERTIFICATION_COLUMNS}
            FROM certifications
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM certifications WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok((items, total))
    }

    /// Records an admin decision on a pending certification.
    ///
    /// Returns `None` when the certification does not exist or was already reviewed.
    pub async fn review(
        &self,
        id: Uuid,
        status: &str,
        rejection_reason: Option<&str>,
        reviewer_id: Uuid,
    ) -> Result<Option<CertificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("review_certification");
        let result = sqlx::query_as::<_, CertificationEntity>(&format!(
            r#"
            UPDATE certifications
            SET status = $2, rejection_reason = $3, reviewed_by = $4, reviewed_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {CERTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(rejection_reason)
        .bind(reviewer_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
