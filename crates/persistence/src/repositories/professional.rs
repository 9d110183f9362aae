//! Professional profile repository, including the search query.

use domain::models::professional::{CreateProfessionalRequest, UpdateProfessionalRequest};
use sqlx::PgPool;
use uuid::Uuid;

use super::contains_pattern;
use crate::entities::{ProfessionalEntity, ProfessionalWithUserEntity, SearchCandidateEntity};
use crate::metrics::QueryTimer;

const PROFESSIONAL_COLUMNS: &str = "p.id, p.user_id, p.headline, p.bio, p.city, p.province, \
    p.address, p.latitude, p.longitude, p.whatsapp, p.years_experience, p.status, \
    p.rejection_reason, p.available, p.rating_avg, p.review_count, p.profile_image_url, \
    p.cv_url, p.verified_at, p.created_at, p.updated_at";

/// Database-side filters of the search operation.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters<'a> {
    /// Category id; its subcategories match too.
    pub category_id: Option<Uuid>,
    pub city: Option<&'a str>,
    pub province: Option<&'a str>,
    pub text: Option<&'a str>,
}

#[derive(Clone)]
pub struct ProfessionalRepository {
    pool: PgPool,
}

impl ProfessionalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a pending profile and promotes the user to the professional role.
    pub async fn create(
        &self,
        user_id: Uuid,
        req: &CreateProfessionalRequest,
    ) -> Result<ProfessionalEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_professional");
        let mut tx = self.pool.begin().await?;

        let professional = sqlx::query_as::<_, ProfessionalEntity>(&format!(
            r#"
            INSERT INTO professionals AS p
                (user_id, headline, bio, city, province, address, latitude, longitude,
                 whatsapp, years_experience)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PROFESSIONAL_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&req.headline)
        .bind(&req.bio)
        .bind(&req.city)
        .bind(&req.province)
        .bind(&req.address)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(&req.whatsapp)
        .bind(req.years_experience)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users SET role = 'professional', updated_at = NOW()
            WHERE id = $1 AND role = 'citizen'
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(professional)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProfessionalEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_professional_by_id");
        let result = sqlx::query_as::<_, ProfessionalEntity>(&format!(
            "SELECT {PROFESSIONAL_COLUMNS} FROM professionals p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfessionalEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_professional_by_user");
        let result = sqlx::query_as::<_, ProfessionalEntity>(&format!(
            "SELECT {PROFESSIONAL_COLUMNS} FROM professionals p WHERE p.user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_with_user(
        &self,
        id: Uuid,
    ) -> Result<Option<ProfessionalWithUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_professional_with_user");
        let result = sqlx::query_as::<_, ProfessionalWithUserEntity>(&format!(
            r#"
            SELECT {PROFESSIONAL_COLUMNS}, u.name, u.email, u.phone, u.status AS user_status
            FROM professionals p
            JOIN users u ON u.id = p.user_id
            WHERE p.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Partial profile update; `None` keeps the stored value.
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateProfessionalRequest,
    ) -> Result<Option<ProfessionalEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_professional");
        let result = sqlx::query_as::<_, ProfessionalEntity>(&format!(
            r#"
            UPDATE professionals AS p
            SET headline = COALESCE($2, p.headline),
                bio = COALESCE($3, p.bio),
                city = COALESCE($4, p.city),
                province = COALESCE($5, p.province),
                address = COALESCE($6, p.address),
                latitude = COALESCE($7, p.latitude),
                longitude = COALESCE($8, p.longitude),
                whatsapp = COALESCE($9, p.whatsapp),
                years_experience = COALESCE($10, p.years_experience),
                updated_at = NOW()
            WHERE p.id = $1
            RETURNING {PROFESSIONAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.headline)
        .bind(&req.bio)
        .bind(&req.city)
        .bind(&req.province)
        .bind(&req.address)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(&req.whatsapp)
        .bind(req.years_experience)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn set_availability(
        &self,
        id: Uuid,
        available: bool,
    ) -> Result<Option<ProfessionalEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_professional_availability");
        let result = sqlx::query_as::<_, ProfessionalEntity>(&format!(
            r#"
            UPDATE professionals AS p SET available = $2, updated_at = NOW()
            WHERE p.id = $1
            RETURNING {PROFESSIONAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(available)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Moderation transition. `verified_at` is stamped on verification and
    /// the rejection reason is cleared unless the new status is `rejected`.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: &str,
        rejection_reason: Option<&str>,
    ) -> Result<Option<ProfessionalEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_professional_status");
        let result = sqlx::query_as::<_, ProfessionalEntity>(&format!(
            r#"
            UPDATE professionals AS p
            SET status = $2,
                rejection_reason = CASE WHEN $2 = 'rejected' THEN $3 ELSE NULL END,
                verified_at = CASE WHEN $2 = 'verified' THEN NOW() ELSE p.verified_at END,
                updated_at = NOW()
            WHERE p.id = $1
            RETURNING {PROFESSIONAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(rejection_reason)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Points the profile image at `url` and returns the link it replaced.
    pub async fn replace_profile_image_url(
        &self,
        id: Uuid,
        url: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let timer = QueryTimer::new("replace_professional_image");
        let previous: Option<Option<String>> = sqlx::query_scalar(
            r#"
            UPDATE professionals p
            SET profile_image_url = $2, updated_at = NOW()
            FROM (SELECT id, profile_image_url FROM professionals WHERE id = $1 FOR UPDATE) old
            WHERE p.id = old.id
            RETURNING old.profile_image_url
            "#,
        )
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        timer.record();
        Ok(previous.flatten())
    }

    /// Points the CV at `url` and returns the link it replaced.
    pub async fn replace_cv_url(&self, id: Uuid, url: &str) -> Result<Option<String>, sqlx::Error> {
        let timer = QueryTimer::new("replace_professional_cv");
        let previous: Option<Option<String>> = sqlx::query_scalar(
            r#"
            UPDATE professionals p
            SET cv_url = $2, updated_at = NOW()
            FROM (SELECT id, cv_url FROM professionals WHERE id = $1 FOR UPDATE) old
            WHERE p.id = old.id
            RETURNING old.cv_url
            "#,
        )
        .bind(id)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;
        timer.record();
        Ok(previous.flatten())
    }

    /// Clears the CV link only while it still points at the stored file
    /// `relative_path`; a newer upload is left alone. Returns whether a row
    /// changed.
    pub async fn clear_cv_url_if_stored_at(
        &self,
        id: Uuid,
        relative_path: &str,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("clear_professional_cv");
        let result = sqlx::query(
            r#"
            UPDATE professionals SET cv_url = NULL, updated_at = NOW()
            WHERE id = $1 AND RIGHT(cv_url, LENGTH($2) + 1) = '/' || $2
            "#,
        )
        .bind(id)
        .bind(relative_path)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Admin moderation listing, oldest first so the queue is worked in order.
    pub async fn list_with_user(
        &self,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ProfessionalWithUserEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_professionals");
        let items = sqlx::query_as::<_, ProfessionalWithUserEntity>(&format!(
            r#"
            SELECT {PROFESSIONAL_COLUMNS}, u.name, u.email, u.phone, u.status AS user_status
            FROM professionals p
            JOIN users u ON u.id = p.user_id
            WHERE ($1::text IS NULL OR p.status = $1)
            ORDER BY p.created_at ASC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM professionals WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok((items, total))
    }

    /// Filtered search query.
    ///
    /// Returns verified professionals of active users that publish at least
    /// one active service in an active category matching the filters. Ordering
    /// and the radius filter are applied by the caller.
    pub async fn search_candidates(
        &self,
        filters: &SearchFilters<'_>,
    ) -> Result<Vec<SearchCandidateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("search_professionals");
        let city = filters.city.map(contains_pattern);
        let province = filters.province.map(contains_pattern);
        let text = filters.text.map(contains_pattern);

        let result = sqlx::query_as::<_, SearchCandidateEntity>(
            r#"
            SELECT p.id, u.name, p.headline, p.city, p.province, p.available,
                   p.rating_avg, p.review_count, p.profile_image_url, p.latitude, p.longitude,
                   ARRAY(
                       SELECT DISTINCT c2.name
                       FROM services s2
                       JOIN categories c2 ON c2.id = s2.category_id
                       WHERE s2.professional_id = p.id AND s2.active AND c2.active
                       ORDER BY c2.name
                   ) AS categories
            FROM professionals p
            JOIN users u ON u.id = p.user_id
            WHERE p.status = 'verified'
              AND u.status = 'active'
              AND ($2::text IS NULL OR p.city ILIKE $2)
              AND ($3::text IS NULL OR p.province ILIKE $3)
              AND EXISTS (
                  SELECT 1
                  FROM services s
                  JOIN categories c ON c.id = s.category_id
                  WHERE s.professional_id = p.id
                    AND s.active
                    AND c.active
                    AND ($1::uuid IS NULL OR c.id = $1 OR c.parent_id = $1)
                    AND ($4::text IS NULL OR s.title ILIKE $4 OR p.headline ILIKE $4)
              )
            "#,
        )
        .bind(filters.category_id)
        .bind(city.as_deref())
        .bind(province.as_deref())
        .bind(text.as_deref())
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
