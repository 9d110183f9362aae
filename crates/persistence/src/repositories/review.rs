//! Review repository. Every write recomputes the professional's rating
//! aggregate inside the same transaction.

use domain::services::RatingSummary;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::lock_professional;
use crate::entities::{ReviewEntity, ReviewWithAuthorEntity};
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ReviewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_review");
        let result = sqlx::query_as::<_, ReviewEntity>(
            "SELECT id, professional_id, author_id, rating, comment, created_at FROM reviews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Inserts a review. A second review by the same author is a unique violation,
    /// an unknown professional is `RowNotFound`.
    pub async fn create(
        &self,
        professional_id: Uuid,
        author_id: Uuid,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<(ReviewEntity, RatingSummary), sqlx::Error> {
        let timer = QueryTimer::new("create_review");
        let mut tx = self.pool.begin().await?;

        if !lock_professional(&mut tx, professional_id).await? {
            return Err(sqlx::Error::RowNotFound);
        }

        let review = sqlx::query_as::<_, ReviewEntity>(
            r#"
            INSERT INTO reviews (professional_id, author_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, professional_id, author_id, rating, comment, created_at
            "#,
        )
        .bind(professional_id)
        .bind(author_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&mut *tx)
        .await?;

        let summary = recompute_rating(&mut tx, professional_id).await?;
        tx.commit().await?;
        timer.record();
        Ok((review, summary))
    }

    /// Deletes a review and refreshes the aggregate.
    pub async fn delete(&self, id: Uuid) -> Result<Option<RatingSummary>, sqlx::Error> {
        let timer = QueryTimer::new("delete_review");
        let mut tx = self.pool.begin().await?;

        let professional_id: Option<Uuid> =
            sqlx::query_scalar("SELECT professional_id FROM reviews WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(professional_id) = professional_id else {
            return Ok(None);
        };
        lock_professional(&mut tx, professional_id).await?;

        let deleted = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        // Removed by a concurrent delete while waiting for the lock.
        if deleted.rows_affected() == 0 {
            return Ok(None);
        }

        let summary = recompute_rating(&mut tx, professional_id).await?;
        tx.commit().await?;
        timer.record();
        Ok(Some(summary))
    }

    /// Newest first, with author names.
    pub async fn list_for_professional(
        &self,
        professional_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ReviewWithAuthorEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_reviews");
        let items = sqlx::query_as::<_, ReviewWithAuthorEntity>(
            r#"
            SELECT r.id, r.professional_id, r.author_id, r.rating, r.comment, r.created_at,
                   u.name AS author_name
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.professional_id = $1
            ORDER BY r.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(professional_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE professional_id = $1")
            .bind(professional_id)
            .fetch_one(&self.pool)
            .await?;
        timer.record();

        Ok((items, total))
    }
}

async fn recompute_rating(
    tx: &mut Transaction<'_, Postgres>,
    professional_id: Uuid,
) -> Result<RatingSummary, sqlx::Error> {
    let (avg, count): (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(rating)::float8, COUNT(*) FROM reviews WHERE professional_id = $1",
    )
    .bind(professional_id)
    .fetch_one(&mut **tx)
    .await?;

    let summary = RatingSummary::from_aggregate(avg, count);

    sqlx::query(
        r#"
        UPDATE professionals
        SET rating_avg = $2, review_count = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(professional_id)
    .bind(summary.rating_avg)
    .bind(summary.review_count)
    .execute(&mut **tx)
    .await?;

    Ok(summary)
}
