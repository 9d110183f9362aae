//! Admin dashboard counters.

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::metrics::QueryTimer;

/// Platform-wide counts shown on the admin dashboard.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminStats {
    pub total_users: i64,
    pub suspended_users: i64,
    pub pending_professionals: i64,
    pub verified_professionals: i64,
    pub rejected_professionals: i64,
    pub suspended_professionals: i64,
    pub active_services: i64,
    pub total_reviews: i64,
    pub pending_certifications: i64,
}

#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn admin_stats(&self) -> Result<AdminStats, sqlx::Error> {
        let timer = QueryTimer::new("admin_stats");
        let result = sqlx::query_as::<_, AdminStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM users WHERE status = 'suspended') AS suspended_users,
                (SELECT COUNT(*) FROM professionals WHERE status = 'pending') AS pending_professionals,
                (SELECT COUNT(*) FROM professionals WHERE status = 'verified') AS verified_professionals,
                (SELECT COUNT(*) FROM professionals WHERE status = 'rejected') AS rejected_professionals,
                (SELECT COUNT(*) FROM professionals WHERE status = 'suspended') AS suspended_professionals,
                (SELECT COUNT(*) FROM services WHERE active) AS active_services,
                (SELECT COUNT(*) FROM reviews) AS total_reviews,
                (SELECT COUNT(*) FROM certifications WHERE status = 'pending') AS pending_certifications
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
