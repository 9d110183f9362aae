//! User repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use super::contains_pattern;
use super::verification_token::{insert_token, PendingToken};
use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

const USER_COLUMNS: &str = "id, email, password_hash, name, phone, role, status, \
                            email_verified_at, created_at, updated_at";

/// Filters for the admin user listing.
#[derive(Debug, Clone, Default)]
pub struct UserListFilters<'a> {
    pub role: Option<&'a str>,
    pub status: Option<&'a str>,
    pub q: Option<&'a str>,
}

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by (already normalized) email address.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Creates the account together with its first single-use token. Either
    /// both rows are stored or neither is; a duplicate email surfaces as a
    /// unique violation.
    pub async fn create_with_token(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
        phone: Option<&str>,
        role: &str,
        token: PendingToken<'_>,
    ) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user_with_token");
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            INSERT INTO users (email, password_hash, name, phone, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(phone)
        .bind(role)
        .fetch_one(&mut *tx)
        .await?;

        insert_token(&mut tx, user.id, &token).await?;

        tx.commit().await?;
        timer.record();
        Ok(user)
    }

    pub async fn mark_email_verified(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("mark_user_email_verified");
        sqlx::query(
            r#"
            UPDATE users
            SET email_verified_at = COALESCE(email_verified_at, NOW()), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(())
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("update_user_password");
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(())
    }

    /// Update role and/or status; `None` keeps the current value.
    pub async fn update_role_status(
        &self,
        id: Uuid,
        role: Option<&str>,
        status: Option<&str>,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user_role_status");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            UPDATE users
            SET role = COALESCE($2, role), status = COALESCE($3, status), updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(role)
        .bind(status)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Paginated admin listing, newest first, with total count.
    pub async fn list(
        &self,
        filters: &UserListFilters<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserEntity>, i64), sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let pattern = filters.q.map(contains_pattern);

        let users = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR name ILIKE $3 OR email ILIKE $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(filters.role)
        .bind(filters.status)
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::text IS NULL OR name ILIKE $3 OR email ILIKE $3)
            "#,
        )
        .bind(filters.role)
        .bind(filters.status)
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;
        timer.record();

        Ok((users, total))
    }
}
