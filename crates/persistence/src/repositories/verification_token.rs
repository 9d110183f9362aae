//! Single-use verification token repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::VerificationTokenEntity;
use crate::metrics::QueryTimer;

const TOKEN_COLUMNS: &str = "id, user_id, token_hash, purpose, expires_at, consumed_at, created_at";

/// A token hash waiting to be stored.
#[derive(Debug, Clone, Copy)]
pub struct PendingToken<'a> {
    pub token_hash: &'a str,
    pub purpose: &'a str,
    pub expires_at: DateTime<Utc>,
}

pub(crate) async fn insert_token(
    conn: &mut PgConnection,
    user_id: Uuid,
    token: &PendingToken<'_>,
) -> Result<VerificationTokenEntity, sqlx::Error> {
    sqlx::query_as::<_, VerificationTokenEntity>(&format!(
        r#"
        INSERT INTO verification_tokens (user_id, token_hash, purpose, expires_at)
        VALUES ($1, $2, $3, $4)
        RETURNING {TOKEN_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(token.token_hash)
    .bind(token.purpose)
    .bind(token.expires_at)
    .fetch_one(conn)
    .await
}

#[derive(Clone)]
pub struct VerificationTokenRepository {
    pool: PgPool,
}

impl VerificationTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a new token hash, invalidating older unused tokens of the same purpose.
    pub async fn issue(
        &self,
        user_id: Uuid,
        token_hash: &str,
        purpose: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<VerificationTokenEntity, sqlx::Error> {
        let timer = QueryTimer::new("issue_verification_token");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE verification_tokens SET consumed_at = NOW()
            WHERE user_id = $1 AND purpose = $2 AND consumed_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(purpose)
        .execute(&mut *tx)
        .await?;

        let token = insert_token(
            &mut tx,
            user_id,
            &PendingToken {
                token_hash,
                purpose,
                expires_at,
            },
        )
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(token)
    }

    /// Atomically marks a live token as consumed and returns it.
    ///
    /// Expired, consumed or unknown tokens yield `None`.
    pub async fn consume(
        &self,
        token_hash: &str,
        purpose: &str,
    ) -> Result<Option<VerificationTokenEntity>, sqlx::Error> {
        let timer = QueryTimer::new("consume_verification_token");
        let result = sqlx::query_as::<_, VerificationTokenEntity>(&format!(
            r#"
            UPDATE verification_tokens SET consumed_at = NOW()
            WHERE token_hash = $1 AND purpose = $2
              AND consumed_at IS NULL AND expires_at > NOW()
            RETURNING {TOKEN_COLUMNS}
            "#
        ))
        .bind(token_hash)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes expired and consumed tokens.
    pub async fn purge_expired(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("purge_verification_tokens");
        let result = sqlx::query(
            "DELETE FROM verification_tokens WHERE expires_at < NOW() OR consumed_at IS NOT NULL",
        )
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }
}
