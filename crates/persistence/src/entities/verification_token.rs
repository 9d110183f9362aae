//! Verification token entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::TokenPurpose;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct VerificationTokenEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub purpose: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl VerificationTokenEntity {
    pub fn purpose(&self) -> Option<TokenPurpose> {
        TokenPurpose::parse(&self.purpose)
    }
}

impl TryFrom<VerificationTokenEntity> for domain::models::VerificationToken {
    type Error = String;

    fn try_from(entity: VerificationTokenEntity) -> Result<Self, Self::Error> {
        let purpose = entity
            .purpose()
            .ok_or_else(|| format!("unknown token purpose '{}'", entity.purpose))?;
        Ok(Self {
            id: entity.id,
            user_id: entity.user_id,
            token_hash: entity.token_hash,
            purpose,
            expires_at: entity.expires_at,
            consumed_at: entity.consumed_at,
            created_at: entity.created_at,
        })
    }
}
