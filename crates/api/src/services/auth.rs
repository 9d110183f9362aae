//! Account registration, login, token refresh and single-use email tokens.

use std::sync::Arc;

use chrono::Utc;
use domain::models::{
    AuthResponse, EmailTemplate, JobPayload, TokenPair, TokenPurpose, User, UserResponse, UserRole,
};
use persistence::repositories::{PendingToken, UserRepository, VerificationTokenRepository};
use shared::crypto::{generate_token_pair, sha256_hex};
use shared::jwt::{extract_user_id, JwtConfig, JwtError};
use shared::password::{hash_password, verify_password, PasswordError};
use shared::validation::normalize_email;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::queue::JobQueue;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User is suspended")]
    UserSuspended,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists => ApiError::Conflict("Email already registered".into()),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".into())
            }
            AuthError::UserSuspended => ApiError::Forbidden("Account is suspended".into()),
            AuthError::InvalidRefreshToken => ApiError::Unauthorized("Invalid refresh token".into()),
            AuthError::InvalidToken => ApiError::Validation("Invalid or expired token".into()),
            AuthError::Token(e) => e.into(),
            AuthError::Password(e) => e.into(),
            AuthError::Database(e) => e.into(),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    tokens: VerificationTokenRepository,
    jwt: Arc<JwtConfig>,
    queue: JobQueue,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>, queue: JobQueue) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            tokens: VerificationTokenRepository::new(pool),
            jwt,
            queue,
        }
    }

    /// Creates the account with its verification token, issues tokens and
    /// queues the verification email.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
        phone: Option<&str>,
        as_professional: bool,
    ) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let role = if as_professional {
            UserRole::Professional
        } else {
            UserRole::Citizen
        };
        let password_hash = hash_password(password)?;
        let purpose = TokenPurpose::EmailVerification;
        let (raw, hash) = generate_token_pair();

        let user: User = self
            .users
            .create_with_token(
                &email,
                &password_hash,
                name.trim(),
                phone,
                role.as_str(),
                PendingToken {
                    token_hash: &hash,
                    purpose: purpose.as_str(),
                    expires_at: Utc::now() + purpose.ttl(),
                },
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::EmailAlreadyExists
                } else {
                    AuthError::Database(e)
                }
            })?
            .into();

        tracing::info!(user_id = %user.id, role = %role.as_str(), "User registered");

        self.queue_token_email(&user, purpose, raw).await;

        let tokens = self.issue_tokens(user.id, user.role)?;
        Ok(AuthResponse {
            user: user.into(),
            tokens,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(email);
        let user: User = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?
            .into();

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active() {
            return Err(AuthError::UserSuspended);
        }

        let tokens = self.issue_tokens(user.id, user.role)?;
        Ok(AuthResponse {
            user: user.into(),
            tokens,
        })
    }

    /// Exchanges a refresh token for a fresh pair. The role is re-read from
    /// the database so promotions and suspensions take effect.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        let user_id = extract_user_id(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;

        let user: User = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?
            .into();

        if !user.is_active() {
            return Err(AuthError::UserSuspended);
        }

        self.issue_tokens(user.id, user.role)
    }

    pub async fn verify_email(&self, raw_token: &str) -> Result<UserResponse, AuthError> {
        let token = self
            .tokens
            .consume(&sha256_hex(raw_token), TokenPurpose::EmailVerification.as_str())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.users.mark_email_verified(token.user_id).await?;
        let user: User = self
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?
            .into();

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(user.into())
    }

    /// Queues a reset email when the account exists. Unknown addresses are
    /// silently ignored, and a token that cannot be stored is only logged so
    /// the caller always gets the same answer.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        match self.users.find_by_email(&email).await? {
            Some(entity) => {
                let user: User = entity.into();
                let purpose = TokenPurpose::PasswordReset;
                let (raw, hash) = generate_token_pair();
                match self
                    .tokens
                    .issue(user.id, &hash, purpose.as_str(), Utc::now() + purpose.ttl())
                    .await
                {
                    Ok(_) => self.queue_token_email(&user, purpose, raw).await,
                    Err(e) => {
                        tracing::error!(user_id = %user.id, error = %e, "Failed to store reset token");
                    }
                }
                Ok(())
            }
            None => {
                tracing::debug!("Password reset requested for unknown email");
                Ok(())
            }
        }
    }

    pub async fn reset_password(&self, raw_token: &str, password: &str) -> Result<(), AuthError> {
        let token = self
            .tokens
            .consume(&sha256_hex(raw_token), TokenPurpose::PasswordReset.as_str())
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let password_hash = hash_password(password)?;
        self.users
            .update_password(token.user_id, &password_hash)
            .await?;

        tracing::info!(user_id = %token.user_id, "Password reset");
        Ok(())
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.find_by_id(user_id).await?.map(Into::into))
    }

    fn issue_tokens(&self, user_id: Uuid, role: UserRole) -> Result<TokenPair, AuthError> {
        let (access_token, _) = self.jwt.generate_access_token(user_id, role.as_str())?;
        let (refresh_token, _) = self.jwt.generate_refresh_token(user_id, role.as_str())?;
        Ok(TokenPair::bearer(
            access_token,
            refresh_token,
            self.jwt.access_token_expiry_secs,
        ))
    }

    /// Queues the email carrying the raw value of an already stored token.
    async fn queue_token_email(&self, user: &User, purpose: TokenPurpose, raw: String) {
        self.queue
            .dispatch(JobPayload::email(
                user.email.clone(),
                Some(user.name.clone()),
                token_template(purpose, raw),
            ))
            .await;
    }
}

fn token_template(purpose: TokenPurpose, token: String) -> EmailTemplate {
    match purpose {
        TokenPurpose::EmailVerification => EmailTemplate::EmailVerification { token },
        TokenPurpose::PasswordReset => EmailTemplate::PasswordReset { token },
    }
}
