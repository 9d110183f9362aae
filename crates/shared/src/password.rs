//! Password hashing (Argon2id) and password policy checks.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;
use validator::ValidationError;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2id parameters (OWASP 2024 baseline): 19 MiB, 2 iterations, 1 lane.
const MEMORY_COST: u32 = 19456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;
const OUTPUT_LEN: usize = 32;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

fn argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(MEMORY_COST, TIME_COST, PARALLELISM, Some(OUTPUT_LEN))
        .map_err(|e| PasswordError::HashError(format!("Failed to create Argon2 params: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password and returns the PHC string.
///
/// ```
/// use shared::password::hash_password;
///
/// let hash = hash_password("cambiar-123").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored PHC hash. The hash carries its own parameters.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Password policy: 8..=128 chars, at least one letter and one digit.
///
/// Usable as a `#[validate(custom(function = "..."))]` target.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        let mut err = ValidationError::new("password_length");
        err.message = Some(
            format!(
                "Password must be between {} and {} characters",
                MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
            )
            .into(),
        );
        return Err(err);
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        let mut err = ValidationError::new("password_complexity");
        err.message = Some("Password must contain at least one letter and one digit".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_uses_configured_params() {
        let hash = hash_password("plomero2024").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$m=19456,t=2,p=1$"));
    }

    #[test]
    fn test_hash_is_salted() {
        assert_ne!(
            hash_password("misma-clave1").unwrap(),
            hash_password("misma-clave1").unwrap()
        );
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("electricista9").unwrap();
        assert!(verify_password("electricista9", &hash).unwrap());
        assert!(!verify_password("electricista8", &hash).unwrap());
    }

    #[test]
    fn test_verify_unicode_password() {
        let hash = hash_password("contraseña1ñandú").unwrap();
        assert!(verify_password("contraseña1ñandú", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash() {
        let result = verify_password("whatever1", "not-a-phc-string");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_strength_accepts_reasonable_password() {
        assert!(validate_password_strength("gasista123").is_ok());
    }

    #[test]
    fn test_strength_rejects_short_password() {
        let err = validate_password_strength("a1b2").unwrap_err();
        assert_eq!(err.code, "password_length");
    }

    #[test]
    fn test_strength_rejects_missing_digit_or_letter() {
        assert_eq!(
            validate_password_strength("solamenteletras").unwrap_err().code,
            "password_complexity"
        );
        assert_eq!(
            validate_password_strength("1234567890").unwrap_err().code,
            "password_complexity"
        );
    }

    #[test]
    fn test_strength_rejects_too_long_password() {
        let long = format!("a1{}", "x".repeat(MAX_PASSWORD_LEN));
        assert!(validate_password_strength(&long).is_err());
    }
}
