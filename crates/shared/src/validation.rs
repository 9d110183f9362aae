//! Common validation utilities used by request DTOs.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref SLUG_RE: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9 ()\-]{6,24}$").unwrap();
}

/// Minimum number of digits in a phone number.
const MIN_PHONE_DIGITS: usize = 8;
/// Maximum number of digits in a phone number (E.164 limit).
const MAX_PHONE_DIGITS: usize = 15;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(error("latitude_range", "Latitude must be between -90 and 90"))
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(error("longitude_range", "Longitude must be between -180 and 180"))
    }
}

/// Validates a lowercase, hyphen separated slug (`plomeria`, `maestro-mayor-de-obras`).
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(slug) {
        Ok(())
    } else {
        Err(error(
            "invalid_slug",
            "Slug may only contain lowercase letters, digits and single hyphens",
        ))
    }
}

/// Validates a phone number: optional leading `+`, digits and common separators.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if PHONE_RE.is_match(phone) && (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        Ok(())
    } else {
        Err(error("invalid_phone", "Phone number is not valid"))
    }
}

/// Validates a review rating (1 to 5 stars).
pub fn validate_rating(rating: i16) -> Result<(), ValidationError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(error("rating_range", "Rating must be between 1 and 5"))
    }
}

/// Validates a weekday index (0 = Sunday .. 6 = Saturday).
pub fn validate_weekday(weekday: i16) -> Result<(), ValidationError> {
    if (0..=6).contains(&weekday) {
        Ok(())
    } else {
        Err(error("weekday_range", "Weekday must be between 0 and 6"))
    }
}

/// Rejects strings that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "Value must not be blank"))
    } else {
        Ok(())
    }
}

/// Normalizes an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
