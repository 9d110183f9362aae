//! Professional profile: a user extended with a public service-provider profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::certification::Certification;
use super::review::ReviewWithAuthor;
use super::schedule::ScheduleSlot;
use super::service::Service;

/// Moderation status of a professional profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProfessionalStatus {
    Pending,
    Verified,
    Rejected,
    Suspended,
}

impl ProfessionalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfessionalStatus::Pending => "pending",
            ProfessionalStatus::Verified => "verified",
            ProfessionalStatus::Rejected => "rejected",
            ProfessionalStatus::Suspended => "suspended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProfessionalStatus::Pending),
            "verified" => Some(ProfessionalStatus::Verified),
            "rejected" => Some(ProfessionalStatus::Rejected),
            "suspended" => Some(ProfessionalStatus::Suspended),
            _ => None,
        }
    }

    /// Only verified professionals are listed publicly.
    pub fn is_public(&self) -> bool {
        matches!(self, ProfessionalStatus::Verified)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub user_id: Uuid,
    pub headline: String,
    pub bio: Option<String>,
    pub city: String,
    pub province: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub whatsapp: Option<String>,
    pub years_experience: Option<i32>,
    pub status: ProfessionalStatus,
    pub rejection_reason: Option<String>,
    pub available: bool,
    pub rating_avg: f64,
    pub review_count: i32,
    pub profile_image_url: Option<String>,
    pub cv_url: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Professional joined with the owning user's contact data.
#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalWithUser {
    #[serde(flatten)]
    pub professional: Professional,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_active: bool,
}

impl ProfessionalWithUser {
    /// Visible in search and on the public profile page.
    pub fn is_listed(&self) -> bool {
        self.user_active && self.professional.status.is_public()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProfessionalRequest {
    #[validate(length(min = 3, max = 120, message = "Headline must be between 3 and 120 characters"))]
    pub headline: String,

    #[validate(length(max = 2000, message = "Bio must be at most 2000 characters"))]
    pub bio: Option<String>,

    #[validate(length(min = 2, max = 80, message = "City must be between 2 and 80 characters"))]
    pub city: String,

    #[validate(length(min = 2, max = 80, message = "Province must be between 2 and 80 characters"))]
    pub province: String,

    #[validate(length(max = 200, message = "Address must be at most 200 characters"))]
    pub address: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub whatsapp: Option<String>,

    #[validate(range(min = 0, max = 70, message = "Years of experience must be between 0 and 70"))]
    pub years_experience: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfessionalRequest {
    #[validate(length(min = 3, max = 120, message = "Headline must be between 3 and 120 characters"))]
    pub headline: Option<String>,

    #[validate(length(max = 2000, message = "Bio must be at most 2000 characters"))]
    pub bio: Option<String>,

    #[validate(length(min = 2, max = 80, message = "City must be between 2 and 80 characters"))]
    pub city: Option<String>,

    #[validate(length(min = 2, max = 80, message = "Province must be between 2 and 80 characters"))]
    pub province: Option<String>,

    #[validate(length(max = 200, message = "Address must be at most 200 characters"))]
    pub address: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub whatsapp: Option<String>,

    #[validate(range(min = 0, max = 70, message = "Years of experience must be between 0 and 70"))]
    pub years_experience: Option<i32>,
}

impl UpdateProfessionalRequest {
    pub fn is_empty(&self) -> bool {
        self.headline.is_none()
            && self.bio.is_none()
            && self.city.is_none()
            && self.province.is_none()
            && self.address.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.whatsapp.is_none()
            && self.years_experience.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejectProfessionalRequest {
    #[validate(length(min = 3, max = 500, message = "Reason must be between 3 and 500 characters"))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProfessionalsQuery {
    pub status: Option<ProfessionalStatus>,
}

/// Card shown in search results.
#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalSummary {
    pub id: Uuid,
    pub name: String,
    pub headline: String,
    pub city: String,
    pub province: String,
    pub available: bool,
    pub rating_avg: f64,
    pub review_count: i32,
    pub profile_image_url: Option<String>,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Full public profile page.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub headline: String,
    pub bio: Option<String>,
    pub city: String,
    pub province: String,
    pub whatsapp: Option<String>,
    pub phone: Option<String>,
    pub years_experience: Option<i32>,
    pub available: bool,
    pub rating_avg: f64,
    pub review_count: i32,
    pub profile_image_url: Option<String>,
    pub services: Vec<Service>,
    pub schedule: Vec<ScheduleSlot>,
    pub certifications: Vec<Certification>,
    pub recent_reviews: Vec<ReviewWithAuthor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip_and_visibility() {
        for status in [
            ProfessionalStatus::Pending,
            ProfessionalStatus::Verified,
            ProfessionalStatus::Rejected,
            ProfessionalStatus::Suspended,
        ] {
            assert_eq!(ProfessionalStatus::parse(status.as_str()), Some(status));
            assert_eq!(status.is_public(), status == ProfessionalStatus::Verified);
        }
    }

    #[test]
    fn test_create_request_validation() {
        let req: CreateProfessionalRequest = serde_json::from_value(serde_json::json!({
            "headline": "Electricista matriculado",
            "city": "Ceres",
            "province": "Santa Fe",
            "latitude": -29.88,
            "longitude": -61.94,
            "years_experience": 12
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let bad: CreateProfessionalRequest = serde_json::from_value(serde_json::json!({
            "headline": "X",
            "city": "Ceres",
            "province": "Santa Fe",
            "latitude": -129.0
        }))
        .unwrap();
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("headline"));
        assert!(errors.field_errors().contains_key("latitude"));
    }

    #[test]
    fn test_update_request_is_empty() {
        assert!(UpdateProfessionalRequest::default().is_empty());
        let req = UpdateProfessionalRequest {
            city: Some("Hersilia".into()),
            ..Default::default()
        };
        assert!(!req.is_empty());
    }
}
