//! Certifications uploaded by professionals and reviewed by admins.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CertificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl CertificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificationStatus::Pending => "pending",
            CertificationStatus::Approved => "approved",
            CertificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CertificationStatus::Pending),
            "approved" => Some(CertificationStatus::Approved),
            "rejected" => Some(CertificationStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certification {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub issuer: String,
    pub issued_on: Option<NaiveDate>,
    pub file_url: Option<String>,
    pub status: CertificationStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Certification {
    /// Owners may withdraw a certification only while it awaits review.
    pub fn is_withdrawable(&self) -> bool {
        self.status == CertificationStatus::Pending
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCertificationRequest {
    pub category_id: Option<Uuid>,

    #[validate(length(min = 3, max = 150, message = "Title must be between 3 and 150 characters"))]
    pub title: String,

    #[validate(length(min = 2, max = 150, message = "Issuer must be between 2 and 150 characters"))]
    pub issuer: String,

    pub issued_on: Option<NaiveDate>,

    #[validate(url(message = "File URL must be a valid URL"))]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejectCertificationRequest {
    #[validate(length(min = 3, max = 500, message = "Reason must be between 3 and 500 characters"))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListCertificationsQuery {
    pub status: Option<CertificationStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_withdrawable() {
        let mut cert = Certification {
            id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            category_id: None,
            title: "Matrícula de gasista".into(),
            issuer: "ENARGAS".into(),
            issued_on: NaiveDate::from_ymd_opt(2019, 3, 1),
            file_url: None,
            status: CertificationStatus::Pending,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        };
        assert!(cert.is_withdrawable());
        cert.status = CertificationStatus::Approved;
        assert!(!cert.is_withdrawable());
    }

    #[test]
    fn test_create_request_rejects_bad_url() {
        let req = CreateCertificationRequest {
            category_id: None,
            title: "Matrícula".into(),
            issuer: "Colegio".into(),
            issued_on: None,
            file_url: Some("not a url".into()),
        };
        assert!(req.validate().unwrap_err().field_errors().contains_key("file_url"));
    }
}
