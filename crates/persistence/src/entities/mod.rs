//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod category;
pub mod certification;
pub mod contact_request;
pub mod job;
pub mod professional;
pub mod review;
pub mod schedule;
pub mod service;
pub mod user;
pub mod verification_token;

pub use category::{CategoryEntity, CategoryGroupEntity};
pub use certification::CertificationEntity;
pub use contact_request::ContactRequestEntity;
pub use job::{JobEntity, JobStatsEntity};
pub use professional::{ProfessionalEntity, ProfessionalWithUserEntity, SearchCandidateEntity};
pub use review::{ReviewEntity, ReviewWithAuthorEntity};
pub use schedule::ScheduleSlotEntity;
pub use service::ServiceEntity;
pub use user::UserEntity;
pub use verification_token::VerificationTokenEntity;
