//! Domain models for Ceres en Red.

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

pub use category::{Category, CategoryGroup, CategoryGroupTree, CategoryNode};
pub use certification::{Certification, CertificationStatus};
pub use contact_request::{ContactRequest, ContactStatus};
pub use job::{EmailTemplate, Job, JobPayload, JobStats, JobStatus, Queue};
pub use professional::{Professional, ProfessionalStatus, ProfessionalSummary, PublicProfile};
pub use review::{Review, ReviewWithAuthor};
pub use schedule::{ScheduleSlot, SlotInput};
pub use service::Service;
pub use user::{AuthResponse, TokenPair, User, UserResponse, UserRole, UserStatus};
pub use verification_token::{TokenPurpose, VerificationToken};
