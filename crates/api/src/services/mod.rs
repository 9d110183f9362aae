//! Business services and outbound integrations.

pub mod auth;
pub mod email;
pub mod files;
pub mod queue;
pub mod slack;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailMessage, EmailService};
pub use files::{FileProcessingError, FileStore, UploadKind};
pub use queue::{JobQueue, QueueError};
pub use slack::{SlackClient, SlackError};
