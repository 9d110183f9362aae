//! Domain services for Ceres en Red.
//!
//! Pure business logic operating on domain models; no I/O.

pub mod rating;
pub mod search;
pub mod slug;

pub use rating::RatingSummary;
pub use search::{distance_km, rank_professionals, SearchCandidate, SearchQuery};
pub use slug::slugify;
