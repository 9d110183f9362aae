//! HTTP route handlers.

pub mod admin;
pub mod admin_categories;
pub mod admin_certifications;
pub mod admin_professionals;
pub mod admin_users;
pub mod auth;
pub mod categories;
pub mod certifications;
pub mod contact_requests;
pub mod health;
pub mod professionals;
pub mod reviews;
pub mod schedule;
pub mod search;
pub mod services;
