//! Domain layer for the Ceres en Red backend.
//!
//! This crate contains:
//! - Domain models and request DTOs (users, professionals, taxonomy, reviews)
//! - Background job payloads
//! - Pure services: search ranking, rating aggregation, slugs

pub mod models;
pub mod services;
