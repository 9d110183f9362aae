//! Shared utilities and common types for the Ceres en Red backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Token generation and hashing
//! - Password hashing with Argon2id
//! - JWT access/refresh tokens
//! - Page-based pagination
//! - Field validators shared by request DTOs

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
