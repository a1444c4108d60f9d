//! Shared utilities and common types for the Auto Shop Manager backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Role-string parsing (active/inactive/test variants)
//! - Verification of hosted-auth access tokens
//! - Common validation logic
//! - Cursor pagination and small crypto helpers

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod roles;
pub mod validation;
