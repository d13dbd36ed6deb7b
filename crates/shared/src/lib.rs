//! Shared utilities and common types for the Building Manager backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Locale-prefixed path handling
//! - Temporary password generation
//! - Common validation logic

pub mod locale;
pub mod password;
pub mod validation;
