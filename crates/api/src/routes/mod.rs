//! HTTP route handlers.

pub mod admin_users;
pub mod auth;
pub mod documents;
pub mod health;
pub mod invites;
pub mod profile;
