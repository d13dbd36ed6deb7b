//! Identity provider abstraction.
//!
//! The hosted auth service issues sessions and owns user accounts. The
//! production client lives in the api crate; [`crate::services::memory::MockIdentityProvider`]
//! backs tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for identity provider operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity provider is not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid or expired credentials")]
    InvalidCredentials,

    #[error("Identity account not found")]
    NotFound,

    #[error("Identity account already exists: {0}")]
    AlreadyExists(String),

    #[error("Identity provider error: {0}")]
    Upstream(String),
}

/// An identity-provider account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl IdentityUser {
    /// Full name from user metadata, if the provider recorded one.
    pub fn metadata_full_name(&self) -> Option<String> {
        self.user_metadata
            .get("full_name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

/// Tokens issued by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires.
    pub expires_in: i64,
    pub user: IdentityUser,
}

/// Data for administrative account creation.
#[derive(Debug, Clone)]
pub struct NewIdentityUser {
    pub email: String,
    pub password: String,
    /// Mark the email as confirmed so no verification mail is sent.
    pub email_confirmed: bool,
    pub user_metadata: serde_json::Value,
}

/// Operations against the hosted identity provider.
///
/// Session methods use the public key; admin methods require the privileged
/// service key and return [`IdentityError::NotConfigured`] without it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether the privileged admin credentials are present.
    fn admin_configured(&self) -> bool;

    /// Validates an access token and returns its user.
    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError>;

    /// Exchanges a refresh token for a new session (tokens rotate).
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, IdentityError>;

    /// Exchanges an authorization code from an email link or OAuth redirect.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Session, IdentityError>;

    /// Revokes the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<IdentityUser>, IdentityError>;

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<IdentityUser>, IdentityError>;

    async fn create_user(&self, user: NewIdentityUser) -> Result<IdentityUser, IdentityError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError>;

    /// Has the provider email a password-recovery link that lands on
    /// `redirect_to`.
    async fn send_recovery_email(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError>;
}
