//! Authenticated-user extractor.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use domain::services::{IdentityError, IdentityUser};

use crate::app::AppState;
use crate::error::ApiError;
use crate::messages;
use crate::middleware::session::SessionUser;

/// The caller's identity-provider account.
///
/// Taken from the session middleware when the browser sent session cookies,
/// otherwise from an `Authorization: Bearer` access token validated against
/// the identity provider.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub IdentityUser);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(SessionUser(user)) = parts.extensions.get::<SessionUser>() {
            return Ok(CurrentUser(user.clone()));
        }

        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::Unauthorized(messages::UNAUTHORIZED.into()))?;

        match state.identity.get_user(token).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(IdentityError::InvalidCredentials | IdentityError::NotFound) => {
                Err(ApiError::Unauthorized(messages::UNAUTHORIZED.into()))
            }
            Err(IdentityError::NotConfigured(detail)) => {
                tracing::warn!(detail = %detail, "Identity provider not configured; treating caller as anonymous");
                Err(ApiError::Unauthorized(messages::UNAUTHORIZED.into()))
            }
            Err(other) => Err(other.into()),
        }
    }
}
