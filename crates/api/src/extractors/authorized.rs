//! Role-checked extractor for privileged endpoints.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::services::{authorize, Capability, RoleRequirement};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::messages;

/// Capability for requirement `R`, checked in this order: admin credentials
/// configured (500), caller authenticated (401), role satisfied (403).
#[derive(Debug)]
pub struct Authorized<R: RoleRequirement>(pub Capability<R>);

#[async_trait]
impl<R: RoleRequirement> FromRequestParts<AppState> for Authorized<R> {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.identity.admin_configured() {
            tracing::error!("Privileged endpoint called without identity service key");
            return Err(ApiError::Configuration(messages::NOT_CONFIGURED.into()));
        }

        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        let capability = authorize::<R>(state.store.as_ref(), user.id).await?;
        Ok(Authorized(capability))
    }
}
