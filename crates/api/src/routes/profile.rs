//! Own-profile handlers.

use axum::{extract::State, Json};
use domain::models::profile::{MeResponse, Profile, UpdateProfileRequest};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{CurrentUser, ValidatedJson};
use crate::messages;

/// GET /api/me
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeResponse>, ApiError> {
    let profile = state.store.get_profile(user.id).await?;
    let memberships = state.store.list_memberships_for_user(user.id).await?;

    Ok(Json(MeResponse {
        email: user.email,
        profile,
        memberships,
    }))
}

/// Update the caller's own name and phone; omitted fields are kept.
///
/// PATCH /api/profile
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let profile = state
        .store
        .update_profile_contact(user.id, request.into())
        .await?
        .ok_or_else(|| ApiError::NotFound(messages::USER_NOT_FOUND.into()))?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(profile))
}
