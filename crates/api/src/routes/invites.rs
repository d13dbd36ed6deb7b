//! Building invite routes: staging by email, public preview, and management
//! by building managers.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use domain::models::invite::{
    CreateBuildingInviteRequest, InviteSummary, ListInvitesResponse, NewBuildingInvite,
    PublicInviteInfo, StagePendingInviteRequest, StagePendingInviteResponse,
    DEFAULT_INVITE_EXPIRY_HOURS,
};
use domain::services::authorize_building_manager;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, CurrentUser, ValidatedJson};
use crate::messages;
use crate::middleware::record_onboarding_outcome;

/// Stage an invite for an email that will sign up later.
///
/// POST /api/invites/pending
///
/// No session is required: the invitee has no account yet. The invite is
/// re-validated server-side before anything is written.
pub async fn stage_pending_invite(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<StagePendingInviteRequest>,
) -> Result<Json<StagePendingInviteResponse>, ApiError> {
    let result = state
        .onboarding()
        .stage_pending_invite(request, Utc::now())
        .await;
    record_onboarding_outcome(
        "stage_invite",
        if result.is_ok() { "success" } else { "error" },
    );
    let pending = result?;

    Ok(Json(StagePendingInviteResponse {
        success: true,
        pending_invite_id: pending.id,
        building_id: pending.building_id,
        message: messages::PENDING_INVITE_SAVED.to_string(),
    }))
}

/// Public preview of an invite link.
///
/// GET /api/invites/:invite_id
pub async fn get_public_invite(
    State(state): State<AppState>,
    ApiPath(invite_id): ApiPath<Uuid>,
) -> Result<Json<PublicInviteInfo>, ApiError> {
    let invite = state
        .store
        .get_building_invite(invite_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(messages::INVITE_NOT_FOUND.into()))?;

    let building = state
        .store
        .get_building(invite.building_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(messages::BUILDING_NOT_FOUND.into()))?;

    let availability = invite.availability(Utc::now());
    Ok(Json(PublicInviteInfo {
        invite_id: invite.id,
        building_id: building.id,
        building_name: building.name,
        is_valid: availability.is_available(),
        reason: (!availability.is_available()).then_some(availability),
    }))
}

/// Create an invite link for a building.
///
/// POST /api/buildings/:building_id/invites
///
/// Admins and the building's committee only. Expiry defaults to seven days
/// unless `never_expires` is set.
pub async fn create_building_invite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(building_id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateBuildingInviteRequest>,
) -> Result<(StatusCode, Json<InviteSummary>), ApiError> {
    let capability = authorize_building_manager(state.store.as_ref(), user.id, building_id).await?;

    let now = Utc::now();
    let expires_at = if request.never_expires {
        None
    } else {
        Some(now + Duration::hours(request.expires_in_hours.unwrap_or(DEFAULT_INVITE_EXPIRY_HOURS)))
    };

    let invite = state
        .store
        .insert_building_invite(NewBuildingInvite {
            building_id: capability.building_id(),
            expires_at,
            max_uses: request.max_uses,
            created_by: capability.user_id(),
        })
        .await?;

    info!(
        building_id = %building_id,
        invite_id = %invite.id,
        user_id = %user.id,
        access = ?capability.access(),
        "Building invite created"
    );

    let availability = invite.availability(now);
    Ok((
        StatusCode::CREATED,
        Json(InviteSummary {
            invite,
            availability,
        }),
    ))
}

/// GET /api/buildings/:building_id/invites
pub async fn list_building_invites(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(building_id): ApiPath<Uuid>,
) -> Result<Json<ListInvitesResponse>, ApiError> {
    authorize_building_manager(state.store.as_ref(), user.id, building_id).await?;

    let now = Utc::now();
    let data = state
        .store
        .list_building_invites(building_id)
        .await?
        .into_iter()
        .map(|invite| InviteSummary {
            availability: invite.availability(now),
            invite,
        })
        .collect();

    Ok(Json(ListInvitesResponse { data }))
}

/// DELETE /api/buildings/:building_id/invites/:invite_id
pub async fn deactivate_building_invite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath((building_id, invite_id)): ApiPath<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    authorize_building_manager(state.store.as_ref(), user.id, building_id).await?;

    let invite = state
        .store
        .get_building_invite(invite_id)
        .await?
        .filter(|invite| invite.building_id == building_id)
        .ok_or_else(|| ApiError::NotFound(messages::INVITE_NOT_FOUND.into()))?;

    state.store.deactivate_building_invite(invite.id).await?;
    info!(building_id = %building_id, invite_id = %invite_id, user_id = %user.id, "Building invite deactivated");

    Ok(StatusCode::NO_CONTENT)
}
