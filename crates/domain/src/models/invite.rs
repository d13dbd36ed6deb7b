//! Building invite and pending invite domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::role::MemberRole;

/// Default lifetime of a building invite when none is requested.
pub const DEFAULT_INVITE_EXPIRY_HOURS: i64 = 168;

/// A shareable token granting join rights to one building.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BuildingInvite {
    pub id: Uuid,
    pub building_id: Uuid,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub uses_count: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Whether an invite can currently be redeemed, and if not, why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteAvailability {
    Available,
    Inactive,
    Expired,
    Exhausted,
}

impl InviteAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, InviteAvailability::Available)
    }
}

impl BuildingInvite {
    /// Evaluates the invite at `now`. Checks run in order: active flag,
    /// expiry, then the use cap (only when `max_uses` is set).
    pub fn availability(&self, now: DateTime<Utc>) -> InviteAvailability {
        if !self.is_active {
            return InviteAvailability::Inactive;
        }
        if matches!(self.expires_at, Some(expires_at) if expires_at <= now) {
            return InviteAvailability::Expired;
        }
        if matches!(self.max_uses, Some(max) if self.uses_count >= max) {
            return InviteAvailability::Exhausted;
        }
        InviteAvailability::Available
    }
}

/// Data for inserting a building invite.
#[derive(Debug, Clone)]
pub struct NewBuildingInvite {
    pub building_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub created_by: Uuid,
}

/// Request to create a building invite.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateBuildingInviteRequest {
    /// Hours until expiry (1-8760, default: 168). Ignored when `never_expires` is set.
    #[validate(range(
        min = 1,
        max = 8760,
        message = "expires_in_hours must be between 1 and 8760"
    ))]
    pub expires_in_hours: Option<i64>,

    #[serde(default)]
    pub never_expires: bool,

    /// Maximum uses (1-1000). Unlimited when absent.
    #[validate(range(min = 1, max = 1000, message = "max_uses must be between 1 and 1000"))]
    pub max_uses: Option<i32>,
}

/// Invite as returned by the management endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteSummary {
    #[serde(flatten)]
    pub invite: BuildingInvite,
    pub availability: InviteAvailability,
}

/// Response for listing a building's invites.
#[derive(Debug, Clone, Serialize)]
pub struct ListInvitesResponse {
    pub data: Vec<InviteSummary>,
}

/// Public preview of an invite (no authentication required).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicInviteInfo {
    pub invite_id: Uuid,
    pub building_id: Uuid,
    pub building_name: String,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InviteAvailability>,
}

/// Staged join request keyed by email, awaiting the invitee's first login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PendingInvite {
    pub id: Uuid,
    pub email: String,
    pub building_id: Uuid,
    pub invite_id: Uuid,
    pub apartment_number: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub default_role: MemberRole,
    pub created_at: DateTime<Utc>,
}

/// Data for staging a pending invite. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewPendingInvite {
    pub email: String,
    pub building_id: Uuid,
    pub invite_id: Uuid,
    pub apartment_number: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub default_role: MemberRole,
}

fn default_pending_role() -> MemberRole {
    MemberRole::Tenant
}

/// Request body for `POST /api/invites/pending`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct StagePendingInviteRequest {
    #[validate(email(message = "Invalid email address"))]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub user_email: String,

    pub building_id: Uuid,

    pub invite_id: Uuid,

    #[validate(custom(function = "shared::validation::validate_apartment_number"))]
    pub apartment_number: Option<String>,

    #[validate(length(max = 100, message = "Full name must be at most 100 characters"))]
    pub full_name: Option<String>,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    #[serde(default = "default_pending_role")]
    pub default_role: MemberRole,
}

/// Response after staging a pending invite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StagePendingInviteResponse {
    pub success: bool,
    pub pending_invite_id: Uuid,
    pub building_id: Uuid,
    pub message: String,
}
