//! Profile domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::member::BuildingMember;
use super::role::PlatformRole;

/// Platform-wide user record, keyed by the identity-provider user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: PlatformRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for inserting a profile.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: PlatformRole,
}

/// Self-service contact update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileContactUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Request body for `PATCH /api/profile`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateProfileRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Full name must be between 1 and 100 characters"
    ))]
    pub full_name: Option<String>,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileContactUpdate {
    fn from(request: UpdateProfileRequest) -> Self {
        Self {
            full_name: request.full_name.map(|n| n.trim().to_string()),
            phone: request.phone.map(|p| p.trim().to_string()),
        }
    }
}

/// Response for `GET /api/me`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MeResponse {
    pub email: Option<String>,
    pub profile: Option<Profile>,
    pub memberships: Vec<BuildingMember>,
}
