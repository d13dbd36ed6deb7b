//! Request/response DTOs for the admin onboarding endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::role::{MemberRole, PlatformRole};

fn default_onboarding_role() -> MemberRole {
    MemberRole::Committee
}

/// Request body for `POST /api/admin/create-user`.
///
/// Also persisted as the add-member saga payload, so a recovery pass can
/// finish the membership insert without the original request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Full name must be between 1 and 100 characters"
    ))]
    pub full_name: String,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone2: Option<String>,

    pub building_id: Uuid,

    #[validate(custom(function = "shared::validation::validate_apartment_number"))]
    pub apartment_number: Option<String>,

    /// Per-building role (default: committee).
    #[serde(default = "default_onboarding_role")]
    pub role: MemberRole,
}

/// Response for `POST /api/admin/create-user`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub is_new_user: bool,
    pub message: String,
}

/// Query for `DELETE /api/admin/delete-user`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserQuery {
    pub user_id: Uuid,
}

/// Response for `DELETE /api/admin/delete-user`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
}

/// Request body for `POST /api/admin/update-role`.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub user_id: Uuid,
    pub role: PlatformRole,
}

/// Response for `POST /api/admin/update-role`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRoleResponse {
    pub success: bool,
    pub message: String,
}
