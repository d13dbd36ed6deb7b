//! Admin onboarding route handlers.

use axum::{extract::State, Json};
use domain::models::onboarding::{
    CreateUserRequest, CreateUserResponse, DeleteUserQuery, DeleteUserResponse,
    UpdateRoleRequest, UpdateRoleResponse,
};
use domain::models::saga::{ListSagasQuery, ListSagasResponse};
use domain::services::AdminOnly;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiQuery, Authorized, ValidatedJson};
use crate::messages;
use crate::middleware::record_onboarding_outcome;

fn outcome_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "error"
    }
}

/// Add a user to a building, creating the account when it does not exist.
///
/// POST /api/admin/create-user
pub async fn create_user(
    State(state): State<AppState>,
    Authorized(admin): Authorized<AdminOnly>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>, ApiError> {
    let result = state.onboarding().add_member(&admin, request).await;
    record_onboarding_outcome("add_member", outcome_label(&result));
    let outcome = result?;

    let message = match (outcome.is_new_user, outcome.recovery_link_sent) {
        (true, true) => messages::USER_CREATED,
        (true, false) => messages::USER_CREATED_NO_EMAIL,
        (false, _) => messages::USER_ADDED,
    };

    Ok(Json(CreateUserResponse {
        success: true,
        user_id: outcome.user_id,
        is_new_user: outcome.is_new_user,
        message: message.to_string(),
    }))
}

/// Delete a user: pending invites, profile (with cascades), then the account.
///
/// DELETE /api/admin/delete-user?userId=<uuid>
pub async fn delete_user(
    State(state): State<AppState>,
    Authorized(admin): Authorized<AdminOnly>,
    ApiQuery(query): ApiQuery<DeleteUserQuery>,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    let result = state.onboarding().delete_member(&admin, query.user_id).await;
    record_onboarding_outcome("delete_member", outcome_label(&result));
    result?;

    Ok(Json(DeleteUserResponse {
        success: true,
        message: messages::USER_DELETED.to_string(),
    }))
}

/// POST /api/admin/update-role
pub async fn update_role(
    State(state): State<AppState>,
    Authorized(admin): Authorized<AdminOnly>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> Result<Json<UpdateRoleResponse>, ApiError> {
    let result = state.onboarding().update_role(&admin, request).await;
    record_onboarding_outcome("update_role", outcome_label(&result));
    result?;

    Ok(Json(UpdateRoleResponse {
        success: true,
        message: messages::ROLE_UPDATED.to_string(),
    }))
}

/// Sagas by status (default `failed`) for manual follow-up.
///
/// GET /api/admin/sagas?status=failed&limit=50
pub async fn list_sagas(
    State(state): State<AppState>,
    Authorized(_admin): Authorized<AdminOnly>,
    ApiQuery(query): ApiQuery<ListSagasQuery>,
) -> Result<Json<ListSagasResponse>, ApiError> {
    let data = state.store.list_sagas(query.status(), query.limit()).await?;
    Ok(Json(ListSagasResponse { data }))
}
