use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::InviteAvailability;
use domain::services::{
    AuthorizationError, IdentityError, OnboardingError, StorageError, StoreError,
    ValidationFailure,
};
use serde::Serialize;
use thiserror::Error;

use crate::messages;

/// Error returned by every handler.
///
/// Variants carry the user-facing message; internal detail is logged where
/// the error is converted and never reaches the response body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Rendered as 400 with error code `conflict`.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid fields")]
    InvalidFields(Vec<ValidationDetail>),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::Validation(_) | ApiError::InvalidFields(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Upstream(_) | ApiError::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) | ApiError::InvalidFields(_) => "validation_error",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Configuration(_) => "configuration_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.code().to_string();
        let (message, details) = match self {
            ApiError::InvalidFields(details) => (messages::VALIDATION.to_string(), Some(details)),
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg)
            | ApiError::Upstream(msg)
            | ApiError::Configuration(msg)
            | ApiError::ServiceUnavailable(msg) => (msg, None),
        };

        let body = ErrorBody {
            success: false,
            error,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();

        ApiError::InvalidFields(details)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound(messages::NOT_FOUND.into()),
            other => {
                tracing::error!(error = %other, "Store operation failed");
                ApiError::Upstream(messages::SERVER_ERROR.into())
            }
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotConfigured(detail) => {
                tracing::error!(detail = %detail, "Identity provider is not configured");
                ApiError::Configuration(messages::NOT_CONFIGURED.into())
            }
            IdentityError::InvalidCredentials => {
                ApiError::Unauthorized(messages::UNAUTHORIZED.into())
            }
            IdentityError::NotFound => ApiError::NotFound(messages::USER_NOT_FOUND.into()),
            other => {
                tracing::error!(error = %other, "Identity provider call failed");
                ApiError::Upstream(messages::IDENTITY_FAILED.into())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(path) => {
                tracing::warn!(path = %path, "Document object missing from storage");
                ApiError::NotFound(messages::DOCUMENT_NOT_FOUND.into())
            }
            StorageError::NotConfigured(detail) => {
                tracing::error!(detail = %detail, "Object storage is not configured");
                ApiError::Configuration(messages::NOT_CONFIGURED.into())
            }
            StorageError::Upstream(detail) => {
                tracing::error!(error = %detail, "Signed URL request failed");
                ApiError::Upstream(messages::STORAGE_FAILED.into())
            }
        }
    }
}

impl From<AuthorizationError> for ApiError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::Store(store_err) => store_err.into(),
            denied => {
                tracing::info!(reason = %denied, "Authorization denied");
                ApiError::Forbidden(messages::FORBIDDEN.into())
            }
        }
    }
}

fn availability_message(availability: InviteAvailability) -> &'static str {
    match availability {
        InviteAvailability::Inactive | InviteAvailability::Available => messages::INVITE_INACTIVE,
        InviteAvailability::Expired => messages::INVITE_EXPIRED,
        InviteAvailability::Exhausted => messages::INVITE_EXHAUSTED,
    }
}

impl From<OnboardingError> for ApiError {
    fn from(err: OnboardingError) -> Self {
        match err {
            OnboardingError::Validation(failure) => ApiError::Validation(
                match failure {
                    ValidationFailure::SelfDeletion => messages::SELF_DELETION,
                    ValidationFailure::SelfRoleChange => messages::SELF_ROLE_CHANGE,
                    ValidationFailure::RoleNotAssignable(_) => messages::ROLE_NOT_ASSIGNABLE,
                    ValidationFailure::InviteBuildingMismatch => messages::INVITE_BUILDING_MISMATCH,
                }
                .into(),
            ),
            OnboardingError::AlreadyMember { .. } => {
                ApiError::Conflict(messages::ALREADY_MEMBER.into())
            }
            OnboardingError::BuildingNotFound(_) => {
                ApiError::NotFound(messages::BUILDING_NOT_FOUND.into())
            }
            OnboardingError::InviteNotFound => {
                ApiError::NotFound(messages::INVITE_NOT_FOUND.into())
            }
            OnboardingError::InviteUnavailable(availability) => {
                ApiError::Conflict(availability_message(availability).into())
            }
            OnboardingError::ProfileNotFound(_) => {
                ApiError::NotFound(messages::USER_NOT_FOUND.into())
            }
            OnboardingError::NotConfigured(detail) => {
                tracing::error!(detail = %detail, "Admin identity credentials missing");
                ApiError::Configuration(messages::NOT_CONFIGURED.into())
            }
            OnboardingError::ProfileCreation { compensated, source } => {
                tracing::error!(error = %source, compensated, "Profile creation failed");
                ApiError::Upstream(messages::PROFILE_CREATION_FAILED.into())
            }
            OnboardingError::MembershipNotCreated {
                user_id,
                building_id,
                is_new_user,
                source,
            } => {
                tracing::error!(
                    user_id = %user_id,
                    building_id = %building_id,
                    is_new_user,
                    error = %source,
                    "Membership insert failed after account setup"
                );
                let message = if is_new_user {
                    messages::MEMBERSHIP_NOT_CREATED
                } else {
                    messages::MEMBERSHIP_NOT_ADDED
                };
                ApiError::Upstream(message.into())
            }
            OnboardingError::Identity { step, source } => {
                tracing::error!(step, error = %source, "Identity provider step failed");
                ApiError::Upstream(messages::IDENTITY_FAILED.into())
            }
            OnboardingError::Store { step, source } => {
                tracing::error!(step, error = %source, "Store step failed");
                ApiError::Upstream(messages::SERVER_ERROR.into())
            }
            OnboardingError::Password(source) => {
                tracing::error!(error = %source, "Temporary password generation failed");
                ApiError::Configuration(messages::NOT_CONFIGURED.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Upstream("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::Configuration("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_conflict_body_shape() {
        let response = ApiError::Conflict(messages::ALREADY_MEMBER.into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "conflict");
        assert_eq!(body["message"], messages::ALREADY_MEMBER);
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_validation_errors_carry_details() {
        use validator::Validate;

        #[derive(Validate)]
        struct Input {
            #[validate(email(message = "Invalid email address"))]
            email: String,
        }

        let errors = Input {
            email: "nope".into(),
        }
        .validate()
        .unwrap_err();
        let response = ApiError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "email");
        assert_eq!(body["details"][0]["message"], "Invalid email address");
    }

    #[test]
    fn test_onboarding_error_mapping() {
        let conflict: ApiError = OnboardingError::AlreadyMember {
            building_id: Uuid::new_v4(),
        }
        .into();
        assert!(matches!(conflict, ApiError::Conflict(ref m) if m == messages::ALREADY_MEMBER));

        let missing: ApiError = OnboardingError::ProfileNotFound(Uuid::new_v4()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let config: ApiError = OnboardingError::NotConfigured("service key".into()).into();
        assert!(matches!(config, ApiError::Configuration(_)));

        let partial: ApiError = OnboardingError::MembershipNotCreated {
            user_id: Uuid::new_v4(),
            building_id: Uuid::new_v4(),
            is_new_user: true,
            source: StoreError::Database("boom".into()),
        }
        .into();
        assert!(
            matches!(partial, ApiError::Upstream(ref m) if m == messages::MEMBERSHIP_NOT_CREATED)
        );

        let existing: ApiError = OnboardingError::MembershipNotCreated {
            user_id: Uuid::new_v4(),
            building_id: Uuid::new_v4(),
            is_new_user: false,
            source: StoreError::Database("boom".into()),
        }
        .into();
        assert!(
            matches!(existing, ApiError::Upstream(ref m) if m == messages::MEMBERSHIP_NOT_ADDED)
        );

        let exhausted: ApiError =
            OnboardingError::InviteUnavailable(InviteAvailability::Exhausted).into();
        assert!(matches!(exhausted, ApiError::Conflict(ref m) if m == messages::INVITE_EXHAUSTED));

        let self_delete: ApiError =
            OnboardingError::Validation(ValidationFailure::SelfDeletion).into();
        assert!(matches!(self_delete, ApiError::Validation(ref m) if m == messages::SELF_DELETION));
    }

    #[test]
    fn test_upstream_detail_not_exposed() {
        let err: ApiError = StoreError::Database("relation \"profiles\" does not exist".into()).into();
        match err {
            ApiError::Upstream(msg) => assert!(!msg.contains("profiles")),
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn test_authorization_error_mapping() {
        let denied: ApiError = AuthorizationError::MissingProfile(Uuid::new_v4()).into();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let store: ApiError = AuthorizationError::Store(StoreError::NotFound).into();
        assert_eq!(store.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_identity_error_mapping() {
        let err: ApiError = IdentityError::InvalidCredentials.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        let err: ApiError = IdentityError::Upstream("503".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
