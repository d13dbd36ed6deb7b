//! Document download handler.

use axum::{extract::State, Json};
use domain::models::document::DocumentDownloadResponse;
use domain::services::authorize_document_read;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ApiPath, CurrentUser};
use crate::messages;

/// Signed, time-limited URL for a building document.
///
/// GET /api/documents/:document_id/download
///
/// Admins and the building's committee may read every document; other
/// members only visible ones.
pub async fn download_document(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(document_id): ApiPath<Uuid>,
) -> Result<Json<DocumentDownloadResponse>, ApiError> {
    let document = state
        .store
        .get_document(document_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(messages::DOCUMENT_NOT_FOUND.into()))?;

    authorize_document_read(state.store.as_ref(), user.id, &document).await?;

    let ttl = state.config.storage.signed_url_ttl_secs;
    let url = state
        .storage
        .create_signed_url(&state.config.storage.documents_bucket, &document.file_path, ttl)
        .await?;

    tracing::debug!(document_id = %document_id, user_id = %user.id, "Signed document URL issued");

    Ok(Json(DocumentDownloadResponse {
        url,
        expires_in: ttl,
    }))
}
