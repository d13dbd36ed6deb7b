//! Document domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A building document stored in the object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Document {
    pub id: Uuid,
    pub building_id: Uuid,
    pub title: String,
    /// Object path inside the documents bucket.
    pub file_path: String,
    /// Whether tenants (not only the committee) may download it.
    pub is_visible: bool,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Response for `GET /api/documents/:document_id/download`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDownloadResponse {
    pub url: String,
    pub expires_in: u64,
}
