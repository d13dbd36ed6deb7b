//! Document entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the documents table.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentEntity {
    pub id: Uuid,
    pub building_id: Uuid,
    pub title: String,
    pub file_path: String,
    pub is_visible: bool,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<DocumentEntity> for domain::models::Document {
    fn from(entity: DocumentEntity) -> Self {
        Self {
            id: entity.id,
            building_id: entity.building_id,
            title: entity.title,
            file_path: entity.file_path,
            is_visible: entity.is_visible,
            uploaded_by: entity.uploaded_by,
            created_at: entity.created_at,
        }
    }
}
