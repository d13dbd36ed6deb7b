//! Document repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::DocumentEntity;
use crate::metrics::QueryTimer;

/// Repository for building documents.
#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a document by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DocumentEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_document_by_id");
        let result = sqlx::query_as::<_, DocumentEntity>(
            r#"
            SELECT id, building_id, title, file_path, is_visible, uploaded_by, created_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
