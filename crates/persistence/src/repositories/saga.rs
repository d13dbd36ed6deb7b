//! Onboarding saga repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{SagaEntity, SagaKindDb, SagaStatusDb};
use crate::metrics::QueryTimer;

const SAGA_COLUMNS: &str = "id, kind, subject_email, subject_user_id, step, status, compensation, payload, last_error, created_at, updated_at";

/// Column values written on every saga update.
#[derive(Debug, Clone)]
pub struct SagaStateInput<'a> {
    pub step: &'a str,
    pub status: SagaStatusDb,
    pub subject_email: Option<&'a str>,
    pub subject_user_id: Option<Uuid>,
    pub compensation: Option<serde_json::Value>,
    pub last_error: Option<&'a str>,
}

/// Repository for onboarding saga rows.
#[derive(Clone)]
pub struct SagaRepository {
    pool: PgPool,
}

impl SagaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a saga in `in_progress`.
    pub async fn create(
        &self,
        kind: SagaKindDb,
        subject_email: Option<&str>,
        subject_user_id: Option<Uuid>,
        step: &str,
        payload: &serde_json::Value,
    ) -> Result<SagaEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_saga");
        let result = sqlx::query_as::<_, SagaEntity>(&format!(
            r#"
            INSERT INTO onboarding_sagas (kind, subject_email, subject_user_id, step, status, payload)
            VALUES ($1, $2, $3, $4, 'in_progress', $5)
            RETURNING {}
            "#,
            SAGA_COLUMNS
        ))
        .bind(kind)
        .bind(subject_email)
        .bind(subject_user_id)
        .bind(step)
        .bind(payload)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Replace the mutable state of a saga. Returns the number of rows updated.
    pub async fn update(&self, id: Uuid, state: SagaStateInput<'_>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("update_saga");
        let result = sqlx::query(
            r#"
            UPDATE onboarding_sagas
            SET step = $2,
                status = $3,
                subject_email = $4,
                subject_user_id = $5,
                compensation = $6,
                last_error = $7,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(state.step)
        .bind(state.status)
        .bind(state.subject_email)
        .bind(state.subject_user_id)
        .bind(state.compensation)
        .bind(state.last_error)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected())
    }

    /// List sagas with a status, oldest first.
    pub async fn list_by_status(
        &self,
        status: SagaStatusDb,
        limit: i64,
    ) -> Result<Vec<SagaEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_sagas_by_status");
        let result = sqlx::query_as::<_, SagaEntity>(&format!(
            "SELECT {} FROM onboarding_sagas WHERE status = $1 ORDER BY created_at ASC LIMIT $2",
            SAGA_COLUMNS
        ))
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
