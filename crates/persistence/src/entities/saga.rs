//! Onboarding saga entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Compensation, SagaKind, SagaRecord, SagaStatus, SagaStep};
use domain::services::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for saga_kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "saga_kind", rename_all = "snake_case")]
pub enum SagaKindDb {
    AddMember,
    DeleteMember,
}

impl From<SagaKindDb> for SagaKind {
    fn from(db: SagaKindDb) -> Self {
        match db {
            SagaKindDb::AddMember => SagaKind::AddMember,
            SagaKindDb::DeleteMember => SagaKind::DeleteMember,
        }
    }
}

impl From<SagaKind> for SagaKindDb {
    fn from(kind: SagaKind) -> Self {
        match kind {
            SagaKind::AddMember => SagaKindDb::AddMember,
            SagaKind::DeleteMember => SagaKindDb::DeleteMember,
        }
    }
}

/// Database enum for saga_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "saga_status", rename_all = "snake_case")]
pub enum SagaStatusDb {
    InProgress,
    Completed,
    Failed,
    Compensated,
}

impl From<SagaStatusDb> for SagaStatus {
    fn from(db: SagaStatusDb) -> Self {
        match db {
            SagaStatusDb::InProgress => SagaStatus::InProgress,
            SagaStatusDb::Completed => SagaStatus::Completed,
            SagaStatusDb::Failed => SagaStatus::Failed,
            SagaStatusDb::Compensated => SagaStatus::Compensated,
        }
    }
}

impl From<SagaStatus> for SagaStatusDb {
    fn from(status: SagaStatus) -> Self {
        match status {
            SagaStatus::InProgress => SagaStatusDb::InProgress,
            SagaStatus::Completed => SagaStatusDb::Completed,
            SagaStatus::Failed => SagaStatusDb::Failed,
            SagaStatus::Compensated => SagaStatusDb::Compensated,
        }
    }
}

/// Database row mapping for the onboarding_sagas table.
///
/// `step` is stored as text; `compensation` as JSONB.
#[derive(Debug, Clone, FromRow)]
pub struct SagaEntity {
    pub id: Uuid,
    pub kind: SagaKindDb,
    pub subject_email: Option<String>,
    pub subject_user_id: Option<Uuid>,
    pub step: String,
    pub status: SagaStatusDb,
    pub compensation: Option<serde_json::Value>,
    pub payload: serde_json::Value,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SagaEntity> for SagaRecord {
    type Error = StoreError;

    fn try_from(entity: SagaEntity) -> Result<Self, Self::Error> {
        let step: SagaStep = entity.step.parse().map_err(StoreError::Database)?;
        let compensation = entity
            .compensation
            .map(serde_json::from_value::<Compensation>)
            .transpose()
            .map_err(|e| StoreError::Database(format!("Invalid saga compensation: {}", e)))?;

        Ok(Self {
            id: entity.id,
            kind: entity.kind.into(),
            subject_email: entity.subject_email,
            subject_user_id: entity.subject_user_id,
            step,
            status: entity.status.into(),
            compensation,
            payload: entity.payload,
            last_error: entity.last_error,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(step: &str, compensation: Option<serde_json::Value>) -> SagaEntity {
        SagaEntity {
            id: Uuid::new_v4(),
            kind: SagaKindDb::AddMember,
            subject_email: Some("a@example.com".to_string()),
            subject_user_id: None,
            step: step.to_string(),
            status: SagaStatusDb::InProgress,
            compensation,
            payload: json!({}),
            last_error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_to_record() {
        let user_id = Uuid::new_v4();
        let record = SagaRecord::try_from(entity(
            "create_profile",
            Some(json!({"action": "delete_identity_account", "user_id": user_id})),
        ))
        .unwrap();

        assert_eq!(record.step, SagaStep::CreateProfile);
        assert_eq!(
            record.compensation,
            Some(Compensation::DeleteIdentityAccount { user_id })
        );
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(SagaRecord::try_from(entity("teleport", None)).is_err());
    }
}
