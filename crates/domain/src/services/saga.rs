//! Persisted saga bookkeeping for multi-step onboarding flows.

use tracing::warn;
use uuid::Uuid;

use crate::models::{Compensation, NewSaga, SagaRecord, SagaStatus, SagaStep, SagaUpdate};
use crate::services::store::{BuildingStore, StoreError};

/// Handle on one saga row.
///
/// `advance` must succeed before the next external call is made. Terminal
/// transitions (`complete`, `fail`, `compensated`) are best-effort: the flow's
/// outcome is already decided when they run, so a failed write is only logged
/// and recovery picks the row up later.
pub struct SagaLog<'a> {
    store: &'a dyn BuildingStore,
    record: SagaRecord,
}

impl<'a> SagaLog<'a> {
    /// Inserts a new `in_progress` saga.
    pub async fn begin(store: &'a dyn BuildingStore, saga: NewSaga) -> Result<Self, StoreError> {
        let record = store.insert_saga(saga).await?;
        Ok(Self { store, record })
    }

    /// Wraps an existing row, used when resuming after a restart.
    pub fn resume(store: &'a dyn BuildingStore, record: SagaRecord) -> Self {
        Self { store, record }
    }

    pub fn id(&self) -> Uuid {
        self.record.id
    }

    pub fn record(&self) -> &SagaRecord {
        &self.record
    }

    /// Records the subject user once it is known.
    pub fn set_subject_user(&mut self, user_id: Uuid) {
        self.record.subject_user_id = Some(user_id);
    }

    /// Records the subject email once it is known.
    pub fn set_subject_email(&mut self, email: Option<String>) {
        self.record.subject_email = email;
    }

    /// Persists `step` as the next step to run, clearing any compensation.
    pub async fn advance(&mut self, step: SagaStep) -> Result<(), StoreError> {
        self.advance_with(step, None).await
    }

    /// Persists `step` together with the action that undoes it.
    pub async fn advance_with(
        &mut self,
        step: SagaStep,
        compensation: Option<Compensation>,
    ) -> Result<(), StoreError> {
        self.record.step = step;
        self.record.compensation = compensation;
        self.persist(SagaStatus::InProgress, None).await
    }

    pub async fn complete(mut self) {
        self.record.step = SagaStep::Done;
        self.record.compensation = None;
        self.finish(SagaStatus::Completed, None).await;
    }

    pub async fn fail(mut self, error: &str) {
        self.finish(SagaStatus::Failed, Some(error.to_string())).await;
    }

    pub async fn compensated(mut self, error: &str) {
        self.record.compensation = None;
        self.finish(SagaStatus::Compensated, Some(error.to_string())).await;
    }

    async fn finish(&mut self, status: SagaStatus, error: Option<String>) {
        if let Err(e) = self.persist(status, error).await {
            warn!(
                saga_id = %self.record.id,
                status = status.as_str(),
                error = %e,
                "Failed to record saga outcome"
            );
        }
    }

    async fn persist(&mut self, status: SagaStatus, error: Option<String>) -> Result<(), StoreError> {
        let update = SagaUpdate {
            step: self.record.step,
            status,
            subject_email: self.record.subject_email.clone(),
            subject_user_id: self.record.subject_user_id,
            compensation: self.record.compensation.clone(),
            last_error: error.clone(),
        };
        self.store.update_saga(self.record.id, update).await?;
        self.record.status = status;
        self.record.last_error = error;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SagaKind;
    use crate::services::memory::{InMemoryStore, StoreOperation};
    use serde_json::json;

    fn new_saga() -> NewSaga {
        NewSaga {
            kind: SagaKind::DeleteMember,
            subject_email: None,
            subject_user_id: Some(Uuid::new_v4()),
            step: SagaStep::ResolveEmail,
            payload: json!({}),
        }
    }

    #[tokio::test]
    async fn test_saga_lifecycle_is_persisted() {
        let store = InMemoryStore::new();
        let mut saga = SagaLog::begin(&store, new_saga()).await.unwrap();
        let id = saga.id();

        saga.set_subject_email(Some("gil@example.com".to_string()));
        saga.advance(SagaStep::DeletePendingInvites).await.unwrap();

        let row = store.saga(id).await.unwrap();
        assert_eq!(row.step, SagaStep::DeletePendingInvites);
        assert_eq!(row.status, SagaStatus::InProgress);
        assert_eq!(row.subject_email.as_deref(), Some("gil@example.com"));

        saga.complete().await;
        let row = store.saga(id).await.unwrap();
        assert_eq!(row.status, SagaStatus::Completed);
        assert_eq!(row.step, SagaStep::Done);
    }

    #[tokio::test]
    async fn test_compensation_recorded_and_cleared() {
        let store = InMemoryStore::new();
        let mut saga = SagaLog::begin(&store, new_saga()).await.unwrap();
        let id = saga.id();
        let user_id = Uuid::new_v4();

        saga.advance_with(
            SagaStep::CreateProfile,
            Some(Compensation::DeleteIdentityAccount { user_id }),
        )
        .await
        .unwrap();
        assert!(store.saga(id).await.unwrap().compensation.is_some());

        saga.compensated("profile insert failed").await;
        let row = store.saga(id).await.unwrap();
        assert_eq!(row.status, SagaStatus::Compensated);
        assert!(row.compensation.is_none());
        assert_eq!(row.last_error.as_deref(), Some("profile insert failed"));
    }

    #[tokio::test]
    async fn test_advance_propagates_store_errors() {
        let store = InMemoryStore::new();
        let mut saga = SagaLog::begin(&store, new_saga()).await.unwrap();
        store.fail_on(StoreOperation::UpdateSaga).await;

        assert!(saga.advance(SagaStep::DeleteProfile).await.is_err());
    }

    #[tokio::test]
    async fn test_terminal_write_failure_is_swallowed() {
        let store = InMemoryStore::new();
        let saga = SagaLog::begin(&store, new_saga()).await.unwrap();
        let id = saga.id();
        store.fail_on(StoreOperation::UpdateSaga).await;

        saga.fail("boom").await;
        assert_eq!(store.saga(id).await.unwrap().status, SagaStatus::InProgress);
    }
}
