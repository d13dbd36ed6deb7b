//! Relational store abstraction used by the onboarding services.
//!
//! The production implementation lives in the persistence crate
//! (`PgBuildingStore`); [`crate::services::memory::InMemoryStore`] backs tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Building, BuildingInvite, BuildingMember, Document, NewBuildingInvite, NewBuildingMember,
    NewPendingInvite, NewProfile, NewSaga, PendingInvite, PlatformRole, Profile,
    ProfileContactUpdate, SagaRecord, SagaStatus, SagaUpdate,
};

/// Error type for relational store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Row not found")]
    NotFound,

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Foreign key violated: {0}")]
    MissingReference(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(db_err.to_string()),
                Some("23503") => StoreError::MissingReference(db_err.to_string()),
                _ => StoreError::Database(db_err.to_string()),
            },
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Every relational-store operation the services need.
///
/// Methods returning `u64` report the number of affected rows.
#[async_trait]
pub trait BuildingStore: Send + Sync {
    /// Cheap connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;

    // Profiles
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;
    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError>;
    async fn update_profile_role(&self, user_id: Uuid, role: PlatformRole) -> Result<u64, StoreError>;
    async fn update_profile_contact(
        &self,
        user_id: Uuid,
        update: ProfileContactUpdate,
    ) -> Result<Option<Profile>, StoreError>;
    /// Deletes a profile. The schema cascades memberships (and their message
    /// responses) and nulls creator/uploader references.
    async fn delete_profile(&self, user_id: Uuid) -> Result<u64, StoreError>;

    // Buildings and memberships
    async fn get_building(&self, building_id: Uuid) -> Result<Option<Building>, StoreError>;
    async fn find_membership(
        &self,
        building_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BuildingMember>, StoreError>;
    async fn list_memberships_for_user(&self, user_id: Uuid) -> Result<Vec<BuildingMember>, StoreError>;
    async fn insert_member(&self, member: NewBuildingMember) -> Result<BuildingMember, StoreError>;

    // Building invites
    async fn get_building_invite(&self, invite_id: Uuid) -> Result<Option<BuildingInvite>, StoreError>;
    async fn insert_building_invite(&self, invite: NewBuildingInvite) -> Result<BuildingInvite, StoreError>;
    async fn list_building_invites(&self, building_id: Uuid) -> Result<Vec<BuildingInvite>, StoreError>;
    async fn deactivate_building_invite(&self, invite_id: Uuid) -> Result<u64, StoreError>;
    /// Increments `uses_count` only while the invite is still usable at `now`.
    /// Returns 0 when the guard fails.
    async fn consume_building_invite(&self, invite_id: Uuid, now: DateTime<Utc>) -> Result<u64, StoreError>;

    // Pending invites
    /// Inserts or replaces the pending invite for `invite.email`.
    async fn upsert_pending_invite(&self, invite: NewPendingInvite) -> Result<PendingInvite, StoreError>;
    async fn find_pending_invite(&self, email: &str) -> Result<Option<PendingInvite>, StoreError>;
    async fn delete_pending_invites_by_email(&self, email: &str) -> Result<u64, StoreError>;

    // Documents
    async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>, StoreError>;

    // Sagas
    async fn insert_saga(&self, saga: NewSaga) -> Result<SagaRecord, StoreError>;
    async fn update_saga(&self, saga_id: Uuid, update: SagaUpdate) -> Result<(), StoreError>;
    async fn list_sagas(&self, status: SagaStatus, limit: i64) -> Result<Vec<SagaRecord>, StoreError>;
}
