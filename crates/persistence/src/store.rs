//! PostgreSQL implementation of [`BuildingStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{
    Building, BuildingInvite, BuildingMember, Document, NewBuildingInvite, NewBuildingMember,
    NewPendingInvite, NewProfile, NewSaga, PendingInvite, PlatformRole, Profile,
    ProfileContactUpdate, SagaRecord, SagaStatus, SagaUpdate,
};
use domain::services::{BuildingStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repositories::{
    BuildingRepository, DocumentRepository, InviteRepository, MemberInput, PendingInviteInput,
    ProfileRepository, SagaRepository, SagaStateInput,
};

/// Relational store backed by the per-table repositories.
#[derive(Clone)]
pub struct PgBuildingStore {
    pool: PgPool,
    profiles: ProfileRepository,
    buildings: BuildingRepository,
    invites: InviteRepository,
    documents: DocumentRepository,
    sagas: SagaRepository,
}

impl PgBuildingStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            profiles: ProfileRepository::new(pool.clone()),
            buildings: BuildingRepository::new(pool.clone()),
            invites: InviteRepository::new(pool.clone()),
            documents: DocumentRepository::new(pool.clone()),
            sagas: SagaRepository::new(pool.clone()),
            pool,
        }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BuildingStore for PgBuildingStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.find_by_id(user_id).await?.map(Into::into))
    }

    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        let entity = self
            .profiles
            .create(
                profile.id,
                profile.full_name.as_deref(),
                profile.phone.as_deref(),
                profile.role.into(),
            )
            .await?;
        Ok(entity.into())
    }

    async fn update_profile_role(&self, user_id: Uuid, role: PlatformRole) -> Result<u64, StoreError> {
        Ok(self.profiles.update_role(user_id, role.into()).await?)
    }

    async fn update_profile_contact(
        &self,
        user_id: Uuid,
        update: ProfileContactUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        let entity = self
            .profiles
            .update_contact(user_id, update.full_name.as_deref(), update.phone.as_deref())
            .await?;
        Ok(entity.map(Into::into))
    }

    async fn delete_profile(&self, user_id: Uuid) -> Result<u64, StoreError> {
        Ok(self.profiles.delete(user_id).await?)
    }

    async fn get_building(&self, building_id: Uuid) -> Result<Option<Building>, StoreError> {
        Ok(self.buildings.find_by_id(building_id).await?.map(Into::into))
    }

    async fn find_membership(
        &self,
        building_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BuildingMember>, StoreError> {
        Ok(self
            .buildings
            .find_member(building_id, user_id)
            .await?
            .map(Into::into))
    }

    async fn list_memberships_for_user(&self, user_id: Uuid) -> Result<Vec<BuildingMember>, StoreError> {
        let entities = self.buildings.list_members_for_user(user_id).await?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn insert_member(&self, member: NewBuildingMember) -> Result<BuildingMember, StoreError> {
        let entity = self
            .buildings
            .add_member(MemberInput {
                building_id: member.building_id,
                user_id: member.user_id,
                role: member.role.into(),
                apartment_number: member.apartment_number.as_deref(),
                full_name: member.full_name.as_deref(),
                phone: member.phone.as_deref(),
                phone2: member.phone2.as_deref(),
                email: member.email.as_deref(),
            })
            .await?;
        Ok(entity.into())
    }

    async fn get_building_invite(&self, invite_id: Uuid) -> Result<Option<BuildingInvite>, StoreError> {
        Ok(self.invites.find_by_id(invite_id).await?.map(Into::into))
    }

    async fn insert_building_invite(&self, invite: NewBuildingInvite) -> Result<BuildingInvite, StoreError> {
        let entity = self
            .invites
            .create_invite(
                invite.building_id,
                invite.expires_at,
                invite.max_uses,
                invite.created_by,
            )
            .await?;
        Ok(entity.into())
    }

    async fn list_building_invites(&self, building_id: Uuid) -> Result<Vec<BuildingInvite>, StoreError> {
        let entities = self.invites.list_for_building(building_id).await?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    async fn deactivate_building_invite(&self, invite_id: Uuid) -> Result<u64, StoreError> {
        Ok(self.invites.deactivate(invite_id).await?)
    }

    async fn consume_building_invite(&self, invite_id: Uuid, now: DateTime<Utc>) -> Result<u64, StoreError> {
        Ok(self.invites.consume(invite_id, now).await?)
    }

    async fn upsert_pending_invite(&self, invite: NewPendingInvite) -> Result<PendingInvite, StoreError> {
        let entity = self
            .invites
            .upsert_pending(PendingInviteInput {
                email: &invite.email,
                building_id: invite.building_id,
                invite_id: invite.invite_id,
                apartment_number: invite.apartment_number.as_deref(),
                full_name: invite.full_name.as_deref(),
                phone: invite.phone.as_deref(),
                default_role: invite.default_role.into(),
            })
            .await?;
        Ok(entity.into())
    }

    async fn find_pending_invite(&self, email: &str) -> Result<Option<PendingInvite>, StoreError> {
        Ok(self.invites.find_pending_by_email(email).await?.map(Into::into))
    }

    async fn delete_pending_invites_by_email(&self, email: &str) -> Result<u64, StoreError> {
        Ok(self.invites.delete_pending_by_email(email).await?)
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>, StoreError> {
        Ok(self.documents.find_by_id(document_id).await?.map(Into::into))
    }

    async fn insert_saga(&self, saga: NewSaga) -> Result<SagaRecord, StoreError> {
        let entity = self
            .sagas
            .create(
                saga.kind.into(),
                saga.subject_email.as_deref(),
                saga.subject_user_id,
                saga.step.as_str(),
                &saga.payload,
            )
            .await?;
        entity.try_into()
    }

    async fn update_saga(&self, saga_id: Uuid, update: SagaUpdate) -> Result<(), StoreError> {
        let compensation = update
            .compensation
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Database(format!("Invalid saga compensation: {}", e)))?;

        let updated = self
            .sagas
            .update(
                saga_id,
                SagaStateInput {
                    step: update.step.as_str(),
                    status: update.status.into(),
                    subject_email: update.subject_email.as_deref(),
                    subject_user_id: update.subject_user_id,
                    compensation,
                    last_error: update.last_error.as_deref(),
                },
            )
            .await?;
        if updated == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_sagas(&self, status: SagaStatus, limit: i64) -> Result<Vec<SagaRecord>, StoreError> {
        self.sagas
            .list_by_status(status.into(), limit)
            .await?
            .into_iter()
            .map(SagaRecord::try_from)
            .collect()
    }
}
