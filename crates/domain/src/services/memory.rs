//! In-memory service implementations for development and testing.
//!
//! [`InMemoryStore`] mirrors the relational schema's constraints (unique
//! memberships, foreign keys, delete cascades) closely enough for the
//! onboarding flows to behave as they do against Postgres. Both mocks can be
//! told to fail specific operations.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    Building, BuildingInvite, BuildingMember, Document, MemberRole, NewBuildingInvite,
    NewBuildingMember, NewPendingInvite, NewProfile, NewSaga, PendingInvite, PlatformRole, Profile,
    ProfileContactUpdate, SagaRecord, SagaStatus, SagaUpdate,
};
use crate::services::identity::{
    IdentityError, IdentityProvider, IdentityUser, NewIdentityUser, Session,
};
use crate::services::storage::{ObjectStorage, StorageError};
use crate::services::store::{BuildingStore, StoreError};

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Ping,
    InsertProfile,
    UpdateProfile,
    DeleteProfile,
    InsertMember,
    InsertInvite,
    ConsumeInvite,
    UpsertPendingInvite,
    DeletePendingInvites,
    InsertSaga,
    UpdateSaga,
}

#[derive(Debug, Default)]
struct StoreState {
    profiles: HashMap<Uuid, Profile>,
    buildings: HashMap<Uuid, Building>,
    members: Vec<BuildingMember>,
    invites: HashMap<Uuid, BuildingInvite>,
    pending: HashMap<String, PendingInvite>,
    documents: HashMap<Uuid, Document>,
    sagas: Vec<SagaRecord>,
    writes: usize,
}

/// Relational store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    failures: RwLock<HashSet<StoreOperation>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `operation` fail with a database error.
    pub async fn fail_on(&self, operation: StoreOperation) {
        self.failures.write().await.insert(operation);
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    async fn check(&self, operation: StoreOperation) -> Result<(), StoreError> {
        if self.failures.read().await.contains(&operation) {
            tracing::warn!(?operation, "In-memory store simulating failure");
            return Err(StoreError::Database(format!("simulated {:?} failure", operation)));
        }
        Ok(())
    }

    // Seeding helpers bypass failure injection and the write counter.

    pub async fn seed_profile(&self, role: PlatformRole) -> Profile {
        self.seed_profile_for(Uuid::new_v4(), role).await
    }

    pub async fn seed_profile_for(&self, user_id: Uuid, role: PlatformRole) -> Profile {
        let now = Utc::now();
        let profile = Profile {
            id: user_id,
            full_name: None,
            phone: None,
            role,
            created_at: now,
            updated_at: now,
        };
        self.state
            .write()
            .await
            .profiles
            .insert(user_id, profile.clone());
        profile
    }

    pub async fn seed_building(&self, name: &str) -> Building {
        let building = Building {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: None,
            is_approved: true,
            created_by: None,
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .buildings
            .insert(building.id, building.clone());
        building
    }

    pub async fn seed_member(&self, building_id: Uuid, user_id: Uuid, role: MemberRole) -> BuildingMember {
        let member = BuildingMember {
            id: Uuid::new_v4(),
            building_id,
            user_id,
            role,
            apartment_number: None,
            full_name: None,
            phone: None,
            phone2: None,
            email: None,
            created_at: Utc::now(),
        };
        self.state.write().await.members.push(member.clone());
        member
    }

    pub async fn seed_document(&self, building_id: Uuid, file_path: &str, is_visible: bool) -> Document {
        let document = Document {
            id: Uuid::new_v4(),
            building_id,
            title: file_path.to_string(),
            file_path: file_path.to_string(),
            is_visible,
            uploaded_by: None,
            created_at: Utc::now(),
        };
        self.state
            .write()
            .await
            .documents
            .insert(document.id, document.clone());
        document
    }

    // Inspection helpers.

    pub async fn profile(&self, user_id: Uuid) -> Option<Profile> {
        self.state.read().await.profiles.get(&user_id).cloned()
    }

    pub async fn members_for(&self, user_id: Uuid) -> Vec<BuildingMember> {
        self.state
            .read()
            .await
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn pending(&self, email: &str) -> Option<PendingInvite> {
        self.state.read().await.pending.get(email).cloned()
    }

    pub async fn invite(&self, invite_id: Uuid) -> Option<BuildingInvite> {
        self.state.read().await.invites.get(&invite_id).cloned()
    }

    pub async fn saga(&self, saga_id: Uuid) -> Option<SagaRecord> {
        self.state
            .read()
            .await
            .sagas
            .iter()
            .find(|s| s.id == saga_id)
            .cloned()
    }

    pub async fn sagas(&self) -> Vec<SagaRecord> {
        self.state.read().await.sagas.clone()
    }

    /// Number of successful mutations, saga rows included.
    pub async fn write_count(&self) -> usize {
        self.state.read().await.writes
    }
}

#[async_trait]
impl BuildingStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check(StoreOperation::Ping).await
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.profile(user_id).await)
    }

    async fn insert_profile(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        self.check(StoreOperation::InsertProfile).await?;
        let mut state = self.state.write().await;
        if state.profiles.contains_key(&profile.id) {
            return Err(StoreError::Conflict("profiles_pkey".to_string()));
        }
        let now = Utc::now();
        let row = Profile {
            id: profile.id,
            full_name: profile.full_name,
            phone: profile.phone,
            role: profile.role,
            created_at: now,
            updated_at: now,
        };
        state.profiles.insert(row.id, row.clone());
        state.writes += 1;
        Ok(row)
    }

    async fn update_profile_role(&self, user_id: Uuid, role: PlatformRole) -> Result<u64, StoreError> {
        self.check(StoreOperation::UpdateProfile).await?;
        let mut state = self.state.write().await;
        let Some(profile) = state.profiles.get_mut(&user_id) else {
            return Ok(0);
        };
        profile.role = role;
        profile.updated_at = Utc::now();
        state.writes += 1;
        Ok(1)
    }

    async fn update_profile_contact(
        &self,
        user_id: Uuid,
        update: ProfileContactUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        self.check(StoreOperation::UpdateProfile).await?;
        let mut state = self.state.write().await;
        let Some(profile) = state.profiles.get_mut(&user_id) else {
            return Ok(None);
        };
        if update.full_name.is_some() {
            profile.full_name = update.full_name;
        }
        if update.phone.is_some() {
            profile.phone = update.phone;
        }
        profile.updated_at = Utc::now();
        let updated = profile.clone();
        state.writes += 1;
        Ok(Some(updated))
    }

    async fn delete_profile(&self, user_id: Uuid) -> Result<u64, StoreError> {
        self.check(StoreOperation::DeleteProfile).await?;
        let mut state = self.state.write().await;
        if state.profiles.remove(&user_id).is_none() {
            return Ok(0);
        }
        state.members.retain(|m| m.user_id != user_id);
        for building in state.buildings.values_mut() {
            if building.created_by == Some(user_id) {
                building.created_by = None;
            }
        }
        for invite in state.invites.values_mut() {
            if invite.created_by == Some(user_id) {
                invite.created_by = None;
            }
        }
        for document in state.documents.values_mut() {
            if document.uploaded_by == Some(user_id) {
                document.uploaded_by = None;
            }
        }
        state.writes += 1;
        Ok(1)
    }

    async fn get_building(&self, building_id: Uuid) -> Result<Option<Building>, StoreError> {
        Ok(self.state.read().await.buildings.get(&building_id).cloned())
    }

    async fn find_membership(
        &self,
        building_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<BuildingMember>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .members
            .iter()
            .find(|m| m.building_id == building_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_memberships_for_user(&self, user_id: Uuid) -> Result<Vec<BuildingMember>, StoreError> {
        Ok(self.members_for(user_id).await)
    }

    async fn insert_member(&self, member: NewBuildingMember) -> Result<BuildingMember, StoreError> {
        self.check(StoreOperation::InsertMember).await?;
        let mut state = self.state.write().await;
        if !state.buildings.contains_key(&member.building_id) {
            return Err(StoreError::MissingReference("building_members_building_id_fkey".to_string()));
        }
        if !state.profiles.contains_key(&member.user_id) {
            return Err(StoreError::MissingReference("building_members_user_id_fkey".to_string()));
        }
        if state
            .members
            .iter()
            .any(|m| m.building_id == member.building_id && m.user_id == member.user_id)
        {
            return Err(StoreError::Conflict("building_members_building_id_user_id_key".to_string()));
        }
        let row = BuildingMember {
            id: Uuid::new_v4(),
            building_id: member.building_id,
            user_id: member.user_id,
            role: member.role,
            apartment_number: member.apartment_number,
            full_name: member.full_name,
            phone: member.phone,
            phone2: member.phone2,
            email: member.email,
            created_at: Utc::now(),
        };
        state.members.push(row.clone());
        state.writes += 1;
        Ok(row)
    }

    async fn get_building_invite(&self, invite_id: Uuid) -> Result<Option<BuildingInvite>, StoreError> {
        Ok(self.invite(invite_id).await)
    }

    async fn insert_building_invite(&self, invite: NewBuildingInvite) -> Result<BuildingInvite, StoreError> {
        self.check(StoreOperation::InsertInvite).await?;
        let mut state = self.state.write().await;
        if !state.buildings.contains_key(&invite.building_id) {
            return Err(StoreError::MissingReference("building_invites_building_id_fkey".to_string()));
        }
        let row = BuildingInvite {
            id: Uuid::new_v4(),
            building_id: invite.building_id,
            is_active: true,
            expires_at: invite.expires_at,
            max_uses: invite.max_uses,
            uses_count: 0,
            created_by: Some(invite.created_by),
            created_at: Utc::now(),
        };
        state.invites.insert(row.id, row.clone());
        state.writes += 1;
        Ok(row)
    }

    async fn list_building_invites(&self, building_id: Uuid) -> Result<Vec<BuildingInvite>, StoreError> {
        let mut invites: Vec<BuildingInvite> = self
            .state
            .read()
            .await
            .invites
            .values()
            .filter(|i| i.building_id == building_id)
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    async fn deactivate_building_invite(&self, invite_id: Uuid) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let Some(invite) = state.invites.get_mut(&invite_id) else {
            return Ok(0);
        };
        invite.is_active = false;
        state.writes += 1;
        Ok(1)
    }

    async fn consume_building_invite(&self, invite_id: Uuid, now: DateTime<Utc>) -> Result<u64, StoreError> {
        self.check(StoreOperation::ConsumeInvite).await?;
        let mut state = self.state.write().await;
        match state.invites.get_mut(&invite_id) {
            Some(invite) if invite.availability(now).is_available() => {
                invite.uses_count += 1;
                state.writes += 1;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn upsert_pending_invite(&self, invite: NewPendingInvite) -> Result<PendingInvite, StoreError> {
        self.check(StoreOperation::UpsertPendingInvite).await?;
        let mut state = self.state.write().await;
        if !state.invites.contains_key(&invite.invite_id) {
            return Err(StoreError::MissingReference("pending_invites_invite_id_fkey".to_string()));
        }
        let id = state
            .pending
            .get(&invite.email)
            .map(|p| p.id)
            .unwrap_or_else(Uuid::new_v4);
        let row = PendingInvite {
            id,
            email: invite.email,
            building_id: invite.building_id,
            invite_id: invite.invite_id,
            apartment_number: invite.apartment_number,
            full_name: invite.full_name,
            phone: invite.phone,
            default_role: invite.default_role,
            created_at: Utc::now(),
        };
        state.pending.insert(row.email.clone(), row.clone());
        state.writes += 1;
        Ok(row)
    }

    async fn find_pending_invite(&self, email: &str) -> Result<Option<PendingInvite>, StoreError> {
        Ok(self.pending(email).await)
    }

    async fn delete_pending_invites_by_email(&self, email: &str) -> Result<u64, StoreError> {
        self.check(StoreOperation::DeletePendingInvites).await?;
        let mut state = self.state.write().await;
        let removed = u64::from(state.pending.remove(email).is_some());
        state.writes += removed as usize;
        Ok(removed)
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Option<Document>, StoreError> {
        Ok(self.state.read().await.documents.get(&document_id).cloned())
    }

    async fn insert_saga(&self, saga: NewSaga) -> Result<SagaRecord, StoreError> {
        self.check(StoreOperation::InsertSaga).await?;
        let now = Utc::now();
        let row = SagaRecord {
            id: Uuid::new_v4(),
            kind: saga.kind,
            subject_email: saga.subject_email,
            subject_user_id: saga.subject_user_id,
            step: saga.step,
            status: SagaStatus::InProgress,
            compensation: None,
            payload: saga.payload,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        let mut state = self.state.write().await;
        state.sagas.push(row.clone());
        state.writes += 1;
        Ok(row)
    }

    async fn update_saga(&self, saga_id: Uuid, update: SagaUpdate) -> Result<(), StoreError> {
        self.check(StoreOperation::UpdateSaga).await?;
        let mut state = self.state.write().await;
        let saga = state
            .sagas
            .iter_mut()
            .find(|s| s.id == saga_id)
            .ok_or(StoreError::NotFound)?;
        saga.step = update.step;
        saga.status = update.status;
        saga.subject_email = update.subject_email;
        saga.subject_user_id = update.subject_user_id;
        saga.compensation = update.compensation;
        saga.last_error = update.last_error;
        saga.updated_at = Utc::now();
        state.writes += 1;
        Ok(())
    }

    async fn list_sagas(&self, status: SagaStatus, limit: i64) -> Result<Vec<SagaRecord>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .state
            .read()
            .await
            .sagas
            .iter()
            .filter(|s| s.status == status)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Identity operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityOperation {
    GetUser,
    RefreshSession,
    ExchangeCode,
    SignOut,
    FindUserByEmail,
    GetUserById,
    CreateUser,
    DeleteUser,
    SendRecoveryEmail,
}

#[derive(Debug, Default)]
struct IdentityState {
    users: HashMap<Uuid, IdentityUser>,
    access_tokens: HashMap<String, Uuid>,
    refresh_tokens: HashMap<String, Uuid>,
    codes: HashMap<String, Uuid>,
    recovery_emails: Vec<String>,
    created: usize,
}

/// Identity provider held in memory.
///
/// Tokens are opaque random strings; refreshing rotates both tokens.
#[derive(Debug)]
pub struct MockIdentityProvider {
    admin_configured: bool,
    state: RwLock<IdentityState>,
    failures: RwLock<HashSet<IdentityOperation>>,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            admin_configured: true,
            state: RwLock::new(IdentityState::default()),
            failures: RwLock::new(HashSet::new()),
        }
    }

    /// A provider without the admin service key.
    pub fn unconfigured() -> Self {
        Self {
            admin_configured: false,
            ..Self::new()
        }
    }

    pub async fn fail_on(&self, operation: IdentityOperation) {
        self.failures.write().await.insert(operation);
    }

    async fn check(&self, operation: IdentityOperation) -> Result<(), IdentityError> {
        if self.failures.read().await.contains(&operation) {
            tracing::warn!(?operation, "Mock identity provider simulating failure");
            return Err(IdentityError::Upstream(format!("simulated {:?} failure", operation)));
        }
        Ok(())
    }

    fn check_admin(&self) -> Result<(), IdentityError> {
        if self.admin_configured {
            Ok(())
        } else {
            Err(IdentityError::NotConfigured("service key".to_string()))
        }
    }

    /// Registers an account without counting it as admin-created.
    pub async fn seed_user(&self, email: &str) -> IdentityUser {
        let user = IdentityUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            user_metadata: serde_json::Value::Object(Default::default()),
        };
        self.state.write().await.users.insert(user.id, user.clone());
        user
    }

    /// Issues a fresh session for an existing account.
    pub async fn issue_session(&self, user_id: Uuid) -> Option<Session> {
        let mut state = self.state.write().await;
        let user = state.users.get(&user_id)?.clone();
        Some(Self::new_session(&mut state, user))
    }

    /// Issues a one-time authorization code for an existing account.
    pub async fn issue_code(&self, user_id: Uuid) -> String {
        let code = format!("code-{}", Uuid::new_v4().simple());
        self.state.write().await.codes.insert(code.clone(), user_id);
        code
    }

    /// Invalidates an access token, as if it had expired.
    pub async fn expire_access_token(&self, access_token: &str) {
        self.state.write().await.access_tokens.remove(access_token);
    }

    pub async fn has_user(&self, user_id: Uuid) -> bool {
        self.state.read().await.users.contains_key(&user_id)
    }

    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    /// Accounts created through [`IdentityProvider::create_user`].
    pub async fn created_accounts(&self) -> usize {
        self.state.read().await.created
    }

    pub async fn recovery_emails(&self) -> Vec<String> {
        self.state.read().await.recovery_emails.clone()
    }

    fn new_session(state: &mut IdentityState, user: IdentityUser) -> Session {
        let access_token = format!("access-{}", Uuid::new_v4().simple());
        let refresh_token = format!("refresh-{}", Uuid::new_v4().simple());
        state.access_tokens.insert(access_token.clone(), user.id);
        state.refresh_tokens.insert(refresh_token.clone(), user.id);
        Session {
            access_token,
            refresh_token,
            expires_in: 3600,
            user,
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn admin_configured(&self) -> bool {
        self.admin_configured
    }

    async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        self.check(IdentityOperation::GetUser).await?;
        let state = self.state.read().await;
        state
            .access_tokens
            .get(access_token)
            .and_then(|id| state.users.get(id))
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        self.check(IdentityOperation::RefreshSession).await?;
        let mut state = self.state.write().await;
        let user_id = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(IdentityError::InvalidCredentials)?;
        let user = state
            .users
            .get(&user_id)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;
        Ok(Self::new_session(&mut state, user))
    }

    async fn exchange_code(
        &self,
        code: &str,
        _code_verifier: Option<&str>,
    ) -> Result<Session, IdentityError> {
        self.check(IdentityOperation::ExchangeCode).await?;
        let mut state = self.state.write().await;
        let user_id = state
            .codes
            .remove(code)
            .ok_or(IdentityError::InvalidCredentials)?;
        let user = state
            .users
            .get(&user_id)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;
        Ok(Self::new_session(&mut state, user))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        self.check(IdentityOperation::SignOut).await?;
        let mut state = self.state.write().await;
        if let Some(user_id) = state.access_tokens.remove(access_token) {
            state.refresh_tokens.retain(|_, id| *id != user_id);
        }
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<IdentityUser>, IdentityError> {
        self.check_admin()?;
        self.check(IdentityOperation::FindUserByEmail).await?;
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .cloned())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<IdentityUser>, IdentityError> {
        self.check_admin()?;
        self.check(IdentityOperation::GetUserById).await?;
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn create_user(&self, user: NewIdentityUser) -> Result<IdentityUser, IdentityError> {
        self.check_admin()?;
        self.check(IdentityOperation::CreateUser).await?;
        let mut state = self.state.write().await;
        if state.users.values().any(|u| {
            u.email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(&user.email))
        }) {
            return Err(IdentityError::AlreadyExists(user.email));
        }
        let created = IdentityUser {
            id: Uuid::new_v4(),
            email: Some(user.email),
            user_metadata: user.user_metadata,
        };
        state.users.insert(created.id, created.clone());
        state.created += 1;
        Ok(created)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        self.check_admin()?;
        self.check(IdentityOperation::DeleteUser).await?;
        let mut state = self.state.write().await;
        state.users.remove(&user_id).ok_or(IdentityError::NotFound)?;
        state.access_tokens.retain(|_, id| *id != user_id);
        state.refresh_tokens.retain(|_, id| *id != user_id);
        Ok(())
    }

    async fn send_recovery_email(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        self.check_admin()?;
        self.check(IdentityOperation::SendRecoveryEmail).await?;
        tracing::debug!(email, redirect_to, "Mock identity provider recorded recovery email");
        self.state
            .write()
            .await
            .recovery_emails
            .push(email.to_string());
        Ok(())
    }
}

/// Object storage that signs URLs without contacting anything.
#[derive(Debug, Clone, Default)]
pub struct MockObjectStorage {
    pub simulate_failure: bool,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self {
            simulate_failure: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn create_signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError> {
        if self.simulate_failure {
            return Err(StorageError::Upstream("simulated failure".to_string()));
        }
        Ok(format!(
            "https://storage.test/object/sign/{}/{}?token={}&expires_in={}",
            bucket,
            path,
            Uuid::new_v4().simple(),
            expires_in_secs
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delete_profile_cascades_memberships_and_nulls_creators() {
        let store = InMemoryStore::new();
        let building = store.seed_building("Herzl 10").await;
        let user = store.seed_profile(PlatformRole::Committee).await;
        store.seed_member(building.id, user.id, MemberRole::Committee).await;
        let invite = store
            .insert_building_invite(NewBuildingInvite {
                building_id: building.id,
                expires_at: None,
                max_uses: None,
                created_by: user.id,
            })
            .await
            .unwrap();

        assert_eq!(store.delete_profile(user.id).await.unwrap(), 1);
        assert!(store.members_for(user.id).await.is_empty());
        assert_eq!(store.invite(invite.id).await.unwrap().created_by, None);
        assert_eq!(store.delete_profile(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_membership_conflicts() {
        let store = InMemoryStore::new();
        let building = store.seed_building("Herzl 10").await;
        let user = store.seed_profile(PlatformRole::Tenant).await;
        let member = NewBuildingMember {
            building_id: building.id,
            user_id: user.id,
            role: MemberRole::Tenant,
            apartment_number: None,
            full_name: None,
            phone: None,
            phone2: None,
            email: None,
        };

        store.insert_member(member.clone()).await.unwrap();
        assert!(matches!(
            store.insert_member(member).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_consume_respects_use_cap() {
        let store = InMemoryStore::new();
        let building = store.seed_building("Herzl 10").await;
        let invite = store
            .insert_building_invite(NewBuildingInvite {
                building_id: building.id,
                expires_at: None,
                max_uses: Some(1),
                created_by: Uuid::new_v4(),
            })
            .await
            .unwrap();

        let now = Utc::now();
        assert_eq!(store.consume_building_invite(invite.id, now).await.unwrap(), 1);
        assert_eq!(store.consume_building_invite(invite.id, now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mock_identity_refresh_rotates_tokens() {
        let identity = MockIdentityProvider::new();
        let user = identity.seed_user("a@example.com").await;
        let session = identity.issue_session(user.id).await.unwrap();

        let refreshed = identity.refresh_session(&session.refresh_token).await.unwrap();
        assert_ne!(refreshed.access_token, session.access_token);
        assert!(identity.refresh_session(&session.refresh_token).await.is_err());
        assert_eq!(identity.get_user(&refreshed.access_token).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_unconfigured_identity_rejects_admin_calls() {
        let identity = MockIdentityProvider::unconfigured();
        assert!(matches!(
            identity.find_user_by_email("a@example.com").await,
            Err(IdentityError::NotConfigured(_))
        ));
    }
}
