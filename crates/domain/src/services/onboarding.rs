//! Member onboarding and offboarding.
//!
//! Every flow here spans the identity provider and the relational store,
//! which share no transaction. Add-member and delete-member therefore run as
//! sagas: the next step is persisted before each external call, so a crash
//! leaves a row that [`Onboarding::recover_interrupted`] can finish or undo.

use chrono::{DateTime, Utc};
use serde_json::json;
use shared::password::{generate_temporary_password, PasswordError};
use shared::validation::{non_blank, normalize_email};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::invite::StagePendingInviteRequest;
use crate::models::onboarding::{CreateUserRequest, UpdateRoleRequest};
use crate::models::{
    BuildingMember, Compensation, InviteAvailability, MemberRole, NewBuildingMember,
    NewPendingInvite, NewProfile, NewSaga, PendingInvite, PlatformRole, SagaKind, SagaRecord,
    SagaStatus, SagaStep,
};
use crate::services::authorization::{AdminOnly, Capability};
use crate::services::identity::{IdentityError, IdentityProvider, IdentityUser, NewIdentityUser};
use crate::services::saga::SagaLog;
use crate::services::store::{BuildingStore, StoreError};

/// Maximum number of interrupted sagas handled per recovery pass.
const RECOVERY_BATCH_SIZE: i64 = 500;

/// Request-independent knobs for the onboarding flows.
#[derive(Debug, Clone)]
pub struct OnboardingSettings {
    pub temp_password_length: usize,
    /// Where the recovery email sends a newly created user.
    pub recovery_redirect_url: String,
}

/// Input rejected before anything was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    SelfDeletion,
    SelfRoleChange,
    RoleNotAssignable(PlatformRole),
    InviteBuildingMismatch,
}

/// Error type for onboarding flows.
#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("Invalid request: {0:?}")]
    Validation(ValidationFailure),

    #[error("User is already a member of building {building_id}")]
    AlreadyMember { building_id: Uuid },

    #[error("Building {0} not found")]
    BuildingNotFound(Uuid),

    #[error("Invite not found")]
    InviteNotFound,

    #[error("Invite cannot be redeemed: {0:?}")]
    InviteUnavailable(InviteAvailability),

    #[error("Profile {0} not found")]
    ProfileNotFound(Uuid),

    #[error("Admin identity credentials are missing: {0}")]
    NotConfigured(String),

    #[error("Identity provider failed during {step}: {source}")]
    Identity {
        step: &'static str,
        #[source]
        source: IdentityError,
    },

    #[error("Store failed during {step}: {source}")]
    Store {
        step: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Profile creation failed (account compensated: {compensated}): {source}")]
    ProfileCreation {
        compensated: bool,
        #[source]
        source: StoreError,
    },

    #[error("User {user_id} exists but could not be added to building {building_id}: {source}")]
    MembershipNotCreated {
        user_id: Uuid,
        building_id: Uuid,
        is_new_user: bool,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl OnboardingError {
    fn store(step: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| OnboardingError::Store { step, source }
    }

    fn identity(step: &'static str) -> impl FnOnce(IdentityError) -> Self {
        move |source| match source {
            IdentityError::NotConfigured(msg) => OnboardingError::NotConfigured(msg),
            source => OnboardingError::Identity { step, source },
        }
    }
}

/// Result of a successful add-member run.
#[derive(Debug, Clone)]
pub struct AddMemberOutcome {
    pub user_id: Uuid,
    pub is_new_user: bool,
    pub member: BuildingMember,
    pub recovery_link_sent: bool,
}

/// Result of a successful delete-member run.
#[derive(Debug, Clone)]
pub struct DeleteMemberOutcome {
    pub user_id: Uuid,
    pub pending_invites_removed: u64,
}

/// What happened to a signed-in user's staged invite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    NoPendingInvite,
    Joined { building_id: Uuid, role: MemberRole },
    AlreadyMember { building_id: Uuid },
    Rejected { building_id: Uuid, reason: InviteAvailability },
}

/// Tally of a recovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub resumed: usize,
    pub completed: usize,
    pub compensated: usize,
    pub failed: usize,
}

impl RecoveryReport {
    fn tally(&mut self, status: SagaStatus) {
        self.resumed += 1;
        match status {
            SagaStatus::Completed => self.completed += 1,
            SagaStatus::Compensated => self.compensated += 1,
            SagaStatus::Failed | SagaStatus::InProgress => self.failed += 1,
        }
    }
}

/// Orchestrates onboarding across the store and the identity provider.
pub struct Onboarding<'a> {
    store: &'a dyn BuildingStore,
    identity: &'a dyn IdentityProvider,
    settings: OnboardingSettings,
}

impl<'a> Onboarding<'a> {
    pub fn new(
        store: &'a dyn BuildingStore,
        identity: &'a dyn IdentityProvider,
        settings: OnboardingSettings,
    ) -> Self {
        Self {
            store,
            identity,
            settings,
        }
    }

    fn require_admin_credentials(&self) -> Result<(), OnboardingError> {
        if self.identity.admin_configured() {
            Ok(())
        } else {
            Err(OnboardingError::NotConfigured(
                "identity service key".to_string(),
            ))
        }
    }

    /// Adds a user to a building, creating the identity account if needed.
    ///
    /// A conflict (already a member) is detected before any write. A failed
    /// profile insert for a new account deletes that account again. A failed
    /// membership insert leaves the account and profile in place and the saga
    /// `failed` for follow-up.
    pub async fn add_member(
        &self,
        admin: &Capability<AdminOnly>,
        request: CreateUserRequest,
    ) -> Result<AddMemberOutcome, OnboardingError> {
        self.require_admin_credentials()?;

        let email = normalize_email(&request.email);
        let building_id = request.building_id;

        self.store
            .get_building(building_id)
            .await
            .map_err(OnboardingError::store("load_building"))?
            .ok_or(OnboardingError::BuildingNotFound(building_id))?;

        let existing = self
            .identity
            .find_user_by_email(&email)
            .await
            .map_err(OnboardingError::identity("lookup_account"))?;

        let payload = serde_json::to_value(&request).unwrap_or_default();
        let mut recovery_link_sent = false;

        let (user_id, is_new_user, saga) = match existing {
            Some(user) => {
                if self
                    .store
                    .find_membership(building_id, user.id)
                    .await
                    .map_err(OnboardingError::store("check_membership"))?
                    .is_some()
                {
                    info!(
                        admin_id = %admin.user_id(),
                        user_id = %user.id,
                        building_id = %building_id,
                        "User is already a member of the building"
                    );
                    return Err(OnboardingError::AlreadyMember { building_id });
                }

                let saga = SagaLog::begin(
                    self.store,
                    NewSaga {
                        kind: SagaKind::AddMember,
                        subject_email: Some(email.clone()),
                        subject_user_id: Some(user.id),
                        step: SagaStep::InsertMembership,
                        payload,
                    },
                )
                .await
                .map_err(OnboardingError::store("open_saga"))?;

                if let Err(e) = self.ensure_profile(user.id, &request).await {
                    saga.fail(&e.to_string()).await;
                    return Err(OnboardingError::Store {
                        step: "create_profile",
                        source: e,
                    });
                }

                (user.id, false, saga)
            }
            None => {
                let mut saga = SagaLog::begin(
                    self.store,
                    NewSaga {
                        kind: SagaKind::AddMember,
                        subject_email: Some(email.clone()),
                        subject_user_id: None,
                        step: SagaStep::CreateAccount,
                        payload,
                    },
                )
                .await
                .map_err(OnboardingError::store("open_saga"))?;

                let password = match generate_temporary_password(self.settings.temp_password_length) {
                    Ok(password) => password,
                    Err(e) => {
                        saga.fail(&e.to_string()).await;
                        return Err(e.into());
                    }
                };

                let created = match self
                    .identity
                    .create_user(NewIdentityUser {
                        email: email.clone(),
                        password,
                        email_confirmed: true,
                        user_metadata: json!({ "full_name": request.full_name.trim() }),
                    })
                    .await
                {
                    Ok(user) => user,
                    Err(e) => {
                        saga.fail(&e.to_string()).await;
                        return Err(OnboardingError::identity("create_account")(e));
                    }
                };

                saga.set_subject_user(created.id);
                if let Err(e) = saga
                    .advance_with(
                        SagaStep::CreateProfile,
                        Some(Compensation::DeleteIdentityAccount {
                            user_id: created.id,
                        }),
                    )
                    .await
                {
                    let compensated = self.compensate_account(created.id).await;
                    return Err(OnboardingError::ProfileCreation {
                        compensated,
                        source: e,
                    });
                }

                if let Err(e) = self
                    .store
                    .insert_profile(new_profile(created.id, &request))
                    .await
                {
                    warn!(user_id = %created.id, error = %e, "Profile insert failed, removing new account");
                    let compensated = self.compensate_account(created.id).await;
                    if compensated {
                        saga.compensated(&e.to_string()).await;
                    } else {
                        saga.fail(&e.to_string()).await;
                    }
                    return Err(OnboardingError::ProfileCreation {
                        compensated,
                        source: e,
                    });
                }

                saga.advance(SagaStep::SendRecoveryLink)
                    .await
                    .map_err(OnboardingError::store("record_saga"))?;
                recovery_link_sent = self.send_recovery_link(created.id, &email).await;

                saga.advance(SagaStep::InsertMembership)
                    .await
                    .map_err(OnboardingError::store("record_saga"))?;

                (created.id, true, saga)
            }
        };

        match self
            .store
            .insert_member(new_member(user_id, &email, &request))
            .await
        {
            Ok(member) => {
                saga.complete().await;
                info!(
                    admin_id = %admin.user_id(),
                    user_id = %user_id,
                    building_id = %building_id,
                    is_new_user,
                    "Member added to building"
                );
                Ok(AddMemberOutcome {
                    user_id,
                    is_new_user,
                    member,
                    recovery_link_sent,
                })
            }
            Err(e) => {
                error!(
                    user_id = %user_id,
                    building_id = %building_id,
                    error = %e,
                    "Membership insert failed after account setup"
                );
                saga.fail(&e.to_string()).await;
                Err(OnboardingError::MembershipNotCreated {
                    user_id,
                    building_id,
                    is_new_user,
                    source: e,
                })
            }
        }
    }

    /// Removes a user everywhere: staged invites, profile (cascading to
    /// memberships) and finally the identity account.
    ///
    /// A missing profile is reported as [`OnboardingError::ProfileNotFound`],
    /// so deleting the same user twice fails cleanly the second time.
    pub async fn delete_member(
        &self,
        admin: &Capability<AdminOnly>,
        user_id: Uuid,
    ) -> Result<DeleteMemberOutcome, OnboardingError> {
        self.require_admin_credentials()?;

        if user_id == admin.user_id() {
            return Err(OnboardingError::Validation(ValidationFailure::SelfDeletion));
        }

        let mut saga = SagaLog::begin(
            self.store,
            NewSaga {
                kind: SagaKind::DeleteMember,
                subject_email: None,
                subject_user_id: Some(user_id),
                step: SagaStep::ResolveEmail,
                payload: json!({ "requested_by": admin.user_id() }),
            },
        )
        .await
        .map_err(OnboardingError::store("open_saga"))?;

        let result = self.run_delete_steps(&mut saga, user_id, SagaStep::ResolveEmail).await;
        match result {
            Ok(pending_invites_removed) => {
                saga.complete().await;
                info!(
                    admin_id = %admin.user_id(),
                    user_id = %user_id,
                    pending_invites_removed,
                    "User deleted"
                );
                Ok(DeleteMemberOutcome {
                    user_id,
                    pending_invites_removed,
                })
            }
            Err(e) => {
                saga.fail(&e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Runs the delete steps starting at `from`. Re-running any step is safe.
    async fn run_delete_steps(
        &self,
        saga: &mut SagaLog<'_>,
        user_id: Uuid,
        from: SagaStep,
    ) -> Result<u64, OnboardingError> {
        let from = delete_step_index(from);

        if from <= delete_step_index(SagaStep::ResolveEmail) {
            let email = match self.identity.get_user_by_id(user_id).await {
                Ok(Some(user)) => user.email.as_deref().map(normalize_email),
                Ok(None) => {
                    warn!(user_id = %user_id, "No identity account for user, skipping invite cleanup");
                    None
                }
                Err(IdentityError::NotConfigured(msg)) => {
                    return Err(OnboardingError::NotConfigured(msg))
                }
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Failed to resolve user email");
                    None
                }
            };
            saga.set_subject_email(email);
            saga.advance(SagaStep::DeletePendingInvites)
                .await
                .map_err(OnboardingError::store("record_saga"))?;
        }

        let mut pending_invites_removed = 0;
        if from <= delete_step_index(SagaStep::DeletePendingInvites) {
            if let Some(email) = saga.record().subject_email.clone() {
                match self.store.delete_pending_invites_by_email(&email).await {
                    Ok(removed) => pending_invites_removed = removed,
                    Err(e) => {
                        warn!(user_id = %user_id, error = %e, "Failed to delete pending invites")
                    }
                }
            }
            saga.advance(SagaStep::DeleteProfile)
                .await
                .map_err(OnboardingError::store("record_saga"))?;
        }

        if from <= delete_step_index(SagaStep::DeleteProfile) {
            let deleted = self
                .store
                .delete_profile(user_id)
                .await
                .map_err(OnboardingError::store("delete_profile"))?;
            // A resumed saga may have deleted the profile before the crash.
            if deleted == 0 && from < delete_step_index(SagaStep::DeleteProfile) {
                return Err(OnboardingError::ProfileNotFound(user_id));
            }
            saga.advance(SagaStep::DeleteAccount)
                .await
                .map_err(OnboardingError::store("record_saga"))?;
        }

        match self.identity.delete_user(user_id).await {
            Ok(()) => {}
            Err(IdentityError::NotFound) => {
                warn!(user_id = %user_id, "Identity account already gone")
            }
            Err(e) => return Err(OnboardingError::identity("delete_account")(e)),
        }

        Ok(pending_invites_removed)
    }

    /// Changes a user's platform role. Only directly assignable roles are
    /// accepted and admins cannot change their own role.
    pub async fn update_role(
        &self,
        admin: &Capability<AdminOnly>,
        request: UpdateRoleRequest,
    ) -> Result<(), OnboardingError> {
        if request.user_id == admin.user_id() {
            return Err(OnboardingError::Validation(ValidationFailure::SelfRoleChange));
        }
        if !request.role.is_directly_assignable() {
            return Err(OnboardingError::Validation(
                ValidationFailure::RoleNotAssignable(request.role),
            ));
        }

        let updated = self
            .store
            .update_profile_role(request.user_id, request.role)
            .await
            .map_err(OnboardingError::store("update_role"))?;
        if updated == 0 {
            return Err(OnboardingError::ProfileNotFound(request.user_id));
        }

        info!(
            admin_id = %admin.user_id(),
            user_id = %request.user_id,
            role = request.role.as_str(),
            "Platform role updated"
        );
        Ok(())
    }

    /// Records a pending invite for an email that has not signed up yet.
    /// A later staging for the same email replaces the earlier one.
    pub async fn stage_pending_invite(
        &self,
        request: StagePendingInviteRequest,
        now: DateTime<Utc>,
    ) -> Result<PendingInvite, OnboardingError> {
        let invite = self
            .store
            .get_building_invite(request.invite_id)
            .await
            .map_err(OnboardingError::store("load_invite"))?
            .ok_or(OnboardingError::InviteNotFound)?;

        if invite.building_id != request.building_id {
            return Err(OnboardingError::Validation(
                ValidationFailure::InviteBuildingMismatch,
            ));
        }

        let availability = invite.availability(now);
        if !availability.is_available() {
            return Err(OnboardingError::InviteUnavailable(availability));
        }

        let pending = self
            .store
            .upsert_pending_invite(NewPendingInvite {
                email: normalize_email(&request.user_email),
                building_id: request.building_id,
                invite_id: request.invite_id,
                apartment_number: non_blank(request.apartment_number.as_deref()),
                full_name: non_blank(request.full_name.as_deref()),
                phone: non_blank(request.phone.as_deref()),
                default_role: request.default_role,
            })
            .await
            .map_err(OnboardingError::store("stage_invite"))?;

        info!(
            pending_invite_id = %pending.id,
            building_id = %pending.building_id,
            "Pending invite staged"
        );
        Ok(pending)
    }

    /// Completes a staged invite for a freshly authenticated user.
    ///
    /// Ensures the user has a profile, then redeems the invite if it is still
    /// usable. The pending row is removed whatever the outcome.
    pub async fn claim_pending_invite(
        &self,
        user: &IdentityUser,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, OnboardingError> {
        let email = user.email.as_deref().map(normalize_email);
        let pending = match &email {
            Some(email) => self
                .store
                .find_pending_invite(email)
                .await
                .map_err(OnboardingError::store("load_pending_invite"))?,
            None => None,
        };

        self.ensure_signup_profile(user, pending.as_ref()).await?;

        let Some(pending) = pending else {
            return Ok(ClaimOutcome::NoPendingInvite);
        };
        let building_id = pending.building_id;

        let outcome = self.redeem(user.id, &pending, now).await;

        if let Err(e) = self.store.delete_pending_invites_by_email(&pending.email).await {
            warn!(user_id = %user.id, error = %e, "Failed to clear pending invite");
        }

        let outcome = outcome?;
        match &outcome {
            ClaimOutcome::Joined { role, .. } => info!(
                user_id = %user.id,
                building_id = %building_id,
                role = role.as_str(),
                "Pending invite redeemed"
            ),
            ClaimOutcome::Rejected { reason, .. } => info!(
                user_id = %user.id,
                building_id = %building_id,
                reason = ?reason,
                "Pending invite no longer usable"
            ),
            _ => {}
        }
        Ok(outcome)
    }

    async fn redeem(
        &self,
        user_id: Uuid,
        pending: &PendingInvite,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, OnboardingError> {
        let building_id = pending.building_id;

        let availability = self
            .store
            .get_building_invite(pending.invite_id)
            .await
            .map_err(OnboardingError::store("load_invite"))?
            .map(|invite| invite.availability(now))
            .unwrap_or(InviteAvailability::Inactive);
        if !availability.is_available() {
            return Ok(ClaimOutcome::Rejected {
                building_id,
                reason: availability,
            });
        }

        if self
            .store
            .find_membership(building_id, user_id)
            .await
            .map_err(OnboardingError::store("check_membership"))?
            .is_some()
        {
            return Ok(ClaimOutcome::AlreadyMember { building_id });
        }

        let consumed = self
            .store
            .consume_building_invite(pending.invite_id, now)
            .await
            .map_err(OnboardingError::store("consume_invite"))?;
        if consumed == 0 {
            return Ok(ClaimOutcome::Rejected {
                building_id,
                reason: InviteAvailability::Exhausted,
            });
        }

        self.store
            .insert_member(NewBuildingMember {
                building_id,
                user_id,
                role: pending.default_role,
                apartment_number: pending.apartment_number.clone(),
                full_name: pending.full_name.clone(),
                phone: pending.phone.clone(),
                phone2: None,
                email: Some(pending.email.clone()),
            })
            .await
            .map_err(OnboardingError::store("insert_membership"))?;

        Ok(ClaimOutcome::Joined {
            building_id,
            role: pending.default_role,
        })
    }

    /// Resumes or compensates every saga left `in_progress`.
    pub async fn recover_interrupted(&self) -> Result<RecoveryReport, OnboardingError> {
        let sagas = self
            .store
            .list_sagas(SagaStatus::InProgress, RECOVERY_BATCH_SIZE)
            .await
            .map_err(OnboardingError::store("list_sagas"))?;

        let mut report = RecoveryReport::default();
        for record in sagas {
            let saga_id = record.id;
            let status = match record.kind {
                SagaKind::AddMember => self.resume_add_member(record).await,
                SagaKind::DeleteMember => self.resume_delete_member(record).await,
            };
            info!(saga_id = %saga_id, status = status.as_str(), "Interrupted saga resolved");
            report.tally(status);
        }
        Ok(report)
    }

    async fn resume_add_member(&self, record: SagaRecord) -> SagaStatus {
        let request: Option<CreateUserRequest> = serde_json::from_value(record.payload.clone()).ok();
        let email = record.subject_email.clone();
        let compensation = record.compensation.clone();
        let step = record.step;
        let subject_user_id = record.subject_user_id;
        let saga = SagaLog::resume(self.store, record);

        if let Some(Compensation::DeleteIdentityAccount { user_id }) = compensation {
            // The profile may have been written before the step was recorded.
            match self.store.get_profile(user_id).await {
                Ok(Some(_)) => {
                    return self
                        .finish_add_member(saga, user_id, email.as_deref(), request.as_ref(), false)
                        .await
                }
                Ok(None) => {}
                Err(e) => {
                    saga.fail(&e.to_string()).await;
                    return SagaStatus::Failed;
                }
            }
            return if self.compensate_account(user_id).await {
                saga.compensated("interrupted before profile creation").await;
                SagaStatus::Compensated
            } else {
                saga.fail("interrupted before profile creation; account removal failed")
                    .await;
                SagaStatus::Failed
            };
        }

        match (step, subject_user_id) {
            (SagaStep::CreateAccount, _) => {
                let Some(email) = email else {
                    saga.fail("interrupted before account creation").await;
                    return SagaStatus::Failed;
                };
                let orphan = match self.identity.find_user_by_email(&email).await {
                    Ok(Some(user)) => match self.store.get_profile(user.id).await {
                        Ok(None) => Some(user.id),
                        _ => None,
                    },
                    _ => None,
                };
                match orphan {
                    Some(user_id) if self.compensate_account(user_id).await => {
                        saga.compensated("interrupted during account creation").await;
                        SagaStatus::Compensated
                    }
                    _ => {
                        saga.fail("interrupted during account creation").await;
                        SagaStatus::Failed
                    }
                }
            }
            (SagaStep::SendRecoveryLink, Some(user_id)) => {
                self.finish_add_member(saga, user_id, email.as_deref(), request.as_ref(), true)
                    .await
            }
            (SagaStep::InsertMembership, Some(user_id)) => {
                self.finish_add_member(saga, user_id, email.as_deref(), request.as_ref(), false)
                    .await
            }
            (step, _) => {
                saga.fail(&format!("cannot resume add_member at step {}", step))
                    .await;
                SagaStatus::Failed
            }
        }
    }

    async fn finish_add_member(
        &self,
        saga: SagaLog<'_>,
        user_id: Uuid,
        email: Option<&str>,
        request: Option<&CreateUserRequest>,
        send_link: bool,
    ) -> SagaStatus {
        let Some(request) = request else {
            saga.fail("saga payload is not a create-user request").await;
            return SagaStatus::Failed;
        };
        let email = email.map(str::to_string).unwrap_or_else(|| normalize_email(&request.email));

        if send_link {
            self.send_recovery_link(user_id, &email).await;
        }

        match self.store.find_membership(request.building_id, user_id).await {
            Ok(Some(_)) => {
                saga.complete().await;
                return SagaStatus::Completed;
            }
            Ok(None) => {}
            Err(e) => {
                saga.fail(&e.to_string()).await;
                return SagaStatus::Failed;
            }
        }

        match self.store.insert_member(new_member(user_id, &email, request)).await {
            Ok(_) => {
                saga.complete().await;
                SagaStatus::Completed
            }
            Err(e) => {
                saga.fail(&e.to_string()).await;
                SagaStatus::Failed
            }
        }
    }

    async fn resume_delete_member(&self, record: SagaRecord) -> SagaStatus {
        let step = record.step;
        let Some(user_id) = record.subject_user_id else {
            SagaLog::resume(self.store, record)
                .fail("delete saga has no subject user")
                .await;
            return SagaStatus::Failed;
        };

        let mut saga = SagaLog::resume(self.store, record);
        match self.run_delete_steps(&mut saga, user_id, step).await {
            Ok(_) => {
                saga.complete().await;
                SagaStatus::Completed
            }
            Err(e) => {
                saga.fail(&e.to_string()).await;
                SagaStatus::Failed
            }
        }
    }

    async fn ensure_profile(&self, user_id: Uuid, request: &CreateUserRequest) -> Result<(), StoreError> {
        if self.store.get_profile(user_id).await?.is_some() {
            return Ok(());
        }
        match self.store.insert_profile(new_profile(user_id, request)).await {
            Ok(_) | Err(StoreError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn ensure_signup_profile(
        &self,
        user: &IdentityUser,
        pending: Option<&PendingInvite>,
    ) -> Result<(), OnboardingError> {
        if self
            .store
            .get_profile(user.id)
            .await
            .map_err(OnboardingError::store("load_profile"))?
            .is_some()
        {
            return Ok(());
        }

        let profile = NewProfile {
            id: user.id,
            full_name: pending
                .and_then(|p| p.full_name.clone())
                .or_else(|| user.metadata_full_name()),
            phone: pending.and_then(|p| p.phone.clone()),
            role: pending
                .map(|p| PlatformRole::from(p.default_role))
                .unwrap_or(PlatformRole::Tenant),
        };

        match self.store.insert_profile(profile).await {
            // Two callbacks for the same user can race here.
            Ok(_) | Err(StoreError::Conflict(_)) => Ok(()),
            Err(e) => Err(OnboardingError::Store {
                step: "create_profile",
                source: e,
            }),
        }
    }

    async fn send_recovery_link(&self, user_id: Uuid, email: &str) -> bool {
        match self
            .identity
            .send_recovery_email(email, &self.settings.recovery_redirect_url)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to send recovery link");
                false
            }
        }
    }

    /// Deletes an identity account created earlier in a failed flow.
    async fn compensate_account(&self, user_id: Uuid) -> bool {
        match self.identity.delete_user(user_id).await {
            Ok(()) | Err(IdentityError::NotFound) => {
                info!(user_id = %user_id, "Compensated identity account");
                true
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to compensate identity account");
                false
            }
        }
    }
}

fn new_profile(user_id: Uuid, request: &CreateUserRequest) -> NewProfile {
    NewProfile {
        id: user_id,
        full_name: non_blank(Some(&request.full_name)),
        phone: non_blank(request.phone.as_deref()),
        role: request.role.into(),
    }
}

fn new_member(user_id: Uuid, email: &str, request: &CreateUserRequest) -> NewBuildingMember {
    NewBuildingMember {
        building_id: request.building_id,
        user_id,
        role: request.role,
        apartment_number: non_blank(request.apartment_number.as_deref()),
        full_name: non_blank(Some(&request.full_name)),
        phone: non_blank(request.phone.as_deref()),
        phone2: non_blank(request.phone2.as_deref()),
        email: Some(email.to_string()),
    }
}

fn delete_step_index(step: SagaStep) -> u8 {
    match step {
        SagaStep::ResolveEmail => 0,
        SagaStep::DeletePendingInvites => 1,
        SagaStep::DeleteProfile => 2,
        SagaStep::DeleteAccount => 3,
        _ => 0,
    }
}
