//! Role-based authorization guard.
//!
//! Handlers obtain a capability token once and pass it to the operations that
//! need it; an operation taking `&Capability<AdminOnly>` cannot be reached
//! without the admin check having succeeded.

use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Document, PlatformRole};
use crate::services::store::{BuildingStore, StoreError};

/// Error type for authorization checks.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("User {0} has no profile")]
    MissingProfile(Uuid),

    #[error("Role {actual} does not satisfy requirement {required}")]
    InsufficientRole {
        required: &'static str,
        actual: PlatformRole,
    },

    #[error("User {user_id} cannot manage building {building_id}")]
    NotBuildingManager { user_id: Uuid, building_id: Uuid },

    #[error("User {user_id} cannot read document {document_id}")]
    DocumentDenied { user_id: Uuid, document_id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A platform-role requirement checked by [`authorize`].
pub trait RoleRequirement: Send + Sync + 'static {
    const NAME: &'static str;

    fn allows(role: PlatformRole) -> bool;
}

/// Platform administrators only.
#[derive(Debug)]
pub struct AdminOnly;

impl RoleRequirement for AdminOnly {
    const NAME: &'static str = "admin";

    fn allows(role: PlatformRole) -> bool {
        role == PlatformRole::Admin
    }
}

/// Proof that a user satisfied requirement `R`.
pub struct Capability<R> {
    user_id: Uuid,
    role: PlatformRole,
    _requirement: PhantomData<fn() -> R>,
}

impl<R> Capability<R> {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn role(&self) -> PlatformRole {
        self.role
    }
}

impl<R> Clone for Capability<R> {
    fn clone(&self) -> Self {
        Self {
            user_id: self.user_id,
            role: self.role,
            _requirement: PhantomData,
        }
    }
}

impl<R: RoleRequirement> fmt::Debug for Capability<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capability")
            .field("requirement", &R::NAME)
            .field("user_id", &self.user_id)
            .field("role", &self.role)
            .finish()
    }
}

/// Loads the user's profile and checks it against `R`.
pub async fn authorize<R: RoleRequirement>(
    store: &dyn BuildingStore,
    user_id: Uuid,
) -> Result<Capability<R>, AuthorizationError> {
    let profile = store
        .get_profile(user_id)
        .await?
        .ok_or(AuthorizationError::MissingProfile(user_id))?;

    if !R::allows(profile.role) {
        return Err(AuthorizationError::InsufficientRole {
            required: R::NAME,
            actual: profile.role,
        });
    }

    Ok(Capability {
        user_id,
        role: profile.role,
        _requirement: PhantomData,
    })
}

/// How a user qualified as a building manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerAccess {
    PlatformAdmin,
    Committee,
}

/// Proof that a user may manage one building.
#[derive(Debug, Clone)]
pub struct BuildingCapability {
    user_id: Uuid,
    building_id: Uuid,
    access: ManagerAccess,
}

impl BuildingCapability {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn building_id(&self) -> Uuid {
        self.building_id
    }

    pub fn access(&self) -> ManagerAccess {
        self.access
    }
}

/// Admins manage every building; committee members manage their own.
pub async fn authorize_building_manager(
    store: &dyn BuildingStore,
    user_id: Uuid,
    building_id: Uuid,
) -> Result<BuildingCapability, AuthorizationError> {
    let profile = store
        .get_profile(user_id)
        .await?
        .ok_or(AuthorizationError::MissingProfile(user_id))?;

    let access = if profile.role == PlatformRole::Admin {
        ManagerAccess::PlatformAdmin
    } else {
        match store.find_membership(building_id, user_id).await? {
            Some(member) if member.role.can_manage_building() => ManagerAccess::Committee,
            _ => {
                return Err(AuthorizationError::NotBuildingManager {
                    user_id,
                    building_id,
                })
            }
        }
    };

    Ok(BuildingCapability {
        user_id,
        building_id,
        access,
    })
}

/// Admins and the building's committee read every document; other members
/// read visible documents only.
pub async fn authorize_document_read(
    store: &dyn BuildingStore,
    user_id: Uuid,
    document: &Document,
) -> Result<(), AuthorizationError> {
    let denied = AuthorizationError::DocumentDenied {
        user_id,
        document_id: document.id,
    };

    let profile = store
        .get_profile(user_id)
        .await?
        .ok_or(AuthorizationError::MissingProfile(user_id))?;
    if profile.role == PlatformRole::Admin {
        return Ok(());
    }

    match store.find_membership(document.building_id, user_id).await? {
        Some(member) if member.role.can_manage_building() || document.is_visible => Ok(()),
        _ => Err(denied),
    }
}
