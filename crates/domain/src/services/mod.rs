//! Domain services for Building Manager.
//!
//! Services contain business logic that operates on domain models. External
//! systems sit behind the traits in `store`, `identity` and `storage`.

pub mod authorization;
pub mod identity;
pub mod memory;
pub mod onboarding;
pub mod saga;
pub mod storage;
pub mod store;

pub use authorization::{
    authorize, authorize_building_manager, authorize_document_read, AdminOnly,
    AuthorizationError, BuildingCapability, Capability, ManagerAccess, RoleRequirement,
};
pub use identity::{IdentityError, IdentityProvider, IdentityUser, NewIdentityUser, Session};
pub use memory::{InMemoryStore, MockIdentityProvider, MockObjectStorage};
pub use onboarding::{
    AddMemberOutcome, ClaimOutcome, DeleteMemberOutcome, Onboarding, OnboardingError,
    OnboardingSettings, RecoveryReport, ValidationFailure,
};
pub use saga::SagaLog;
pub use storage::{ObjectStorage, StorageError};
pub use store::{BuildingStore, StoreError};
