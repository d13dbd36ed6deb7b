//! Domain models for the Building Manager backend.

pub mod building;
pub mod document;
pub mod invite;
pub mod member;
pub mod onboarding;
pub mod profile;
pub mod role;
pub mod saga;

pub use building::Building;
pub use document::Document;
pub use invite::{BuildingInvite, InviteAvailability, NewBuildingInvite, NewPendingInvite, PendingInvite};
pub use member::{BuildingMember, NewBuildingMember};
pub use profile::{NewProfile, Profile, ProfileContactUpdate};
pub use role::{MemberRole, PlatformRole};
pub use saga::{Compensation, NewSaga, SagaKind, SagaRecord, SagaStatus, SagaStep, SagaUpdate};
