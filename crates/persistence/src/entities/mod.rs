//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod building;
pub mod document;
pub mod invite;
pub mod profile;
pub mod saga;

pub use building::{BuildingEntity, BuildingMemberEntity};
pub use document::DocumentEntity;
pub use invite::{BuildingInviteEntity, PendingInviteEntity};
pub use profile::{MemberRoleDb, PlatformRoleDb, ProfileEntity};
pub use saga::{SagaEntity, SagaKindDb, SagaStatusDb};
