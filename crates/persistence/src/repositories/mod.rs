//! Repository implementations for database operations.

pub mod building;
pub mod document;
pub mod invite;
pub mod profile;
pub mod saga;

pub use building::{BuildingRepository, MemberInput};
pub use document::DocumentRepository;
pub use invite::{InviteRepository, PendingInviteInput};
pub use profile::ProfileRepository;
pub use saga::{SagaRepository, SagaStateInput};
