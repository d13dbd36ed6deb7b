//! Clients for external services and request-scoped helpers.

pub mod cookies;
pub mod hosted_identity;
pub mod hosted_storage;

pub use cookies::CookieHelper;
pub use hosted_identity::HostedIdentityClient;
pub use hosted_storage::HostedStorageClient;
