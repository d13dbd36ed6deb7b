//! Custom Axum extractors.

pub mod authorized;
pub mod current_user;
pub mod params;
pub mod validated_json;

pub use authorized::Authorized;
pub use current_user::CurrentUser;
pub use params::{ApiPath, ApiQuery};
pub use validated_json::ValidatedJson;
