//! HTTP middleware components.

pub mod logging;
pub mod metrics;
pub mod session;
pub mod trace_id;

pub use metrics::{init_metrics, metrics_handler, metrics_middleware, record_onboarding_outcome};
pub use session::{session_middleware, SessionUser};
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
