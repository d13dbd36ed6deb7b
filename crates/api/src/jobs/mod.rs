//! Background jobs: the interval scheduler, pool metrics and the startup
//! saga recovery pass.

mod pool_metrics;
mod saga_recovery;
mod scheduler;

pub use pool_metrics::PoolMetricsJob;
pub use saga_recovery::recover_interrupted_sagas;
pub use scheduler::{Job, JobFrequency, JobScheduler};
