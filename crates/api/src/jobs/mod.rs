//! Background job scheduler and job implementations.

mod pool_metrics;
mod rate_limit_prune;
mod scheduler;
mod webauthn_cleanup;

pub use pool_metrics::PoolMetricsJob;
pub use rate_limit_prune::RateLimitPruneJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use webauthn_cleanup::WebAuthnCleanupJob;
