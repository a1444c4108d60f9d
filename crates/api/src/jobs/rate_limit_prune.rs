//! Forgets rate limit state of users who have gone quiet.

use std::sync::Arc;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::RateLimiterState;

pub struct RateLimitPruneJob {
    limiter: Arc<RateLimiterState>,
}

impl RateLimitPruneJob {
    pub fn new(limiter: Arc<RateLimiterState>) -> Self {
        Self { limiter }
    }
}

#[async_trait::async_trait]
impl Job for RateLimitPruneJob {
    fn name(&self) -> &'static str {
        "rate_limit_prune"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(5)
    }

    async fn execute(&self) -> Result<(), String> {
        let tracked = self.limiter.prune();
        metrics::gauge!("rate_limit_tracked_users").set(tracked as f64);
        tracing::trace!(tracked, "Rate limiter pruned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_execute_prunes() {
        let limiter = Arc::new(RateLimiterState::new(10).unwrap());
        limiter.check(Uuid::new_v4()).unwrap();

        let job = RateLimitPruneJob::new(limiter.clone());
        assert_eq!(job.name(), "rate_limit_prune");
        assert_eq!(job.frequency().duration().as_secs(), 300);
        assert!(job.execute().await.is_ok());
        // Still inside its minute, so the user stays tracked
        assert_eq!(limiter.tracked_users(), 1);
    }
}
