//! Interval scheduler for background jobs.
//!
//! Each job runs on its own tokio task and stops when the shutdown watch
//! channel flips to `true`.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How often a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    Seconds(u64),
    Minutes(u64),
}

impl JobFrequency {
    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs(*secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(*mins * 60),
        }
    }
}

/// A background job.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Name used in logs and metric labels.
    fn name(&self) -> &'static str;

    fn frequency(&self) -> JobFrequency;

    /// Runs one pass. The error string is logged; the job keeps its schedule.
    async fn execute(&self) -> Result<(), String>;
}

/// Runs one pass of `job` and records its outcome.
async fn run_once(job: &dyn Job) -> bool {
    let name = job.name();
    let start = Instant::now();
    let result = job.execute().await;
    let elapsed = start.elapsed();

    metrics::histogram!("background_job_duration_seconds", "job" => name)
        .record(elapsed.as_secs_f64());

    match result {
        Ok(()) => {
            metrics::counter!("background_job_runs_total", "job" => name, "outcome" => "ok")
                .increment(1);
            debug!(job = name, elapsed_ms = elapsed.as_millis() as u64, "Job completed");
            true
        }
        Err(e) => {
            metrics::counter!("background_job_runs_total", "job" => name, "outcome" => "error")
                .increment(1);
            error!(job = name, elapsed_ms = elapsed.as_millis() as u64, error = %e, "Job failed");
            false
        }
    }
}

/// Owns the registered jobs and their tasks.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            shutdown: watch::Sender::new(false),
            handles: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    /// Spawns one task per registered job. The first run happens one period
    /// after start.
    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown.subscribe();

            let handle = tokio::spawn(async move {
                let name = job.name();
                let frequency = job.frequency();
                let mut interval = tokio::time::interval(frequency.duration());
                interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                interval.tick().await;

                info!(job = name, frequency = ?frequency, "Job scheduled");

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            run_once(job.as_ref()).await;
                        }
                        changed = shutdown_rx.changed() => {
                            // A dropped sender also means shutdown
                            if changed.is_err() || *shutdown_rx.borrow() {
                                info!(job = name, "Job shutting down");
                                break;
                            }
                        }
                    }
                }
            });

            self.handles.push(handle);
        }
    }

    /// Signals every job to stop. Returns immediately.
    pub fn shutdown(&self) {
        info!("Stopping job scheduler");
        self.shutdown.send_replace(true);
    }

    /// Waits for all job tasks, giving up after `timeout`.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let shutdown_future = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Job task panicked");
                }
            }
        };

        match tokio::time::timeout(timeout, shutdown_future).await {
            Ok(()) => info!("All jobs stopped"),
            Err(_) => warn!(timeout = ?timeout, "Job shutdown timed out"),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJob {
        run_count: Arc<AtomicUsize>,
        should_fail: bool,
    }

    #[async_trait::async_trait]
    impl Job for CountingJob {
        fn name(&self) -> &'static str {
            "counting_job"
        }

        fn frequency(&self) -> JobFrequency {
            JobFrequency::Seconds(1)
        }

        async fn execute(&self) -> Result<(), String> {
            self.run_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err("simulated failure".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_job_frequency_duration() {
        assert_eq!(JobFrequency::Seconds(30).duration(), Duration::from_secs(30));
        assert_eq!(JobFrequency::Minutes(10).duration(), Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_run_once_reports_outcome() {
        let run_count = Arc::new(AtomicUsize::new(0));
        let ok = CountingJob {
            run_count: Arc::clone(&run_count),
            should_fail: false,
        };
        let failing = CountingJob {
            run_count: Arc::clone(&run_count),
            should_fail: true,
        };

        assert!(run_once(&ok).await);
        assert!(!run_once(&failing).await);
        assert_eq!(run_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_scheduler_shutdown_before_first_run() {
        let mut scheduler = JobScheduler::new();
        let run_count = Arc::new(AtomicUsize::new(0));
        scheduler.register(CountingJob {
            run_count: Arc::clone(&run_count),
            should_fail: false,
        });
        assert_eq!(scheduler.jobs.len(), 1);
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(100)).await;

        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;
        assert_eq!(run_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scheduler_runs_on_interval() {
        let mut scheduler = JobScheduler::default();
        let run_count = Arc::new(AtomicUsize::new(0));
        scheduler.register(CountingJob {
            run_count: Arc::clone(&run_count),
            should_fail: false,
        });
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(1500)).await;

        scheduler.shutdown();
        scheduler.wait_for_shutdown(Duration::from_secs(2)).await;
        assert_eq!(run_count.load(Ordering::SeqCst), 1);
    }
}
