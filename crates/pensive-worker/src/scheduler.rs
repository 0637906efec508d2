//! Plot scheduler: one per upstream source.
//!
//! Owns the source's job queue and worker pool and the subnets assigned to
//! it. Each scheduling pass asks the policy for jobs and enqueues them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as WindowDuration, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use pensive_core::error::AppError;
use pensive_core::result::AppResult;
use pensive_core::traits::source::SourceConnector;

use crate::clock::Clock;
use crate::policy::SchedulingPolicy;
use crate::queue::JobQueue;
use crate::subnet::Subnet;
use crate::worker::{Worker, WorkerTiming};

/// Something that can run a scheduling pass.
#[async_trait]
pub trait SchedulingPass: Send + Sync + 'static {
    /// Name for logging.
    fn name(&self) -> &str;

    /// Produce and enqueue one batch of jobs as of `now`. Returns how many
    /// were enqueued.
    async fn trigger_pass_at(&self, now: DateTime<Utc>) -> AppResult<usize>;
}

/// Pool and queue settings for one scheduler.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    /// Number of workers.
    pub threads: usize,
    /// Plot window length.
    pub window: WindowDuration,
    /// Worker dequeue wait.
    pub poll_interval: Duration,
    /// Worker pause after requeueing a job that is not yet due.
    pub retry_delay: Duration,
    /// Optional queue bound.
    pub queue_capacity: Option<usize>,
}

#[derive(Debug)]
struct WorkerHandle {
    name: String,
    running: Arc<AtomicBool>,
    task: JoinHandle<usize>,
}

/// Owns a worker pool and the subnets it plots.
#[derive(Debug)]
pub struct PlotScheduler {
    name: String,
    policy: SchedulingPolicy,
    settings: SchedulerSettings,
    queue: Arc<JobQueue>,
    subnets: Vec<Arc<Subnet>>,
    connector: Arc<dyn SourceConnector>,
    clock: Arc<dyn Clock>,
    workers: Mutex<Vec<WorkerHandle>>,
}

impl PlotScheduler {
    /// Create a scheduler with an empty queue and no workers.
    pub fn new(
        name: impl Into<String>,
        policy: SchedulingPolicy,
        settings: SchedulerSettings,
        connector: Arc<dyn SourceConnector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let name = name.into();
        Self {
            queue: Arc::new(JobQueue::new(name.clone(), settings.queue_capacity)),
            name,
            policy,
            settings,
            subnets: Vec::new(),
            connector,
            clock,
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Scheduler name, the same as its source's.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Job production policy.
    pub fn policy(&self) -> SchedulingPolicy {
        self.policy
    }

    /// Pool and queue settings.
    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// The shared job queue.
    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    /// Assign a subnet. Jobs already queued are unaffected.
    pub fn add(&mut self, subnet: Arc<Subnet>) {
        tracing::debug!(scheduler = %self.name, subnet = %subnet, "Subnet assigned");
        self.subnets.push(subnet);
    }

    /// Assigned subnets in assignment order.
    pub fn subnets(&self) -> &[Arc<Subnet>] {
        &self.subnets
    }

    /// Number of assigned subnets.
    pub fn subnet_count(&self) -> usize {
        self.subnets.len()
    }

    /// Start exactly `threads` workers, each with its own connection.
    ///
    /// If any connection cannot be opened, workers already started are
    /// stopped and the error is returned.
    pub async fn start(&self) -> AppResult<()> {
        let mut workers = self.workers.lock().await;
        if !workers.is_empty() {
            return Err(AppError::internal(format!(
                "Scheduler '{}' already started",
                self.name
            )));
        }

        let timing = WorkerTiming {
            window: self.settings.window,
            poll_interval: self.settings.poll_interval,
            retry_delay: self.settings.retry_delay,
        };

        for index in 0..self.settings.threads {
            let name = format!("{}-{index}", self.name);
            let source = match self.connector.connect(&name) {
                Ok(source) => source,
                Err(e) => {
                    for handle in workers.iter() {
                        handle.running.store(false, Ordering::SeqCst);
                    }
                    return Err(e);
                }
            };
            let worker = Worker::new(
                name.clone(),
                Arc::clone(&self.queue),
                source,
                Arc::clone(&self.clock),
                timing,
            );
            let running = worker.running_flag();
            let task = tokio::spawn(worker.run());
            workers.push(WorkerHandle {
                name,
                running,
                task,
            });
        }

        tracing::info!(
            scheduler = %self.name,
            policy = self.policy.label(),
            workers = workers.len(),
            subnets = self.subnets.len(),
            "Scheduler started"
        );
        Ok(())
    }

    /// Signal every worker to stop once the queue drains. Does not wait.
    pub async fn stop(&self) {
        let workers = self.workers.lock().await;
        for handle in workers.iter() {
            handle.running.store(false, Ordering::SeqCst);
        }
        tracing::info!(scheduler = %self.name, workers = workers.len(), "Scheduler stopping");
    }

    /// Number of started workers.
    pub async fn worker_count(&self) -> usize {
        self.workers.lock().await.len()
    }

    /// Number of workers whose running flag is still set.
    pub async fn running_workers(&self) -> usize {
        self.workers
            .lock()
            .await
            .iter()
            .filter(|handle| handle.running.load(Ordering::SeqCst))
            .count()
    }

    /// Run one pass as of the scheduler's clock.
    pub async fn trigger_pass(&self) -> AppResult<usize> {
        self.trigger_pass_at(self.clock.now()).await
    }

    /// Wait for every worker to finish. Returns the number of jobs executed.
    pub async fn join(&self) -> usize {
        let handles: Vec<WorkerHandle> = self.workers.lock().await.drain(..).collect();
        let mut executed = 0;
        for handle in handles {
            match handle.task.await {
                Ok(count) => executed += count,
                Err(e) => {
                    tracing::error!(worker = %handle.name, error = %e, "Worker task failed");
                }
            }
        }
        tracing::info!(scheduler = %self.name, executed, "Scheduler drained");
        executed
    }
}

#[async_trait]
impl SchedulingPass for PlotScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn trigger_pass_at(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let jobs = self
            .policy
            .produce_pass(&self.subnets, self.settings.window, now)?;

        let mut enqueued = 0;
        for job in jobs {
            let subnet = Arc::clone(&job.subnet);
            let window_end = job.window_end;
            match self.queue.enqueue(job).await {
                Ok(()) => enqueued += 1,
                Err(e) => {
                    tracing::error!(
                        scheduler = %self.name,
                        subnet = %subnet,
                        window_end = %window_end,
                        error = %e,
                        "Failed to enqueue job"
                    );
                }
            }
        }

        tracing::debug!(scheduler = %self.name, enqueued, "Scheduling pass complete");
        Ok(enqueued)
    }
}
