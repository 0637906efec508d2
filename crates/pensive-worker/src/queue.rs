//! In-memory FIFO handoff between a scheduler and its workers.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::{Instant, timeout_at};

use pensive_core::error::AppError;
use pensive_core::result::AppResult;

use crate::job::PlotJob;

/// A FIFO job queue shared by one scheduler and its worker pool.
///
/// Unbounded unless a capacity is given, in which case enqueueing onto a full
/// queue waits until a worker takes a job. Requeued jobs ignore the capacity.
#[derive(Debug)]
pub struct JobQueue {
    /// Queue name, for logging.
    name: String,
    /// Pending jobs, oldest first.
    jobs: Mutex<VecDeque<PlotJob>>,
    /// Wakes one waiting worker per pushed job.
    available: Notify,
    /// Wakes one waiting producer per taken job.
    space: Notify,
    /// Optional bound on pending jobs.
    capacity: Option<usize>,
}

impl JobQueue {
    /// Create an empty queue.
    pub fn new(name: impl Into<String>, capacity: Option<usize>) -> Self {
        Self {
            name: name.into(),
            jobs: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            space: Notify::new(),
            capacity,
        }
    }

    /// Queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a job, waiting for space when the queue is bounded and full.
    ///
    /// Fails only for a queue bounded to zero jobs, which could never accept
    /// one.
    pub async fn enqueue(&self, job: PlotJob) -> AppResult<()> {
        if self.capacity == Some(0) {
            return Err(AppError::queue(format!(
                "Queue '{}' has no capacity, dropping {} window {}",
                self.name, job.subnet, job.window_end
            )));
        }

        loop {
            let notified = self.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut jobs = self.jobs.lock().await;
                if self.capacity.is_none_or(|capacity| jobs.len() < capacity) {
                    jobs.push_back(job);
                    break;
                }
            }

            tracing::debug!(queue = %self.name, subnet = %job.subnet, "Queue full, waiting for space");
            notified.await;
        }

        self.available.notify_one();
        Ok(())
    }

    /// Put a job that is not yet due back at the tail.
    pub async fn requeue(&self, job: PlotJob) {
        self.jobs.lock().await.push_back(job);
        self.available.notify_one();
    }

    /// Take the oldest job, waiting up to `wait` for one to arrive.
    pub async fn dequeue_timeout(&self, wait: Duration) -> Option<PlotJob> {
        let deadline = Instant::now() + wait;
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(job) = self.jobs.lock().await.pop_front() {
                self.space.notify_one();
                return Some(job);
            }

            if timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }

    /// Number of pending jobs.
    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// Whether no jobs are pending.
    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}
