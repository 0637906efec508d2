//! Worker loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Duration as WindowDuration;

use pensive_core::traits::source::UpstreamSource;

use crate::clock::Clock;
use crate::job::PlotJob;
use crate::queue::JobQueue;

/// Loop timing for a worker.
#[derive(Debug, Clone, Copy)]
pub struct WorkerTiming {
    /// Plot window length.
    pub window: WindowDuration,
    /// Longest wait for a job before re-checking the stop flag.
    pub poll_interval: Duration,
    /// Pause after requeueing a job that is not yet due.
    pub retry_delay: Duration,
}

/// Pulls jobs from a queue and renders them with its own upstream connection.
#[derive(Debug)]
pub struct Worker {
    name: String,
    queue: Arc<JobQueue>,
    source: Arc<dyn UpstreamSource>,
    clock: Arc<dyn Clock>,
    timing: WorkerTiming,
    running: Arc<AtomicBool>,
}

impl Worker {
    /// Create a worker. It starts in the running state.
    pub fn new(
        name: impl Into<String>,
        queue: Arc<JobQueue>,
        source: Arc<dyn UpstreamSource>,
        clock: Arc<dyn Clock>,
        timing: WorkerTiming,
    ) -> Self {
        Self {
            name: name.into(),
            queue,
            source,
            clock,
            timing,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Worker name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared handle on the running flag.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Ask the loop to finish once the queue is empty.
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run until stopped and the queue is observed empty.
    ///
    /// Returns the number of jobs executed.
    pub async fn run(self) -> usize {
        tracing::debug!(worker = %self.name, "Worker started");
        let mut executed = 0;

        while self.is_running() || !self.queue.is_empty().await {
            let Some(job) = self.queue.dequeue_timeout(self.timing.poll_interval).await else {
                continue;
            };

            if !job.is_due(self.clock.now()) {
                tracing::trace!(
                    worker = %self.name,
                    subnet = %job.subnet,
                    not_before = %job.not_before,
                    "Job not yet due, requeueing"
                );
                self.queue.requeue(job).await;
                tokio::time::sleep(self.timing.retry_delay).await;
                continue;
            }

            self.execute(job).await;
            executed += 1;
        }

        tracing::debug!(worker = %self.name, executed, "Worker stopped");
        executed
    }

    async fn execute(&self, job: PlotJob) {
        let started = std::time::Instant::now();
        match job
            .subnet
            .render(job.window_end, self.timing.window, self.source.as_ref())
            .await
        {
            Ok(plot) => {
                tracing::info!(
                    worker = %self.name,
                    job = %job.id,
                    subnet = %job.subnet,
                    window_end = %job.window_end,
                    path = %plot.full.display(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Plotted"
                );
            }
            Err(e) => {
                tracing::error!(
                    worker = %self.name,
                    job = %job.id,
                    subnet = %job.subnet,
                    window_end = %job.window_end,
                    error = %e,
                    "Plot failed"
                );
            }
        }
    }
}
