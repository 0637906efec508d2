//! Plot job scheduling and dispatch for Pensive.
//!
//! This crate provides:
//! - Plot jobs and the realtime and backfill policies that produce them
//! - A per-source FIFO job queue and the worker loop that drains it
//! - The plot scheduler owning each source's worker pool
//! - A realtime trigger aligned to window boundaries
//! - The orchestrator that builds schedulers from configuration

pub mod clock;
pub mod job;
pub mod orchestrator;
pub mod policy;
pub mod queue;
pub mod scheduler;
pub mod subnet;
pub mod trigger;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use job::PlotJob;
pub use orchestrator::{Orchestrator, RunMode};
pub use policy::SchedulingPolicy;
pub use queue::JobQueue;
pub use scheduler::{PlotScheduler, SchedulerSettings, SchedulingPass};
pub use subnet::Subnet;
pub use worker::{Worker, WorkerTiming};
