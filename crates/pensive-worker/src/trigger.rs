//! Realtime trigger driver.
//!
//! Fires a pass immediately, then at every window boundary of the wall clock.
//! Each boundary pass is stamped with the boundary itself, so a timer that
//! wakes slightly early cannot re-emit the previous window. A failed or
//! panicking pass is logged and the next trigger is armed as usual.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::FutureExt;
use tokio::sync::watch;

use pensive_core::types::window::next_boundary;

use crate::clock::Clock;
use crate::scheduler::SchedulingPass;

/// Drive `target` until `shutdown` turns true or its sender is dropped.
///
/// Returns the number of passes fired.
pub async fn run_realtime<T>(
    target: Arc<T>,
    clock: Arc<dyn Clock>,
    window: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> usize
where
    T: SchedulingPass + ?Sized,
{
    let mut fired = 0;
    let mut fire_at = clock.now();

    while !*shutdown.borrow() {
        fire(target.as_ref(), fire_at).await;
        fired += 1;

        let now = clock.now();
        fire_at = next_boundary(now.max(fire_at), window);
        let wait = (fire_at - now).to_std().unwrap_or_default();
        tracing::trace!(
            scheduler = target.name(),
            next = %fire_at,
            wait_ms = wait.as_millis() as u64,
            "Next pass armed"
        );

        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::time::sleep(wait) => {}
        }
    }

    tracing::info!(scheduler = target.name(), fired, "Realtime trigger stopped");
    fired
}

/// Run one pass as of `now`, logging rather than propagating any failure.
pub async fn fire<T>(target: &T, now: DateTime<Utc>)
where
    T: SchedulingPass + ?Sized,
{
    match AssertUnwindSafe(target.trigger_pass_at(now)).catch_unwind().await {
        Ok(Ok(enqueued)) => {
            tracing::debug!(scheduler = target.name(), enqueued, "Pass fired");
        }
        Ok(Err(e)) => {
            tracing::error!(scheduler = target.name(), error = %e, "Scheduling pass failed");
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(scheduler = target.name(), panic = %message, "Scheduling pass panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pensive_core::error::AppError;
    use pensive_core::result::AppResult;

    use super::*;
    use crate::clock::ManualClock;
    use crate::test_support::at;

    /// Fails on the first call, panics on the second, then succeeds. Asks for
    /// shutdown after `stop_after` calls.
    struct FlakyPass {
        calls: AtomicUsize,
        fired_at: Mutex<Vec<i64>>,
        stop_after: usize,
        clock: Arc<ManualClock>,
        shutdown: watch::Sender<bool>,
    }

    #[async_trait]
    impl SchedulingPass for FlakyPass {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn trigger_pass_at(&self, now: DateTime<Utc>) -> AppResult<usize> {
            self.fired_at.lock().unwrap().push(now.timestamp());
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.clock.advance(Duration::seconds(600));
            if call >= self.stop_after {
                let _ = self.shutdown.send(true);
            }
            match call {
                1 => Err(AppError::internal("boom")),
                2 => panic!("pass panicked"),
                _ => Ok(1),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_triggering() {
        let clock = Arc::new(ManualClock::new(at(1000)));
        let (tx, rx) = watch::channel(false);
        let pass = Arc::new(FlakyPass {
            calls: AtomicUsize::new(0),
            fired_at: Mutex::new(Vec::new()),
            stop_after: 4,
            clock: clock.clone(),
            shutdown: tx,
        });

        let fired = run_realtime(pass.clone(), clock, Duration::seconds(600), rx).await;

        assert_eq!(fired, 4);
        assert_eq!(pass.calls.load(Ordering::SeqCst), 4);
        assert_eq!(*pass.fired_at.lock().unwrap(), vec![1000, 1800, 2400, 3000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_next_boundary() {
        let clock = Arc::new(ManualClock::new(at(1000)));
        let (tx, rx) = watch::channel(false);
        let pass = Arc::new(FlakyPass {
            calls: AtomicUsize::new(2),
            fired_at: Mutex::new(Vec::new()),
            stop_after: usize::MAX,
            clock: Arc::new(ManualClock::new(at(0))),
            shutdown: watch::channel(false).0,
        });

        let started = tokio::time::Instant::now();
        let driver = tokio::spawn(run_realtime(pass.clone(), clock, Duration::seconds(600), rx));

        tokio::time::sleep(std::time::Duration::from_secs(199)).await;
        assert_eq!(pass.calls.load(Ordering::SeqCst), 3);

        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        assert_eq!(pass.calls.load(Ordering::SeqCst), 4);
        assert!(started.elapsed() >= std::time::Duration::from_secs(200));

        tx.send(true).unwrap();
        assert_eq!(driver.await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_boundary_pass_uses_boundary_when_clock_lags() {
        // The wall clock never reaches the boundary the timer slept towards.
        let clock = Arc::new(ManualClock::new(at(1000)));
        let (tx, rx) = watch::channel(false);
        let pass = Arc::new(FlakyPass {
            calls: AtomicUsize::new(2),
            fired_at: Mutex::new(Vec::new()),
            stop_after: usize::MAX,
            clock: Arc::new(ManualClock::new(at(0))),
            shutdown: watch::channel(false).0,
        });

        let driver = tokio::spawn(run_realtime(pass.clone(), clock, Duration::seconds(600), rx));

        tokio::time::sleep(std::time::Duration::from_secs(201)).await;
        assert_eq!(*pass.fired_at.lock().unwrap(), vec![1000, 1200]);

        tokio::time::sleep(std::time::Duration::from_secs(400)).await;
        assert_eq!(*pass.fired_at.lock().unwrap(), vec![1000, 1200]);

        tokio::time::sleep(std::time::Duration::from_secs(400)).await;
        assert_eq!(*pass.fired_at.lock().unwrap(), vec![1000, 1200, 1800]);

        tx.send(true).unwrap();
        assert_eq!(driver.await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_already_shut_down_never_fires() {
        let clock = Arc::new(ManualClock::new(at(1000)));
        let (tx, rx) = watch::channel(true);
        let pass = Arc::new(FlakyPass {
            calls: AtomicUsize::new(0),
            fired_at: Mutex::new(Vec::new()),
            stop_after: usize::MAX,
            clock: clock.clone(),
            shutdown: tx,
        });

        assert_eq!(run_realtime(pass.clone(), clock, Duration::seconds(600), rx).await, 0);
        assert_eq!(pass.calls.load(Ordering::SeqCst), 0);
    }
}
