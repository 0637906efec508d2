//! Builds schedulers from configuration and drives their lifecycle.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;

use pensive_core::config::AppConfig;
use pensive_core::error::AppError;
use pensive_core::result::AppResult;
use pensive_core::traits::render::PipelineFactory;
use pensive_core::traits::source::ConnectorFactory;

use crate::clock::Clock;
use crate::policy::SchedulingPolicy;
use crate::scheduler::{PlotScheduler, SchedulerSettings};
use crate::subnet::Subnet;
use crate::trigger;

/// Whether to follow the present or replay a historical range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Plot each window as it completes, until shut down.
    Realtime,
    /// Plot every window in `[start, end]` once and exit.
    Backfill {
        /// Range start.
        start: DateTime<Utc>,
        /// Range end.
        end: DateTime<Utc>,
    },
}

/// Owns one scheduler per upstream source that has work to do.
#[derive(Debug)]
pub struct Orchestrator {
    schedulers: Vec<Arc<PlotScheduler>>,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    /// Build schedulers and subnets from `config`.
    ///
    /// Subnets without channels, without a usable data source, or with
    /// malformed channels are skipped, as are schedulers left without
    /// subnets. It is an error for no networks to be configured or for no
    /// scheduler to survive.
    pub fn build(
        config: &AppConfig,
        mode: RunMode,
        connectors: &dyn ConnectorFactory,
        pipelines: &dyn PipelineFactory,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        if config.networks.is_empty() {
            return Err(AppError::configuration("No networks configured"));
        }

        let window = config.schedule.window();
        let policy = match mode {
            RunMode::Realtime => SchedulingPolicy::Realtime {
                window_choice: config.schedule.realtime_window,
            },
            RunMode::Backfill { start, end } => SchedulingPolicy::Backfill { start, end },
        };

        let mut schedulers: BTreeMap<String, PlotScheduler> = BTreeMap::new();
        for (name, source) in &config.sources {
            let connector = match connectors.connector(name, source) {
                Ok(connector) => connector,
                Err(e) => {
                    tracing::error!(source = %name, error = %e, "Cannot use data source, skipping");
                    continue;
                }
            };
            let settings = SchedulerSettings {
                threads: source.threads,
                window,
                poll_interval: config.schedule.poll_interval(),
                retry_delay: config.schedule.retry_delay(),
                queue_capacity: config.schedule.queue_capacity,
            };
            schedulers.insert(
                name.clone(),
                PlotScheduler::new(name, policy, settings, connector, Arc::clone(&clock)),
            );
        }

        for network in &config.networks {
            if network.subnets.is_empty() {
                tracing::info!(network = %network.name, "Network has no subnets, skipping");
                continue;
            }

            for subnet in &network.subnets {
                if subnet.channels.is_empty() {
                    tracing::warn!(network = %network.name, subnet = %subnet.name, "Subnet has no channels, skipping");
                    continue;
                }

                let Some(source_name) = subnet.data_source.as_deref() else {
                    tracing::error!(network = %network.name, subnet = %subnet.name, "Subnet has no data source, skipping");
                    continue;
                };
                let Some(scheduler) = schedulers.get_mut(source_name) else {
                    tracing::error!(
                        network = %network.name,
                        subnet = %subnet.name,
                        source = %source_name,
                        "Subnet references an unknown data source, skipping"
                    );
                    continue;
                };

                let built = pipelines
                    .pipeline(&network.name, subnet)
                    .and_then(|pipeline| Subnet::from_config(&network.name, subnet, pipeline));
                match built {
                    Ok(built) => scheduler.add(Arc::new(built)),
                    Err(e) => {
                        tracing::error!(network = %network.name, subnet = %subnet.name, error = %e, "Invalid subnet, skipping");
                    }
                }
            }
        }

        let schedulers: Vec<Arc<PlotScheduler>> = schedulers
            .into_values()
            .filter(|scheduler| {
                let keep = scheduler.subnet_count() > 0;
                if !keep {
                    tracing::warn!(scheduler = %scheduler.name(), "No subnets use this data source, pruning");
                }
                keep
            })
            .map(Arc::new)
            .collect();

        if schedulers.is_empty() {
            return Err(AppError::configuration("No subnets to plot"));
        }

        Ok(Self {
            schedulers,
            window,
            clock,
        })
    }

    /// Schedulers that survived pruning, ordered by source name.
    pub fn schedulers(&self) -> &[Arc<PlotScheduler>] {
        &self.schedulers
    }

    /// Run every scheduler's single pass, let the workers drain the queues,
    /// and return the number of jobs executed.
    ///
    /// Workers start before the pass so a bounded queue keeps draining while
    /// the pass waits for space.
    pub async fn run_backfill(&self) -> AppResult<usize> {
        self.start_all().await?;

        for scheduler in &self.schedulers {
            trigger::fire(scheduler.as_ref(), self.clock.now()).await;
        }

        self.stop_all().await;
        Ok(self.join_all().await)
    }

    /// Start every scheduler and trigger passes at window boundaries until
    /// `shutdown` turns true, then stop and drain.
    pub async fn run_realtime(&self, shutdown: watch::Receiver<bool>) -> AppResult<usize> {
        self.start_all().await?;

        let drivers: Vec<_> = self
            .schedulers
            .iter()
            .map(|scheduler| {
                tokio::spawn(trigger::run_realtime(
                    Arc::clone(scheduler),
                    Arc::clone(&self.clock),
                    self.window,
                    shutdown.clone(),
                ))
            })
            .collect();

        for driver in drivers {
            if let Err(e) = driver.await {
                tracing::error!(error = %e, "Trigger task failed");
            }
        }

        self.stop_all().await;
        Ok(self.join_all().await)
    }

    async fn start_all(&self) -> AppResult<()> {
        for (index, scheduler) in self.schedulers.iter().enumerate() {
            if let Err(e) = scheduler.start().await {
                for started in &self.schedulers[..index] {
                    started.stop().await;
                }
                return Err(e);
            }
        }
        Ok(())
    }

    async fn stop_all(&self) {
        for scheduler in &self.schedulers {
            scheduler.stop().await;
        }
    }

    async fn join_all(&self) -> usize {
        let mut executed = 0;
        for scheduler in &self.schedulers {
            executed += scheduler.join().await;
        }
        tracing::info!(executed, "All schedulers drained");
        executed
    }
}
