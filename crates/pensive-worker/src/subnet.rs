//! Subnets: named groups of channels plotted together.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use pensive_core::config::network::SubnetConfig;
use pensive_core::error::AppError;
use pensive_core::result::AppResult;
use pensive_core::traits::render::{PlotRequest, RenderPipeline, RenderedPlot};
use pensive_core::traits::source::UpstreamSource;
use pensive_core::types::{ChannelId, ChannelTrace};

/// One subnet and its render pipeline.
///
/// Renders of the same subnet never overlap, whichever worker or scheduler
/// asks for them.
#[derive(Debug)]
pub struct Subnet {
    network: String,
    name: String,
    embargo: Duration,
    channels: Vec<ChannelId>,
    pipeline: Arc<dyn RenderPipeline>,
    render_lock: Mutex<()>,
}

impl Subnet {
    /// Create a subnet.
    pub fn new(
        network: impl Into<String>,
        name: impl Into<String>,
        embargo: Duration,
        channels: Vec<ChannelId>,
        pipeline: Arc<dyn RenderPipeline>,
    ) -> Self {
        Self {
            network: network.into(),
            name: name.into(),
            embargo,
            channels,
            pipeline,
            render_lock: Mutex::new(()),
        }
    }

    /// Build a subnet of `network` from its configuration block.
    pub fn from_config(
        network: &str,
        config: &SubnetConfig,
        pipeline: Arc<dyn RenderPipeline>,
    ) -> AppResult<Self> {
        let channels = config
            .channels
            .iter()
            .map(|c| c.parse::<ChannelId>())
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(Self::new(
            network,
            &config.name,
            config.embargo(),
            channels,
            pipeline,
        ))
    }

    /// Network name.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Subnet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delay between a window's end and when it may be plotted.
    pub fn embargo(&self) -> Duration {
        self.embargo
    }

    /// Channels in plot order.
    pub fn channels(&self) -> &[ChannelId] {
        &self.channels
    }

    /// Fetch every channel for `[window_end - window, window_end)` from
    /// `source` and render the result.
    ///
    /// A channel whose fetch fails is rendered as "no data"; only render
    /// failures are returned.
    pub async fn render(
        &self,
        window_end: DateTime<Utc>,
        window: Duration,
        source: &dyn UpstreamSource,
    ) -> AppResult<RenderedPlot> {
        let _guard = self.render_lock.lock().await;
        let window_start = window_end - window;

        let mut traces = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let trace = match source.fetch(channel, window_start, window_end).await {
                Ok(Some(data)) => ChannelTrace::with_data(channel.clone(), data),
                Ok(None) => {
                    tracing::debug!(subnet = %self, %channel, "No data");
                    ChannelTrace::no_data(channel.clone())
                }
                Err(e) => {
                    tracing::warn!(subnet = %self, %channel, error = %e, "Fetch failed, plotting as no data");
                    ChannelTrace::no_data(channel.clone())
                }
            };
            traces.push(trace);
        }

        self.pipeline
            .render(PlotRequest {
                network: self.network.clone(),
                subnet: self.name.clone(),
                window_end,
                window,
                traces,
            })
            .await
    }
}

impl std::fmt::Display for Subnet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.network, self.name)
    }
}
