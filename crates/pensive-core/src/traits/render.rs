//! Render pipeline traits.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::config::network::SubnetConfig;
use crate::result::AppResult;
use crate::types::ChannelTrace;

/// Everything needed to draw one subnet window.
#[derive(Debug, Clone)]
pub struct PlotRequest {
    /// Network the subnet belongs to.
    pub network: String,
    /// Subnet name.
    pub subnet: String,
    /// End of the plotted window (exclusive).
    pub window_end: DateTime<Utc>,
    /// Window length.
    pub window: Duration,
    /// One trace per configured channel, in plot order.
    pub traces: Vec<ChannelTrace>,
}

impl PlotRequest {
    /// Start of the plotted window (inclusive).
    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_end - self.window
    }
}

/// Files produced for one subnet window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPlot {
    /// Full-size image.
    pub full: PathBuf,
    /// Thumbnail image.
    pub thumbnail: PathBuf,
}

/// Turns fetched traces into plot artifacts.
///
/// Implementations may hold mutable per-subnet state; callers serialize
/// calls for the same subnet.
#[async_trait]
pub trait RenderPipeline: Send + Sync + std::fmt::Debug + 'static {
    /// Draw and write the plot for one window.
    async fn render(&self, request: PlotRequest) -> AppResult<RenderedPlot>;
}

/// Builds the render pipeline of each configured subnet.
pub trait PipelineFactory: Send + Sync {
    /// Build the pipeline for `subnet` of `network`.
    fn pipeline(&self, network: &str, subnet: &SubnetConfig) -> AppResult<Arc<dyn RenderPipeline>>;
}
