//! Upstream data source traits.
//!
//! A [`SourceConnector`] opens one [`UpstreamSource`] per worker. Connections
//! are never shared between workers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::source::SourceConfig;
use crate::result::AppResult;
use crate::types::{ChannelId, SampleBuffer};

/// A connection to an upstream data source.
#[async_trait]
pub trait UpstreamSource: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch samples for `channel` covering `[t1, t2)`.
    ///
    /// Returns `Ok(None)` when the source has no data. Errors are reserved for
    /// transport failures.
    async fn fetch(
        &self,
        channel: &ChannelId,
        t1: DateTime<Utc>,
        t2: DateTime<Utc>,
    ) -> AppResult<Option<SampleBuffer>>;
}

/// Opens dedicated connections to one configured source.
pub trait SourceConnector: Send + Sync + std::fmt::Debug + 'static {
    /// Open a connection for the worker named `worker_name`.
    fn connect(&self, worker_name: &str) -> AppResult<Arc<dyn UpstreamSource>>;
}

/// Builds a connector for each `[sources.*]` entry.
pub trait ConnectorFactory: Send + Sync {
    /// Build the connector for source `name`.
    fn connector(&self, name: &str, config: &SourceConfig) -> AppResult<Arc<dyn SourceConnector>>;
}
