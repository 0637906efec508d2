//! Builds source connectors from configuration.

use std::sync::Arc;

use tracing::info;

use pensive_core::config::source::{SourceConfig, SourceKind};
use pensive_core::result::AppResult;
use pensive_core::traits::source::{ConnectorFactory, SourceConnector};

use crate::timeseries::TimeseriesConnector;

/// Maps each configured source kind to its connector.
#[derive(Debug, Clone, Default)]
pub struct DefaultConnectorFactory;

impl DefaultConnectorFactory {
    /// Create a new factory.
    pub fn new() -> Self {
        Self
    }
}

impl ConnectorFactory for DefaultConnectorFactory {
    fn connector(&self, name: &str, config: &SourceConfig) -> AppResult<Arc<dyn SourceConnector>> {
        match config.kind {
            SourceKind::Timeseries => {
                info!(source = %name, url = %config.url, threads = config.threads, "Timeseries source configured");
                Ok(Arc::new(TimeseriesConnector::new(config.clone())))
            }
        }
    }
}
