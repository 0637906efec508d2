//! # pensive-source
//!
//! Upstream data sources for Pensive. Each worker opens its own connection
//! through a [`SourceConnector`](pensive_core::traits::SourceConnector) built
//! by [`DefaultConnectorFactory`].

pub mod factory;
pub mod geocsv;
pub mod timeseries;

pub use factory::DefaultConnectorFactory;
pub use timeseries::{TimeseriesConnector, TimeseriesSource};
