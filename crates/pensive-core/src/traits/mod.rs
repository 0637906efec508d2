//! Collaborator traits defined in `pensive-core` and implemented by other crates.

pub mod render;
pub mod source;

pub use render::{PipelineFactory, PlotRequest, RenderPipeline, RenderedPlot};
pub use source::{ConnectorFactory, SourceConnector, UpstreamSource};
