//! PNG render pipeline.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::{ImageFormat, RgbImage};
use tracing::{debug, warn};

use pensive_core::config::network::SubnetConfig;
use pensive_core::config::output::OutputConfig;
use pensive_core::error::{AppError, ErrorKind};
use pensive_core::result::AppResult;
use pensive_core::traits::render::{PipelineFactory, PlotRequest, RenderPipeline, RenderedPlot};

use crate::data;
use crate::layout::OutputLayout;
use crate::plot::{self, PlotGeometry};

/// Draws and writes the plots of one subnet.
#[derive(Debug, Clone)]
pub struct PngPipeline {
    /// Shared file naming rules.
    layout: Arc<OutputLayout>,
    /// Full-size plot geometry.
    full: PlotGeometry,
    /// Thumbnail geometry.
    thumbnail: PlotGeometry,
    /// Whether to append raw samples to data files.
    write_data: bool,
}

impl PngPipeline {
    /// Create a pipeline writing under `layout`.
    pub fn new(layout: Arc<OutputLayout>, output: &OutputConfig) -> Self {
        Self {
            layout,
            full: PlotGeometry::full(output.plot_width, output.plot_height),
            thumbnail: PlotGeometry::thumbnail(output.thumb_width, output.thumb_height),
            write_data: output.write_data,
        }
    }

    async fn write_data_files(&self, request: &PlotRequest) {
        let (t1, t2) = (request.window_start(), request.window_end);
        for trace in &request.traces {
            let Some(samples) = trace.data.as_ref() else {
                continue;
            };
            let result = match self.layout.data_path(
                &request.network,
                &request.subnet,
                &trace.channel,
                request.window_end,
            ) {
                Ok(path) => data::append(&path, &data::to_csv(samples, t1, t2)).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!(channel = %trace.channel, error = %e, "Failed to write sample data");
            }
        }
    }
}

#[async_trait]
impl RenderPipeline for PngPipeline {
    async fn render(&self, request: PlotRequest) -> AppResult<RenderedPlot> {
        let paths = self
            .layout
            .plot_paths(&request.network, &request.subnet, request.window_end)?;

        if self.write_data {
            self.write_data_files(&request).await;
        }

        let full = self.full;
        let thumbnail = self.thumbnail;
        let output = paths.clone();
        tokio::task::spawn_blocking(move || {
            let start = request.window_start();
            let image = plot::draw(&request.traces, start, request.window, full);
            write_png(&image, &output.full)?;
            let thumb = plot::draw(&request.traces, start, request.window, thumbnail);
            write_png(&thumb, &output.thumbnail)
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Render task panicked", e))??;

        debug!(
            full = %paths.full.display(),
            thumbnail = %paths.thumbnail.display(),
            "Wrote plots"
        );
        Ok(paths)
    }
}

fn write_png(image: &RgbImage, path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create plot directory: {}", parent.display()),
                e,
            )
        })?;
    }
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Render,
                format!("Cannot write {}", path.display()),
                e,
            )
        })
}

/// Builds a [`PngPipeline`] for every subnet from shared output settings.
#[derive(Debug, Clone)]
pub struct PngPipelineFactory {
    layout: Arc<OutputLayout>,
    output: OutputConfig,
}

impl PngPipelineFactory {
    /// Create a factory, validating the output formats once.
    pub fn new(output: &OutputConfig) -> AppResult<Self> {
        Ok(Self {
            layout: Arc::new(OutputLayout::new(output)?),
            output: output.clone(),
        })
    }
}

impl PipelineFactory for PngPipelineFactory {
    fn pipeline(&self, network: &str, subnet: &SubnetConfig) -> AppResult<Arc<dyn RenderPipeline>> {
        debug!(network, subnet = %subnet.name, root = %self.layout.root().display(), "Building PNG pipeline");
        Ok(Arc::new(PngPipeline::new(self.layout.clone(), &self.output)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use pensive_core::types::{ChannelId, ChannelTrace, SampleBuffer};

    fn output(root: &Path, write_data: bool) -> OutputConfig {
        OutputConfig {
            path_root: root.display().to_string(),
            write_data,
            ..OutputConfig::default()
        }
    }

    fn request() -> PlotRequest {
        let end = DateTime::from_timestamp(1_706_790_600, 0).unwrap();
        let window = Duration::seconds(600);
        let samples = (0..6000).map(|i| (i as f64 / 7.0).sin()).collect();
        let channel: ChannelId = "SPCP BHZ AV".parse().unwrap();
        PlotRequest {
            network: "AV".to_string(),
            subnet: "Spurr".to_string(),
            window_end: end,
            window,
            traces: vec![
                ChannelTrace::with_data(channel, SampleBuffer::new(end - window, 10.0, samples)),
                ChannelTrace::no_data("CRP SHZ AV".parse().unwrap()),
            ],
        }
    }

    #[tokio::test]
    async fn test_render_writes_full_and_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = PngPipeline::new(
            Arc::new(OutputLayout::new(&output(dir.path(), false)).unwrap()),
            &output(dir.path(), false),
        );

        let rendered = pipeline.render(request()).await.unwrap();
        assert!(rendered.full.ends_with("AV/Spurr/2024/032/Spurr_20240201-1230.png"));

        let full = image::open(&rendered.full).unwrap();
        assert_eq!((full.width(), full.height()), (576, 756));
        let thumb = image::open(&rendered.thumbnail).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (151, 198));
    }

    #[tokio::test]
    async fn test_render_writes_data_for_channels_with_samples() {
        let dir = tempfile::tempdir().unwrap();
        let factory = PngPipelineFactory::new(&output(dir.path(), true)).unwrap();
        let subnet = SubnetConfig {
            name: "Spurr".to_string(),
            data_source: None,
            embargo_seconds: 5,
            channels: vec![],
        };
        let pipeline = factory.pipeline("AV", &subnet).unwrap();

        pipeline.render(request()).await.unwrap();

        let day = dir.path().join("AV/Spurr/2024/032");
        let data = std::fs::read_to_string(day.join("SPCP_BHZ_AV_20240201.dat")).unwrap();
        assert_eq!(data.lines().count(), 6000);
        assert!(!day.join("CRP_SHZ_AV_20240201.dat").exists());
    }
}
