//! Shared fixtures for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use pensive_core::result::AppResult;
use pensive_core::traits::render::{PlotRequest, RenderPipeline, RenderedPlot};

use crate::subnet::Subnet;

#[derive(Debug)]
pub struct NullPipeline;

#[async_trait]
impl RenderPipeline for NullPipeline {
    async fn render(&self, _request: PlotRequest) -> AppResult<RenderedPlot> {
        Ok(RenderedPlot {
            full: "full.png".into(),
            thumbnail: "thumb.png".into(),
        })
    }
}

pub fn null_subnet(name: &str, embargo_secs: i64) -> Arc<Subnet> {
    Arc::new(Subnet::new(
        "AV",
        name,
        Duration::seconds(embargo_secs),
        vec!["SPCP BHZ AV".parse().unwrap()],
        Arc::new(NullPipeline),
    ))
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}
