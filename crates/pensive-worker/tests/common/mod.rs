//! In-memory collaborators for dispatch tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use pensive_core::config::network::SubnetConfig;
use pensive_core::config::source::SourceConfig;
use pensive_core::error::AppError;
use pensive_core::result::AppResult;
use pensive_core::traits::render::{PipelineFactory, PlotRequest, RenderPipeline, RenderedPlot};
use pensive_core::traits::source::{ConnectorFactory, SourceConnector, UpstreamSource};
use pensive_core::types::{ChannelId, SampleBuffer};
use pensive_worker::scheduler::SchedulerSettings;
use pensive_worker::subnet::Subnet;

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

pub fn settings(threads: usize) -> SchedulerSettings {
    SchedulerSettings {
        threads,
        window: chrono::Duration::seconds(600),
        poll_interval: Duration::from_secs(2),
        retry_delay: Duration::from_secs(1),
        queue_capacity: None,
    }
}

/// Answers every fetch with a short buffer, except for channels listed as
/// missing (no data) or failing (transport error).
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    pub missing: HashSet<String>,
    pub failing: HashSet<String>,
}

#[async_trait]
impl UpstreamSource for ScriptedSource {
    async fn fetch(
        &self,
        channel: &ChannelId,
        t1: DateTime<Utc>,
        _t2: DateTime<Utc>,
    ) -> AppResult<Option<SampleBuffer>> {
        let key = channel.to_string();
        if self.failing.contains(&key) {
            return Err(AppError::upstream(format!("connection reset fetching {key}")));
        }
        if self.missing.contains(&key) {
            return Ok(None);
        }
        Ok(Some(SampleBuffer::new(t1, 1.0, vec![1.0, 2.0, 3.0])))
    }
}

/// Hands out clones of one scripted source and counts connections.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    pub source: ScriptedSource,
    pub connects: AtomicUsize,
}

impl ScriptedConnector {
    pub fn new(source: ScriptedSource) -> Arc<Self> {
        Arc::new(Self {
            source,
            connects: AtomicUsize::new(0),
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl SourceConnector for ScriptedConnector {
    fn connect(&self, _worker_name: &str) -> AppResult<Arc<dyn UpstreamSource>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.source.clone()))
    }
}

/// Records every request, optionally taking `delay` per render, and tracks
/// how many renders overlap.
#[derive(Debug, Default)]
pub struct RecordingPipeline {
    pub requests: Mutex<Vec<PlotRequest>>,
    pub delay: Duration,
    pub fail_first: usize,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingPipeline {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    pub fn failing_first(count: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_first: count,
            ..Self::default()
        })
    }

    pub async fn window_ends(&self) -> Vec<i64> {
        self.requests
            .lock()
            .await
            .iter()
            .map(|r| r.window_end.timestamp())
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.requests.lock().await.len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderPipeline for RecordingPipeline {
    async fn render(&self, request: PlotRequest) -> AppResult<RenderedPlot> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let paths = RenderedPlot {
            full: format!("{}/{}.png", request.network, request.subnet).into(),
            thumbnail: format!("{}/{}_thumb.png", request.network, request.subnet).into(),
        };
        self.requests.lock().await.push(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if call < self.fail_first {
            return Err(AppError::render("disk full"));
        }
        Ok(paths)
    }
}

pub fn subnet(
    name: &str,
    channels: &[&str],
    embargo_secs: i64,
    pipeline: Arc<RecordingPipeline>,
) -> Arc<Subnet> {
    Arc::new(Subnet::new(
        "AV",
        name,
        chrono::Duration::seconds(embargo_secs),
        channels.iter().map(|c| c.parse().unwrap()).collect(),
        pipeline,
    ))
}

/// Gives every subnet the same recording pipeline.
pub struct SharedPipelineFactory(pub Arc<RecordingPipeline>);

impl PipelineFactory for SharedPipelineFactory {
    fn pipeline(&self, _network: &str, _subnet: &SubnetConfig) -> AppResult<Arc<dyn RenderPipeline>> {
        Ok(self.0.clone())
    }
}

/// Gives every source the same scripted connector.
pub struct SharedConnectorFactory(pub Arc<ScriptedConnector>);

impl ConnectorFactory for SharedConnectorFactory {
    fn connector(&self, _name: &str, _config: &SourceConfig) -> AppResult<Arc<dyn SourceConnector>> {
        Ok(self.0.clone())
    }
}
