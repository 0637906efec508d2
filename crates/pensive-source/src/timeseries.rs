//! HTTP time-series source.
//!
//! Queries an FDSN-style time-series endpoint for GeoCSV and turns the
//! response into a [`SampleBuffer`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use tracing::debug;

use pensive_core::config::source::SourceConfig;
use pensive_core::error::{AppError, ErrorKind};
use pensive_core::result::AppResult;
use pensive_core::traits::source::{SourceConnector, UpstreamSource};
use pensive_core::types::{ChannelId, SampleBuffer};

use crate::geocsv;

const RESPONSE_FORMAT: &str = "geocsv.slist";

/// One worker's connection to a time-series service.
#[derive(Debug, Clone)]
pub struct TimeseriesSource {
    /// Name of the owning worker, for logging.
    name: String,
    /// Query endpoint.
    url: String,
    /// Optional basic-auth credentials.
    credentials: Option<(String, Option<String>)>,
    /// Dedicated HTTP client.
    client: Client,
}

impl TimeseriesSource {
    /// Open a connection described by `config`.
    pub fn new(name: &str, config: &SourceConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("pensive/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build HTTP client for {name}"),
                    e,
                )
            })?;

        Ok(Self {
            name: name.to_string(),
            url: config.url.clone(),
            credentials: config
                .user
                .clone()
                .map(|user| (user, config.password.clone())),
            client,
        })
    }

    /// Query parameters for one channel and time range.
    pub fn query_params(
        channel: &ChannelId,
        t1: DateTime<Utc>,
        t2: DateTime<Utc>,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("net", channel.network.clone()),
            ("sta", channel.station.clone()),
            ("loc", channel.location_or_dashes().to_string()),
            ("cha", channel.channel.clone()),
            ("starttime", format_time(t1)),
            ("endtime", format_time(t2)),
            ("format", RESPONSE_FORMAT.to_string()),
        ]
    }
}

#[async_trait]
impl UpstreamSource for TimeseriesSource {
    async fn fetch(
        &self,
        channel: &ChannelId,
        t1: DateTime<Utc>,
        t2: DateTime<Utc>,
    ) -> AppResult<Option<SampleBuffer>> {
        let mut request = self
            .client
            .get(&self.url)
            .query(&Self::query_params(channel, t1, t2));
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_deref());
        }

        let response = request.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Upstream,
                format!("Request for {channel} failed on {}", self.name),
                e,
            )
        })?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            debug!(source = %self.name, %channel, "No data");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::upstream(format!(
                "Request for {channel} returned HTTP {status}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Upstream,
                format!("Failed to read response body for {channel}"),
                e,
            )
        })?;

        geocsv::parse(&body, t1, t2).map_err(|e| {
            AppError::upstream(format!("Unreadable response for {channel}: {}", e.message))
        })
    }
}

/// Opens a fresh [`TimeseriesSource`] per worker.
#[derive(Debug, Clone)]
pub struct TimeseriesConnector {
    config: SourceConfig,
}

impl TimeseriesConnector {
    /// Create a connector for one configured source.
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

impl SourceConnector for TimeseriesConnector {
    fn connect(&self, worker_name: &str) -> AppResult<Arc<dyn UpstreamSource>> {
        Ok(Arc::new(TimeseriesSource::new(worker_name, &self.config)?))
    }
}

fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
        .trim_end_matches('Z')
        .to_string()
}
