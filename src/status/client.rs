use async_trait::async_trait;
use reqwest::{Client, Url, header};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::models::{Envelope, IncidentReport, LatestStatus, StatusSnapshot};
use crate::version::user_agent;

pub const INCIDENTS_PATH: &str = "/system/status/past";
pub const UPTIME_PATH: &str = "/system/uptime";
pub const LATEST_PATH: &str = "/system/status/last";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{url} returned non-success status: {status}. Body: {body}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid endpoint URL '{0}'")]
    InvalidUrl(String),
}

/// Source of the three records a page load needs.
///
/// The HTTP implementation is the production one; tests plug in fixed data.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Historical incident reports, in the order the API returns them.
    async fn fetch_incidents(&self) -> Result<Vec<IncidentReport>, FetchError>;

    /// Uptime as a percentage, e.g. `99.95`.
    async fn fetch_uptime(&self) -> Result<f64, FetchError>;

    async fn fetch_latest(&self) -> Result<LatestStatus, FetchError>;
}

/// Fetches incidents, uptime and the latest status, one after another.
pub async fn fetch_snapshot(source: &dyn StatusSource) -> Result<StatusSnapshot, FetchError> {
    let incidents = source.fetch_incidents().await?;
    let uptime = source.fetch_uptime().await?;
    let latest = source.fetch_latest().await?;

    info!(
        incidents = incidents.len(),
        uptime = uptime,
        latest = latest.status.css_class(),
        "Fetched status snapshot."
    );
    Ok(StatusSnapshot {
        incidents,
        uptime,
        latest,
    })
}

/// A `StatusSource` talking to the status API over HTTP.
pub struct HttpStatusSource {
    client: Client,
    incidents_url: Url,
    uptime_url: Url,
    latest_url: Url,
}

impl HttpStatusSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent())
            .build()?;
        Ok(Self {
            client,
            incidents_url: endpoint(base_url, INCIDENTS_PATH)?,
            uptime_url: endpoint(base_url, UPTIME_PATH)?,
            latest_url: endpoint(base_url, LATEST_PATH)?,
        })
    }

    async fn get_data<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "Request to status endpoint failed.");
                FetchError::Network(e)
            })?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(url = %url, status = %status, "Status endpoint returned non-success status.");
            return Err(FetchError::UnexpectedStatus {
                url: url.to_string(),
                status,
                body,
            });
        }

        let bytes = response.bytes().await?;
        let envelope: Envelope<T> = serde_json::from_slice(&bytes).map_err(|source| {
            error!(url = %url, error = %source, "Status endpoint returned malformed JSON.");
            FetchError::Decode {
                url: url.to_string(),
                source,
            }
        })?;

        debug!(
            url = %url,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched status endpoint."
        );
        Ok(envelope.data)
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch_incidents(&self) -> Result<Vec<IncidentReport>, FetchError> {
        let records: Vec<serde_json::Value> = self.get_data(&self.incidents_url).await?;
        Ok(decode_incidents(&self.incidents_url, records))
    }

    async fn fetch_uptime(&self) -> Result<f64, FetchError> {
        self.get_data(&self.uptime_url).await
    }

    async fn fetch_latest(&self) -> Result<LatestStatus, FetchError> {
        self.get_data(&self.latest_url).await
    }
}

/// Decodes each report on its own; a malformed one is logged and left out.
fn decode_incidents(url: &Url, records: Vec<serde_json::Value>) -> Vec<IncidentReport> {
    let total = records.len();
    let incidents: Vec<IncidentReport> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(url = %url, index = index, error = %e, "Skipping malformed incident report.");
                None
            }
        })
        .collect();

    if incidents.len() < total {
        warn!(
            url = %url,
            skipped = total - incidents.len(),
            kept = incidents.len(),
            "Some incident reports could not be decoded."
        );
    }
    incidents
}

fn endpoint(base_url: &str, path: &str) -> Result<Url, FetchError> {
    let joined = format!("{}{}", base_url.trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|_| FetchError::InvalidUrl(joined))
}
