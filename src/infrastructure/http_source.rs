// HTTP client for the measurement service
use crate::application::cancellation::CancellationToken;
use crate::application::error::FetchError;
use crate::application::measurement_source::MeasurementSource;
use crate::domain::measurement::{LatestSnapshot, Measurement};
use crate::domain::range::TimeRange;
use crate::infrastructure::payload::{
    LATEST_ENDPOINT, SERIES_ENDPOINT, detect_latest_shape, parse_latest, parse_series,
};
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct HttpMeasurementSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMeasurementSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn latest_url(&self) -> String {
        format!("{}{}", self.base_url, LATEST_ENDPOINT)
    }

    /// The token is passed through as-is; an empty token asks the service
    /// for its default window.
    pub fn series_url(&self, range: TimeRange) -> String {
        format!(
            "{}{}?range={}",
            self.base_url,
            SERIES_ENDPOINT,
            urlencoding::encode(range.token())
        )
    }

    async fn get_json(&self, url: &str, cancel: &CancellationToken) -> Result<Value, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(FetchError::transport)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::transport)?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Shape {
            endpoint: endpoint_of(url),
            detail: format!("response is not JSON: {}", e),
        })
    }
}

fn endpoint_of(url: &str) -> &'static str {
    if url.contains(LATEST_ENDPOINT) {
        LATEST_ENDPOINT
    } else {
        SERIES_ENDPOINT
    }
}

#[async_trait]
impl MeasurementSource for HttpMeasurementSource {
    async fn fetch_latest(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<LatestSnapshot>, FetchError> {
        let value = self.get_json(&self.latest_url(), cancel).await?;
        tracing::debug!(shape = ?detect_latest_shape(&value), "latest response received");
        parse_latest(value)
    }

    async fn fetch_series(
        &self,
        range: TimeRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<Measurement>, FetchError> {
        let url = self.series_url(range);
        tracing::debug!(%url, "fetching series");
        let value = self.get_json(&url, cancel).await?;
        parse_series(value)
    }
}
