use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::api::{wire, MarketApi};
use crate::config::{HistoricalQuery, OptimizationConfig, PredictionConfig};
use crate::error::ApiError;
use crate::model::{
    DatasetSummary, HistoricalSeries, OptimizationResult, PredictionPoint, PredictionResult,
    ServiceStatus,
};

pub const DEFAULT_BASE_URL: &str = "https://power-market-api.vercel.app";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Uploads carry whole spreadsheets and get a longer timeout.
    pub upload_timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            user_agent: format!("power-market-cli/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// `MarketApi` over HTTP/JSON via reqwest. One instance per process; the
/// underlying client pools connections.
pub struct HttpMarketApi {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    upload_timeout: Duration,
}

impl HttpMarketApi {
    pub fn new(options: &ClientOptions) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            request_timeout: options.request_timeout,
            upload_timeout: options.upload_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from)?;
        read_json(response).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .query(query)
            .send()
            .await
            .map_err(ApiError::from)?;
        read_json(response).await
    }
}

/// Status gate first, then a text read and an explicit parse so decode
/// failures classify as `Malformed` rather than folding into reqwest errors.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::HttpStatus(status.as_u16()));
    }
    let body = response.text().await.map_err(ApiError::from)?;
    serde_json::from_str(&body).map_err(|e| ApiError::Malformed(format!("decoding response: {}", e)))
}

fn mime_for_dataset(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl MarketApi for HttpMarketApi {
    async fn upload_dataset(&self, file: &Path) -> Result<DatasetSummary, ApiError> {
        // A file we cannot read means the request never left the machine.
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| ApiError::Network(format!("reading '{}': {}", file.display(), e)))?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dataset")
            .to_string();
        debug!("POST {} ({} bytes from '{}')", self.url("/api/upload"), bytes.len(), file_name);
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for_dataset(file))
            .map_err(ApiError::from)?;
        let form = multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.url("/api/upload"))
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::from)?;
        let parsed: wire::UploadResponse = read_json(response).await?;
        Ok(parsed.into_summary())
    }

    async fn predict(&self, config: &PredictionConfig) -> Result<PredictionResult, ApiError> {
        let request = wire::PredictRequest::from_config(config);
        let parsed: wire::PredictResponse = self.post_json("/api/predict", &request).await?;
        parsed.into_result()
    }

    async fn optimize(
        &self,
        points: &[PredictionPoint],
        config: &OptimizationConfig,
    ) -> Result<OptimizationResult, ApiError> {
        let request = wire::OptimizeRequest::new(points, config)?;
        let parsed: wire::OptimizeResponse = self.post_json("/api/optimize", &request).await?;
        Ok(parsed.into_result())
    }

    async fn status(&self) -> Result<ServiceStatus, ApiError> {
        let parsed: wire::StatusResponse = self.get_json("/api/database/status", &[]).await?;
        parsed.into_status()
    }

    async fn historical_prices(&self, query: &HistoricalQuery) -> Result<HistoricalSeries, ApiError> {
        let include = if query.include_predictions { "true" } else { "false" };
        let parsed: wire::HistoricalResponse = self
            .get_json(
                "/api/historical-prices",
                &[
                    ("timeRange", query.time_range.as_query_str()),
                    ("includePredictions", include),
                ],
            )
            .await?;
        parsed.into_series()
    }
}
