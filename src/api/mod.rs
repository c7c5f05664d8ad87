//! Analytics-service access: the `MarketApi` seam and its HTTP implementation.

mod http;
mod wire;

pub use http::{ClientOptions, HttpMarketApi, DEFAULT_BASE_URL};

use async_trait::async_trait;
use std::path::Path;

use crate::config::{HistoricalQuery, OptimizationConfig, PredictionConfig};
use crate::error::ApiError;
use crate::model::{
    DatasetSummary, HistoricalSeries, OptimizationResult, PredictionPoint, PredictionResult,
    ServiceStatus,
};

/// One method per remote capability. Implementations never panic across this
/// boundary and never retry: every failure comes back as an `ApiError` value,
/// and retry policy belongs to the caller.
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Upload a dataset file for server-side validation and storage.
    async fn upload_dataset(&self, file: &Path) -> Result<DatasetSummary, ApiError>;

    /// Request a price forecast over the configured horizon.
    async fn predict(&self, config: &PredictionConfig) -> Result<PredictionResult, ApiError>;

    /// Request a bidding strategy for an existing forecast.
    async fn optimize(
        &self,
        points: &[PredictionPoint],
        config: &OptimizationConfig,
    ) -> Result<OptimizationResult, ApiError>;

    /// Aggregate metadata about the service's stored dataset.
    async fn status(&self) -> Result<ServiceStatus, ApiError>;

    /// Historical price series for a time range, optionally with the aligned
    /// prediction series.
    async fn historical_prices(&self, query: &HistoricalQuery) -> Result<HistoricalSeries, ApiError>;
}
