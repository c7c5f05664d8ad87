use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::config::{OptimizationConfig, PredictionConfig};

/// Workflow stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Upload,
    Predict,
    Optimize,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Upload => "upload",
            Stage::Predict => "predict",
            Stage::Optimize => "optimize",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Idle,
    Uploading,
    UploadFailed,
    Uploaded,
    Predicting,
    PredictFailed,
    Predicted,
    Optimizing,
    OptimizeFailed,
    Optimized,
}

impl WorkflowState {
    /// The stage whose network call is currently running, if any.
    pub fn in_flight(self) -> Option<Stage> {
        match self {
            WorkflowState::Uploading => Some(Stage::Upload),
            WorkflowState::Predicting => Some(Stage::Predict),
            WorkflowState::Optimizing => Some(Stage::Optimize),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Uploading => "uploading",
            WorkflowState::UploadFailed => "upload_failed",
            WorkflowState::Uploaded => "uploaded",
            WorkflowState::Predicting => "predicting",
            WorkflowState::PredictFailed => "predict_failed",
            WorkflowState::Predicted => "predicted",
            WorkflowState::Optimizing => "optimizing",
            WorkflowState::OptimizeFailed => "optimize_failed",
            WorkflowState::Optimized => "optimized",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forecasting models offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    RandomForest,
    Xgboost,
    GradientBoosting,
    LinearRegression,
    Ensemble,
}

impl ModelId {
    /// Identifier the service expects in request payloads.
    pub fn wire_name(self) -> &'static str {
        match self {
            ModelId::RandomForest => "random_forest",
            ModelId::Xgboost => "xgboost",
            ModelId::GradientBoosting => "gradient_boosting",
            ModelId::LinearRegression => "linear_regression",
            ModelId::Ensemble => "ensemble",
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl std::str::FromStr for ModelId {
    type Err = String;

    /// Accepts the wire names plus the short aliases older dashboards used.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random_forest" | "rf" => Ok(ModelId::RandomForest),
            "xgboost" | "xgb" => Ok(ModelId::Xgboost),
            "gradient_boosting" | "gb" => Ok(ModelId::GradientBoosting),
            "linear_regression" | "lr" => Ok(ModelId::LinearRegression),
            "ensemble" => Ok(ModelId::Ensemble),
            other => Err(format!(
                "unknown model '{}' (expected random_forest, xgboost, gradient_boosting, linear_regression or ensemble)",
                other
            )),
        }
    }
}

/// What the service reported about an accepted dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub row_count: u64,
    pub column_count: u64,
    pub size_kb: f64,
    pub is_valid: bool,
    #[serde(default)]
    pub time_columns: Vec<String>,
    #[serde(default)]
    pub price_columns: Vec<String>,
}

impl DatasetSummary {
    /// Column kinds the service could not detect. Non-empty means predictions
    /// may be unreliable even when the dataset passed validation.
    pub fn undetected_columns(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.time_columns.is_empty() {
            missing.push("time");
        }
        if self.price_columns.is_empty() {
            missing.push("price");
        }
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub predicted_price: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
    #[serde(default)]
    pub models_used: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetrics {
    pub mae: f64,
    pub r2: f64,
}

/// Accuracy block attached to validation and historical responses. The service
/// omits rmse/mape on endpoints that never computed them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub mae: f64,
    pub r2: f64,
    #[serde(default)]
    pub rmse: Option<f64>,
    #[serde(default)]
    pub mape: Option<f64>,
}

/// How the service combined individual models into the returned forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleInfo {
    #[serde(default)]
    pub selected_models: Vec<String>,
    #[serde(default)]
    pub model_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub weight_method: Option<String>,
}

/// Back-test report the service produces when the dataset covers the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub message: Option<String>,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub mape: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub points: Vec<PredictionPoint>,
    pub metrics: PredictionMetrics,
    #[serde(default)]
    pub ensemble: Option<EnsembleInfo>,
    #[serde(default)]
    pub validation: Option<ValidationReport>,
}

impl PredictionResult {
    pub fn horizon(&self) -> usize {
        self.points.len()
    }
}

/// Cost structure echoed back by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParams {
    pub generation: f64,
    pub upward: f64,
    pub downward: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    pub converged_points: u64,
    pub total_points: u64,
}

impl Convergence {
    /// Fraction of horizon points where the optimizer converged, in 0..=1.
    pub fn rate(&self) -> f64 {
        if self.total_points == 0 {
            0.0
        } else {
            self.converged_points as f64 / self.total_points as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub optimal_price: f64,
    pub optimal_power: f64,
    pub expected_revenue: f64,
    pub convergence: Convergence,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub cost_params: Option<CostParams>,
    #[serde(default)]
    pub algorithm: Option<AlgorithmInfo>,
}

/// Span of timestamps covered by the service's active dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataTimeRange {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleDescriptor {
    #[serde(default)]
    pub selection_method: Option<String>,
    #[serde(default)]
    pub top_k: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerDescriptor {
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

/// Algorithm catalog advertised by newer service builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmCatalog {
    #[serde(default)]
    pub ensemble: Option<EnsembleDescriptor>,
    #[serde(default)]
    pub optimizer: Option<OptimizerDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub record_count: u64,
    #[serde(default)]
    pub data_frequency: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub time_range: Option<DataTimeRange>,
    #[serde(default)]
    pub monthly_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub can_validate_accuracy: bool,
    #[serde(default)]
    pub algorithms: Option<AlgorithmCatalog>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub realtime_price: f64,
    #[serde(default)]
    pub dayahead_price: Option<f64>,
    #[serde(default)]
    pub system_load: Option<f64>,
    #[serde(default)]
    pub renewable_output: Option<f64>,
}

/// Aggregates computed server-side over the returned window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStatistics {
    pub count: u64,
    pub avg_price: f64,
    pub volatility: f64,
}

/// Model output aligned index-by-index with the historical window, used for
/// plotting predicted-vs-actual overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedPrediction {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub time: Option<OffsetDateTime>,
    pub predicted_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub points: Vec<HistoricalPoint>,
    #[serde(default)]
    pub statistics: Option<SeriesStatistics>,
    #[serde(default)]
    pub accuracy: Option<AccuracyMetrics>,
    #[serde(default)]
    pub predictions: Option<Vec<AlignedPrediction>>,
}

/// Read-only view of the controller's state and caches at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub state: WorkflowState,
    #[serde(default)]
    pub dataset: Option<DatasetSummary>,
    #[serde(default)]
    pub prediction: Option<PredictionResult>,
    #[serde(default)]
    pub optimization: Option<OptimizationResult>,
}

/// One completed run as persisted by auto-save and JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(default)]
    pub timestamp_utc: String,
    pub base_url: String,
    pub run_id: String,
    #[serde(default)]
    pub comments: Option<String>,
    pub prediction_config: PredictionConfig,
    pub optimization_config: OptimizationConfig,
    pub snapshot: WorkflowSnapshot,
}
