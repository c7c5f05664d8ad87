//! Wire-format DTOs for the analytics service. Field naming is faithful to
//! the service: predict/optimize speak snake_case, the upload validation block
//! and the status payload are camelCase, and historical statistics use
//! `avgPrice`. Conversions into the domain model validate shape and ordering;
//! anything off-contract becomes `ApiError::Malformed`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::config::{OptimizationConfig, PredictionConfig};
use crate::error::ApiError;
use crate::model::{
    AccuracyMetrics, AlgorithmCatalog, AlgorithmInfo, AlignedPrediction, Convergence, CostParams,
    DataTimeRange, DatasetSummary, EnsembleDescriptor, EnsembleInfo, HistoricalPoint,
    HistoricalSeries, OptimizationResult, OptimizerDescriptor, PredictionMetrics, PredictionPoint,
    PredictionResult, SeriesStatistics, ServiceStatus, ValidationReport,
};

/// Parse a service timestamp. The service emits RFC 3339 on newer endpoints
/// and `YYYY-MM-DD HH:MM[:SS]` (implicitly UTC) on older ones.
pub(crate) fn parse_service_time(raw: &str) -> Result<OffsetDateTime, ApiError> {
    if let Ok(t) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(t);
    }
    let with_seconds = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let to_minute = format_description!("[year]-[month]-[day] [hour]:[minute]");
    for fmt in [with_seconds, to_minute] {
        if let Ok(t) = PrimitiveDateTime::parse(raw, fmt) {
            return Ok(t.assume_utc());
        }
    }
    Err(ApiError::Malformed(format!("unparseable timestamp '{}'", raw)))
}

fn format_rfc3339(time: OffsetDateTime) -> Result<String, ApiError> {
    time.format(&Rfc3339)
        .map_err(|e| ApiError::Malformed(format!("unrepresentable timestamp: {}", e)))
}

// ---------------------------------------------------------------------------
// POST /api/upload

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub data: UploadData,
    pub validation: UploadValidation,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadData {
    pub rows: u64,
    pub columns: u64,
    pub size: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadValidation {
    pub valid: bool,
    #[serde(default)]
    pub time_columns: Option<Vec<String>>,
    #[serde(default)]
    pub price_columns: Option<Vec<String>>,
}

impl UploadResponse {
    pub fn into_summary(self) -> DatasetSummary {
        DatasetSummary {
            row_count: self.data.rows,
            column_count: self.data.columns,
            size_kb: self.data.size,
            is_valid: self.validation.valid,
            time_columns: self.validation.time_columns.unwrap_or_default(),
            price_columns: self.validation.price_columns.unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// POST /api/predict

#[derive(Debug, Serialize)]
pub(crate) struct PredictRequest {
    /// Always `null`: the service predicts from its stored dataset.
    pub data: Option<serde_json::Value>,
    pub config: PredictRequestConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictRequestConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_date: Option<String>,
    pub prediction_hours: u32,
    pub models: Vec<&'static str>,
    pub confidence_level: f64,
}

impl PredictRequest {
    pub fn from_config(config: &PredictionConfig) -> Self {
        Self {
            data: None,
            config: PredictRequestConfig {
                prediction_date: config.prediction_date.map(|d| {
                    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
                }),
                prediction_hours: config.horizon_points,
                models: config.models.iter().map(|m| m.wire_name()).collect(),
                confidence_level: config.confidence_level,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictResponse {
    pub predictions: Vec<PredictionPointWire>,
    pub metrics: MetricsWire,
    #[serde(default)]
    pub ensemble_info: Option<EnsembleInfoWire>,
    #[serde(default)]
    pub validation: Option<ValidationWire>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PredictionPointWire {
    pub time: String,
    pub predicted_price: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
    pub models_used: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetricsWire {
    pub mae: f64,
    pub r2: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnsembleInfoWire {
    #[serde(default)]
    pub selected_models: Vec<String>,
    #[serde(default)]
    pub model_weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub weight_calculation: Option<WeightCalculationWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WeightCalculationWire {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidationWire {
    #[serde(default)]
    pub validation_message: Option<String>,
    pub accuracy_metrics: AccuracyFullWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccuracyFullWire {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub mape: f64,
}

impl PredictResponse {
    /// Convert into the domain result. Points must already be in
    /// non-decreasing chronological order; export and display rely on it, so
    /// a violation is a malformed response rather than something to re-sort.
    pub fn into_result(self) -> Result<PredictionResult, ApiError> {
        let mut points: Vec<PredictionPoint> = Vec::with_capacity(self.predictions.len());
        for wire in self.predictions {
            let time = parse_service_time(&wire.time)?;
            if let Some(prev) = points.last() {
                if time < prev.time {
                    return Err(ApiError::Malformed(format!(
                        "prediction points out of chronological order at '{}'",
                        wire.time
                    )));
                }
            }
            points.push(PredictionPoint {
                time,
                predicted_price: wire.predicted_price,
                confidence_lower: wire.confidence_lower,
                confidence_upper: wire.confidence_upper,
                models_used: wire.models_used,
            });
        }
        Ok(PredictionResult {
            points,
            metrics: PredictionMetrics {
                mae: self.metrics.mae,
                r2: self.metrics.r2,
            },
            ensemble: self.ensemble_info.map(|e| EnsembleInfo {
                selected_models: e.selected_models,
                model_weights: e.model_weights,
                weight_method: e.weight_calculation.and_then(|w| w.description),
            }),
            validation: self.validation.map(|v| ValidationReport {
                message: v.validation_message,
                mae: v.accuracy_metrics.mae,
                rmse: v.accuracy_metrics.rmse,
                r2: v.accuracy_metrics.r2,
                mape: v.accuracy_metrics.mape,
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// POST /api/optimize

#[derive(Debug, Serialize)]
pub(crate) struct OptimizeRequest {
    pub predictions: Vec<PredictionPointWire>,
    pub config: OptimizeRequestConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct OptimizeRequestConfig {
    pub cost_params: CostParamsBody,
}

#[derive(Debug, Serialize)]
pub(crate) struct CostParamsBody {
    pub cost_g: f64,
    pub cost_up: f64,
    pub cost_dn: f64,
}

impl OptimizeRequest {
    pub fn new(
        points: &[PredictionPoint],
        config: &OptimizationConfig,
    ) -> Result<Self, ApiError> {
        let mut predictions = Vec::with_capacity(points.len());
        for point in points {
            predictions.push(PredictionPointWire {
                time: format_rfc3339(point.time)?,
                predicted_price: point.predicted_price,
                confidence_lower: point.confidence_lower,
                confidence_upper: point.confidence_upper,
                models_used: point.models_used.clone(),
            });
        }
        Ok(Self {
            predictions,
            config: OptimizeRequestConfig {
                cost_params: CostParamsBody {
                    cost_g: config.cost_generation,
                    cost_up: config.cost_upward,
                    cost_dn: config.cost_downward,
                },
            },
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptimizeResponse {
    pub optimization: OptimizationWire,
    #[serde(default)]
    pub algorithm_info: Option<AlgorithmInfoWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptimizationWire {
    pub optimal_price: f64,
    pub optimal_power: f64,
    pub expected_revenue: f64,
    pub convergence_stats: ConvergenceWire,
    #[serde(default)]
    pub optimization_method: Option<String>,
    #[serde(default)]
    pub cost_params: Option<CostParamsEcho>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConvergenceWire {
    pub converged_points: u64,
    pub total_points: u64,
}

/// Echoed with the optimizer's internal names.
#[derive(Debug, Deserialize)]
pub(crate) struct CostParamsEcho {
    pub c_g: f64,
    pub c_up: f64,
    pub c_dn: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlgorithmInfoWire {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl AlgorithmInfoWire {
    fn into_info(self) -> AlgorithmInfo {
        AlgorithmInfo {
            name: self.name,
            source: self.source,
            features: self.features,
        }
    }
}

impl OptimizeResponse {
    pub fn into_result(self) -> OptimizationResult {
        OptimizationResult {
            optimal_price: self.optimization.optimal_price,
            optimal_power: self.optimization.optimal_power,
            expected_revenue: self.optimization.expected_revenue,
            convergence: Convergence {
                converged_points: self.optimization.convergence_stats.converged_points,
                total_points: self.optimization.convergence_stats.total_points,
            },
            method: self.optimization.optimization_method,
            cost_params: self.optimization.cost_params.map(|c| CostParams {
                generation: c.c_g,
                upward: c.c_up,
                downward: c.c_dn,
            }),
            algorithm: self.algorithm_info.map(AlgorithmInfoWire::into_info),
        }
    }
}

// ---------------------------------------------------------------------------
// GET /api/database/status

#[derive(Debug, Deserialize)]
pub(crate) struct StatusResponse {
    #[serde(default)]
    pub database: Option<DatabaseWire>,
    #[serde(default)]
    pub validation: Option<StatusValidationWire>,
    #[serde(default)]
    pub algorithms: Option<AlgorithmsWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DatabaseWire {
    pub real_data_records: u64,
    #[serde(default)]
    pub data_frequency: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub monthly_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub time_range: Option<TimeRangeWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimeRangeWire {
    pub start: String,
    pub end: String,
}

// This block is snake_case, unlike its camelCase siblings.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusValidationWire {
    #[serde(default)]
    pub can_validate_accuracy: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlgorithmsWire {
    #[serde(default)]
    pub ensemble_model: Option<EnsembleDescriptorWire>,
    #[serde(default)]
    pub neurodynamic_optimizer: Option<OptimizerDescriptorWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnsembleDescriptorWire {
    #[serde(default)]
    pub selection_method: Option<String>,
    #[serde(default)]
    pub top_k: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptimizerDescriptorWire {
    #[serde(default)]
    pub max_iterations: Option<u32>,
}

impl StatusResponse {
    pub fn into_status(self) -> Result<ServiceStatus, ApiError> {
        let database = self
            .database
            .ok_or_else(|| ApiError::Malformed("status response missing 'database' section".into()))?;
        let time_range = match database.time_range {
            Some(range) => Some(DataTimeRange {
                start: parse_service_time(&range.start)?,
                end: parse_service_time(&range.end)?,
            }),
            None => None,
        };
        Ok(ServiceStatus {
            record_count: database.real_data_records,
            data_frequency: database.data_frequency,
            data_source: database.data_source,
            time_range,
            monthly_distribution: database.monthly_distribution,
            can_validate_accuracy: self
                .validation
                .map(|v| v.can_validate_accuracy)
                .unwrap_or(false),
            algorithms: self.algorithms.map(|a| AlgorithmCatalog {
                ensemble: a.ensemble_model.map(|e| EnsembleDescriptor {
                    selection_method: e.selection_method,
                    top_k: e.top_k,
                }),
                optimizer: a.neurodynamic_optimizer.map(|o| OptimizerDescriptor {
                    max_iterations: o.max_iterations,
                }),
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// GET /api/historical-prices

#[derive(Debug, Deserialize)]
pub(crate) struct HistoricalResponse {
    pub data: Vec<HistoricalPointWire>,
    #[serde(default)]
    pub statistics: Option<StatisticsWire>,
    #[serde(default)]
    pub accuracy_metrics: Option<AccuracyLiteWire>,
    #[serde(default)]
    pub predictions: Option<Vec<AlignedPredictionWire>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoricalPointWire {
    pub time: String,
    pub realtime_price: f64,
    #[serde(default)]
    pub dayahead_price: Option<f64>,
    #[serde(default)]
    pub system_load: Option<f64>,
    #[serde(default)]
    pub renewable_output: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatisticsWire {
    pub count: u64,
    pub avg_price: f64,
    pub volatility: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccuracyLiteWire {
    pub mae: f64,
    pub r2: f64,
    #[serde(default)]
    pub rmse: Option<f64>,
    #[serde(default)]
    pub mape: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AlignedPredictionWire {
    #[serde(default)]
    pub time: Option<String>,
    pub predicted_price: f64,
}

impl HistoricalResponse {
    pub fn into_series(self) -> Result<HistoricalSeries, ApiError> {
        let mut points = Vec::with_capacity(self.data.len());
        for wire in self.data {
            points.push(HistoricalPoint {
                time: parse_service_time(&wire.time)?,
                realtime_price: wire.realtime_price,
                dayahead_price: wire.dayahead_price,
                system_load: wire.system_load,
                renewable_output: wire.renewable_output,
            });
        }
        let predictions = match self.predictions {
            Some(aligned) => {
                let mut out = Vec::with_capacity(aligned.len());
                for wire in aligned {
                    let time = match wire.time {
                        Some(raw) => Some(parse_service_time(&raw)?),
                        None => None,
                    };
                    out.push(AlignedPrediction {
                        time,
                        predicted_price: wire.predicted_price,
                    });
                }
                Some(out)
            }
            None => None,
        };
        Ok(HistoricalSeries {
            points,
            statistics: self.statistics.map(|s| SeriesStatistics {
                count: s.count,
                avg_price: s.avg_price,
                volatility: s.volatility,
            }),
            accuracy: self.accuracy_metrics.map(|a| AccuracyMetrics {
                mae: a.mae,
                r2: a.r2,
                rmse: a.rmse,
                mape: a.mape,
            }),
            predictions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelId;
    use time::macros::datetime;

    #[test]
    fn parses_service_and_rfc3339_timestamps() {
        for raw in [
            "2024-05-02T00:15:00Z",
            "2024-05-02T00:15:00+00:00",
            "2024-05-02 00:15:00",
            "2024-05-02 00:15",
        ] {
            let parsed = parse_service_time(raw).unwrap();
            assert_eq!(parsed, datetime!(2024-05-02 00:15 UTC), "input {}", raw);
        }
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let err = parse_service_time("yesterday at noon").unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[test]
    fn upload_response_maps_camel_case_validation() {
        let raw = r#"{
            "data": {"rows": 500, "columns": 4, "size": 182.4},
            "validation": {"valid": true, "timeColumns": ["时间"], "priceColumns": ["实时出清电价"]}
        }"#;
        let summary = serde_json::from_str::<UploadResponse>(raw)
            .unwrap()
            .into_summary();
        assert_eq!(summary.row_count, 500);
        assert_eq!(summary.column_count, 4);
        assert!(summary.is_valid);
        assert_eq!(summary.time_columns, vec!["时间"]);
        assert!(summary.undetected_columns().is_empty());
    }

    #[test]
    fn upload_response_without_column_hints_still_parses() {
        let raw = r#"{"data": {"rows": 10, "columns": 2, "size": 1.2}, "validation": {"valid": false}}"#;
        let summary = serde_json::from_str::<UploadResponse>(raw)
            .unwrap()
            .into_summary();
        assert!(!summary.is_valid);
        assert_eq!(summary.undetected_columns(), vec!["time", "price"]);
    }

    #[test]
    fn predict_request_serializes_null_data_and_wire_models() {
        let config = PredictionConfig {
            prediction_date: Some(time::macros::date!(2024 - 05 - 02)),
            horizon_points: 96,
            confidence_level: 0.95,
            models: vec![ModelId::RandomForest, ModelId::Xgboost],
        };
        let body = serde_json::to_value(PredictRequest::from_config(&config)).unwrap();
        assert!(body["data"].is_null());
        assert_eq!(body["config"]["prediction_date"], "2024-05-02");
        assert_eq!(body["config"]["prediction_hours"], 96);
        assert_eq!(body["config"]["confidence_level"], 0.95);
        assert_eq!(
            body["config"]["models"],
            serde_json::json!(["random_forest", "xgboost"])
        );
    }

    #[test]
    fn predict_request_omits_absent_date() {
        let body =
            serde_json::to_value(PredictRequest::from_config(&PredictionConfig::default())).unwrap();
        assert!(body["config"].get("prediction_date").is_none());
    }

    #[test]
    fn predict_response_full_shape_converts() {
        let raw = r#"{
            "predictions": [
                {"time": "2024-05-02 00:15", "predicted_price": 412.5, "confidence_lower": 390.1, "confidence_upper": 434.9, "models_used": ["random_forest", "xgboost"]},
                {"time": "2024-05-02 00:30", "predicted_price": 409.8, "confidence_lower": 388.0, "confidence_upper": 431.6, "models_used": ["random_forest", "xgboost"]}
            ],
            "metrics": {"mae": 12.3, "r2": 0.87},
            "data_info": {"avg_predicted_price": 411.15},
            "ensemble_info": {
                "selected_models": ["random_forest", "xgboost"],
                "model_weights": {"random_forest": 0.6, "xgboost": 0.4},
                "weight_calculation": {"description": "inverse-MAE adaptive weights"}
            },
            "validation": {
                "validation_message": "validated against 2024-05-02",
                "accuracy_metrics": {"mae": 11.9, "rmse": 15.2, "r2": 0.88, "mape": 3.1}
            }
        }"#;
        let result = serde_json::from_str::<PredictResponse>(raw)
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(result.points.len(), 2);
        assert_eq!(result.metrics.mae, 12.3);
        assert_eq!(result.metrics.r2, 0.87);
        let ensemble = result.ensemble.unwrap();
        assert_eq!(ensemble.model_weights["random_forest"], 0.6);
        assert_eq!(
            ensemble.weight_method.as_deref(),
            Some("inverse-MAE adaptive weights")
        );
        let validation = result.validation.unwrap();
        assert_eq!(validation.rmse, 15.2);
        assert_eq!(validation.mape, 3.1);
    }

    #[test]
    fn predict_response_missing_r2_fails_to_parse() {
        let raw = r#"{
            "predictions": [],
            "metrics": {"mae": 12.3}
        }"#;
        assert!(serde_json::from_str::<PredictResponse>(raw).is_err());
    }

    #[test]
    fn out_of_order_points_are_malformed() {
        let raw = r#"{
            "predictions": [
                {"time": "2024-05-02 01:00", "predicted_price": 400.0, "confidence_lower": 390.0, "confidence_upper": 410.0, "models_used": []},
                {"time": "2024-05-02 00:45", "predicted_price": 401.0, "confidence_lower": 391.0, "confidence_upper": 411.0, "models_used": []}
            ],
            "metrics": {"mae": 1.0, "r2": 0.9}
        }"#;
        let err = serde_json::from_str::<PredictResponse>(raw)
            .unwrap()
            .into_result()
            .unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[test]
    fn equal_adjacent_timestamps_are_accepted() {
        let raw = r#"{
            "predictions": [
                {"time": "2024-05-02 00:15", "predicted_price": 400.0, "confidence_lower": 390.0, "confidence_upper": 410.0, "models_used": []},
                {"time": "2024-05-02 00:15", "predicted_price": 401.0, "confidence_lower": 391.0, "confidence_upper": 411.0, "models_used": []}
            ],
            "metrics": {"mae": 1.0, "r2": 0.9}
        }"#;
        assert!(serde_json::from_str::<PredictResponse>(raw)
            .unwrap()
            .into_result()
            .is_ok());
    }

    #[test]
    fn optimize_request_uses_legacy_cost_keys() {
        let points = vec![PredictionPoint {
            time: datetime!(2024-05-02 00:15 UTC),
            predicted_price: 412.5,
            confidence_lower: 390.1,
            confidence_upper: 434.9,
            models_used: vec!["random_forest".into()],
        }];
        let config = OptimizationConfig {
            cost_generation: 400.0,
            cost_upward: 50.0,
            cost_downward: 30.0,
        };
        let body = serde_json::to_value(OptimizeRequest::new(&points, &config).unwrap()).unwrap();
        assert_eq!(body["config"]["cost_params"]["cost_g"], 400.0);
        assert_eq!(body["config"]["cost_params"]["cost_up"], 50.0);
        assert_eq!(body["config"]["cost_params"]["cost_dn"], 30.0);
        assert_eq!(body["predictions"][0]["time"], "2024-05-02T00:15:00Z");
    }

    #[test]
    fn optimize_response_full_shape_converts() {
        let raw = r#"{
            "optimization": {
                "optimal_price": 410.0,
                "optimal_power": 85.0,
                "expected_revenue": 34850.0,
                "convergence_stats": {"converged_points": 24, "total_points": 24, "convergence_rate": 100.0},
                "optimization_method": "neurodynamic",
                "cost_params": {"c_g": 400.0, "c_up": 50.0, "c_dn": 30.0}
            },
            "algorithm_info": {
                "name": "neurodynamic bidding optimizer",
                "source": "original project",
                "features": ["per-point convergence tracking"]
            }
        }"#;
        let result = serde_json::from_str::<OptimizeResponse>(raw)
            .unwrap()
            .into_result();
        assert_eq!(result.optimal_price, 410.0);
        assert_eq!(result.optimal_power, 85.0);
        assert_eq!(result.expected_revenue, 34850.0);
        assert_eq!(result.convergence.converged_points, 24);
        assert_eq!(result.convergence.rate(), 1.0);
        assert_eq!(result.cost_params.unwrap().generation, 400.0);
        assert_eq!(result.method.as_deref(), Some("neurodynamic"));
    }

    #[test]
    fn optimize_response_missing_convergence_fails_to_parse() {
        let raw = r#"{
            "optimization": {"optimal_price": 410.0, "optimal_power": 85.0, "expected_revenue": 34850.0}
        }"#;
        assert!(serde_json::from_str::<OptimizeResponse>(raw).is_err());
    }

    #[test]
    fn status_response_maps_camel_case_database() {
        let raw = r#"{
            "database": {
                "realDataRecords": 11520,
                "dataFrequency": "15min",
                "dataSource": "山西电力现货市场",
                "monthlyDistribution": {"2024-04": 2880, "2024-05": 2976},
                "timeRange": {"start": "2024-04-01 00:00", "end": "2024-05-31 23:45"}
            },
            "validation": {"can_validate_accuracy": true},
            "algorithms": {
                "ensemble_model": {"selection_method": "top_k_by_mae", "top_k": 3},
                "neurodynamic_optimizer": {"max_iterations": 500}
            }
        }"#;
        let status = serde_json::from_str::<StatusResponse>(raw)
            .unwrap()
            .into_status()
            .unwrap();
        assert_eq!(status.record_count, 11520);
        assert_eq!(status.data_frequency.as_deref(), Some("15min"));
        assert_eq!(status.monthly_distribution["2024-05"], 2976);
        assert!(status.can_validate_accuracy);
        let range = status.time_range.unwrap();
        assert_eq!(range.end, datetime!(2024-05-31 23:45 UTC));
        let catalog = status.algorithms.unwrap();
        assert_eq!(catalog.ensemble.unwrap().top_k, Some(3));
        assert_eq!(catalog.optimizer.unwrap().max_iterations, Some(500));
    }

    #[test]
    fn status_response_without_database_is_malformed() {
        let err = serde_json::from_str::<StatusResponse>("{}")
            .unwrap()
            .into_status()
            .unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }

    #[test]
    fn historical_response_maps_avg_price() {
        let raw = r#"{
            "data": [
                {"time": "2024-05-01 00:15", "realtime_price": 450.5, "dayahead_price": 445.0, "system_load": 85000.0, "renewable_output": 12000.0},
                {"time": "2024-05-01 00:30", "realtime_price": 448.2}
            ],
            "statistics": {"count": 2, "avgPrice": 449.35, "volatility": 1.15},
            "accuracy_metrics": {"mae": 10.2, "r2": 0.91},
            "predictions": [
                {"time": "2024-05-01 00:15", "predicted_price": 451.0},
                {"predicted_price": 447.5}
            ]
        }"#;
        let series = serde_json::from_str::<HistoricalResponse>(raw)
            .unwrap()
            .into_series()
            .unwrap();
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[1].dayahead_price, None);
        assert_eq!(series.statistics.unwrap().avg_price, 449.35);
        let accuracy = series.accuracy.unwrap();
        assert_eq!(accuracy.mae, 10.2);
        assert_eq!(accuracy.rmse, None);
        let aligned = series.predictions.unwrap();
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[1].time, None);
        assert_eq!(aligned[1].predicted_price, 447.5);
    }
}
