//! Client-side workflow configuration: what to upload, how to ask for
//! predictions, and the cost structure handed to the bid optimizer. Values are
//! validated here, once, so the API layer can serialize them untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use time::Date;

use crate::error::ConfigValidationError;
use crate::model::ModelId;

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

/// Horizon bounds accepted by the service.
pub const MIN_HORIZON_POINTS: u32 = 1;
pub const MAX_HORIZON_POINTS: u32 = 168;

pub const MIN_CONFIDENCE: f64 = 0.80;
pub const MAX_CONFIDENCE: f64 = 0.99;

const DATASET_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadOptions {
    /// Dataset file to send. `None` means the workflow cannot start an upload.
    #[serde(default)]
    pub source: Option<PathBuf>,
}

impl UploadOptions {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let Some(path) = &self.source {
            validate_dataset_path(path)?;
        }
        Ok(())
    }
}

fn validate_dataset_path(path: &Path) -> Result<(), ConfigValidationError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext {
        Some(ext) if DATASET_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(ConfigValidationError::new(
            "upload.source",
            format!("unsupported extension '.{}' (expected .xlsx, .xls or .csv)", ext),
        )),
        None => Err(ConfigValidationError::new(
            "upload.source",
            format!("'{}' has no file extension", path.display()),
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Day the forecast should start from. `None` lets the service pick the
    /// day after its dataset ends.
    #[serde(default, with = "date_format::option")]
    pub prediction_date: Option<Date>,
    pub horizon_points: u32,
    pub confidence_level: f64,
    pub models: Vec<ModelId>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            prediction_date: None,
            horizon_points: 96,
            confidence_level: 0.95,
            models: vec![
                ModelId::RandomForest,
                ModelId::Xgboost,
                ModelId::GradientBoosting,
                ModelId::LinearRegression,
            ],
        }
    }
}

impl PredictionConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(MIN_HORIZON_POINTS..=MAX_HORIZON_POINTS).contains(&self.horizon_points) {
            return Err(ConfigValidationError::new(
                "prediction.horizon_points",
                format!(
                    "{} is outside {}..={}",
                    self.horizon_points, MIN_HORIZON_POINTS, MAX_HORIZON_POINTS
                ),
            ));
        }
        if !self.confidence_level.is_finite()
            || !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&self.confidence_level)
        {
            return Err(ConfigValidationError::new(
                "prediction.confidence_level",
                format!(
                    "{} is outside {}..={}",
                    self.confidence_level, MIN_CONFIDENCE, MAX_CONFIDENCE
                ),
            ));
        }
        if self.models.is_empty() {
            return Err(ConfigValidationError::new(
                "prediction.models",
                "at least one model is required",
            ));
        }
        Ok(())
    }

    /// Drop duplicate models, keeping first occurrences in order.
    fn dedup_models(&mut self) {
        let mut seen = BTreeSet::new();
        self.models.retain(|m| seen.insert(*m));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    pub cost_generation: f64,
    pub cost_upward: f64,
    pub cost_downward: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            cost_generation: 375.0,
            cost_upward: 530.0,
            cost_downward: 310.0,
        }
    }
}

impl OptimizationConfig {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("optimization.cost_generation", self.cost_generation),
            ("optimization.cost_upward", self.cost_upward),
            ("optimization.cost_downward", self.cost_downward),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigValidationError::new(
                    field,
                    format!("{} is not a non-negative finite number", value),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1d")]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    LastMonth,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    /// Query-string token the service expects.
    pub fn as_query_str(self) -> &'static str {
        match self {
            TimeRange::LastDay => "1d",
            TimeRange::LastWeek => "7d",
            TimeRange::LastMonth => "30d",
            TimeRange::All => "all",
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_query_str())
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1d" => Ok(TimeRange::LastDay),
            "7d" => Ok(TimeRange::LastWeek),
            "30d" => Ok(TimeRange::LastMonth),
            "all" => Ok(TimeRange::All),
            other => Err(format!("unknown time range '{}' (expected 1d, 7d, 30d or all)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalQuery {
    pub time_range: TimeRange,
    pub include_predictions: bool,
}

impl Default for HistoricalQuery {
    fn default() -> Self {
        Self {
            time_range: TimeRange::LastDay,
            include_predictions: false,
        }
    }
}

/// Full client configuration, one section per workflow concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub upload: UploadOptions,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub optimization: OptimizationConfig,
    #[serde(default)]
    pub historical: HistoricalQuery,
}

/// Sections to replace. Absent sections keep their current values.
#[derive(Debug, Clone, Default)]
pub struct ConfigPatch {
    pub upload: Option<UploadOptions>,
    pub prediction: Option<PredictionConfig>,
    pub optimization: Option<OptimizationConfig>,
    pub historical: Option<HistoricalQuery>,
}

/// Holds the validated configuration between calls. `apply` commits a patch
/// all-or-nothing: if any provided section fails validation the store is left
/// exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    current: AppConfig,
}

impl ConfigStore {
    pub fn new(initial: AppConfig) -> Result<Self, ConfigValidationError> {
        initial.upload.validate()?;
        initial.prediction.validate()?;
        initial.optimization.validate()?;
        let mut store = Self { current: initial };
        store.current.prediction.dedup_models();
        Ok(store)
    }

    /// Cloned snapshot of the active configuration.
    pub fn get(&self) -> AppConfig {
        self.current.clone()
    }

    pub fn apply(&mut self, patch: ConfigPatch) -> Result<(), ConfigValidationError> {
        let mut candidate = self.current.clone();
        if let Some(upload) = patch.upload {
            upload.validate()?;
            candidate.upload = upload;
        }
        if let Some(mut prediction) = patch.prediction {
            prediction.validate()?;
            prediction.dedup_models();
            candidate.prediction = prediction;
        }
        if let Some(optimization) = patch.optimization {
            optimization.validate()?;
            candidate.optimization = optimization;
        }
        if let Some(historical) = patch.historical {
            candidate.historical = historical;
        }
        self.current = candidate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.prediction.validate().is_ok());
        assert!(config.optimization.validate().is_ok());
        assert_eq!(config.prediction.horizon_points, 96);
        assert_eq!(config.optimization.cost_generation, 375.0);
        assert_eq!(config.historical.time_range, TimeRange::LastDay);
    }

    #[test]
    fn apply_commits_valid_patch() {
        let mut store = ConfigStore::default();
        let patch = ConfigPatch {
            prediction: Some(PredictionConfig {
                horizon_points: 24,
                confidence_level: 0.90,
                models: vec![ModelId::Xgboost],
                ..PredictionConfig::default()
            }),
            ..ConfigPatch::default()
        };
        store.apply(patch).unwrap();
        let got = store.get();
        assert_eq!(got.prediction.horizon_points, 24);
        assert_eq!(got.prediction.models, vec![ModelId::Xgboost]);
        // Untouched section keeps its defaults.
        assert_eq!(got.optimization.cost_upward, 530.0);
    }

    #[test]
    fn apply_rejects_bad_horizon_and_keeps_store() {
        let mut store = ConfigStore::default();
        for horizon in [0, 169] {
            let err = store
                .apply(ConfigPatch {
                    prediction: Some(PredictionConfig {
                        horizon_points: horizon,
                        ..PredictionConfig::default()
                    }),
                    ..ConfigPatch::default()
                })
                .unwrap_err();
            assert_eq!(err.field, "prediction.horizon_points");
        }
        assert_eq!(store.get().prediction.horizon_points, 96);
    }

    #[test]
    fn apply_is_all_or_nothing_across_sections() {
        let mut store = ConfigStore::default();
        let err = store
            .apply(ConfigPatch {
                optimization: Some(OptimizationConfig {
                    cost_generation: 410.0,
                    ..OptimizationConfig::default()
                }),
                prediction: Some(PredictionConfig {
                    confidence_level: 1.5,
                    ..PredictionConfig::default()
                }),
                ..ConfigPatch::default()
            })
            .unwrap_err();
        assert_eq!(err.field, "prediction.confidence_level");
        // The valid optimization section must not have leaked in.
        assert_eq!(store.get().optimization.cost_generation, 375.0);
    }

    #[test]
    fn confidence_bounds_are_inclusive() {
        for (level, ok) in [(0.79, false), (0.80, true), (0.99, true), (0.995, false), (f64::NAN, false)] {
            let config = PredictionConfig {
                confidence_level: level,
                ..PredictionConfig::default()
            };
            assert_eq!(config.validate().is_ok(), ok, "confidence {}", level);
        }
    }

    #[test]
    fn empty_model_list_is_rejected() {
        let config = PredictionConfig {
            models: vec![],
            ..PredictionConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().field, "prediction.models");
    }

    #[test]
    fn duplicate_models_collapse_in_order() {
        let mut store = ConfigStore::default();
        store
            .apply(ConfigPatch {
                prediction: Some(PredictionConfig {
                    models: vec![
                        ModelId::Xgboost,
                        ModelId::RandomForest,
                        ModelId::Xgboost,
                        ModelId::RandomForest,
                    ],
                    ..PredictionConfig::default()
                }),
                ..ConfigPatch::default()
            })
            .unwrap();
        assert_eq!(
            store.get().prediction.models,
            vec![ModelId::Xgboost, ModelId::RandomForest]
        );
    }

    #[test]
    fn upload_extension_is_case_insensitive() {
        let options = UploadOptions {
            source: Some(PathBuf::from("/data/May.XLSX")),
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn upload_rejects_unknown_and_missing_extensions() {
        for name in ["notes.txt", "dataset"] {
            let options = UploadOptions {
                source: Some(PathBuf::from(name)),
            };
            let err = options.validate().unwrap_err();
            assert_eq!(err.field, "upload.source");
        }
    }

    #[test]
    fn negative_cost_is_rejected() {
        let config = OptimizationConfig {
            cost_downward: -1.0,
            ..OptimizationConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err().field,
            "optimization.cost_downward"
        );
    }

    #[test]
    fn time_range_tokens_round_trip() {
        for range in [
            TimeRange::LastDay,
            TimeRange::LastWeek,
            TimeRange::LastMonth,
            TimeRange::All,
        ] {
            let parsed: TimeRange = range.as_query_str().parse().unwrap();
            assert_eq!(parsed, range);
        }
        assert!("2w".parse::<TimeRange>().is_err());
    }
}
