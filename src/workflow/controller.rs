use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::api::MarketApi;
use crate::config::{OptimizationConfig, PredictionConfig};
use crate::error::{Precondition, WorkflowError};
use crate::model::{
    DatasetSummary, OptimizationResult, PredictionResult, Stage, WorkflowSnapshot, WorkflowState,
};
use crate::workflow::cache::ResultCache;

struct Inner {
    state: WorkflowState,
    cache: ResultCache,
}

/// Sole mutator of the workflow state and result cache. Each stage call is
/// accepted under the lock (flipping to the in-flight tag), runs its network
/// call with the lock released, then applies the outcome under the lock
/// again. A caller arriving while any call is in flight sees the in-flight
/// tag and is rejected as busy; nothing is queued and nothing is cancelled.
pub struct WorkflowController {
    api: Arc<dyn MarketApi>,
    inner: Mutex<Inner>,
}

impl WorkflowController {
    pub fn new(api: Arc<dyn MarketApi>) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner {
                state: WorkflowState::Idle,
                cache: ResultCache::default(),
            }),
        }
    }

    pub async fn current_state(&self) -> WorkflowState {
        self.inner.lock().await.state
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        let inner = self.inner.lock().await;
        WorkflowSnapshot {
            state: inner.state,
            dataset: inner.cache.dataset().cloned(),
            prediction: inner.cache.prediction().cloned(),
            optimization: inner.cache.optimization().cloned(),
        }
    }

    /// Upload a dataset. Accepted from any stable state; acceptance drops the
    /// cached forecast and strategy before the request is sent, so a failed
    /// upload still leaves them cleared.
    pub async fn start_upload(&self, file: &Path) -> Result<DatasetSummary, WorkflowError> {
        {
            let mut inner = self.inner.lock().await;
            if let Some(stage) = inner.state.in_flight() {
                return Err(WorkflowError::Busy { stage });
            }
            inner.cache.clear_downstream_of_upload();
            inner.state = WorkflowState::Uploading;
        }

        info!("uploading dataset '{}'", file.display());
        let outcome = self.api.upload_dataset(file).await;

        let mut inner = self.inner.lock().await;
        match outcome {
            Ok(summary) => {
                inner.state = WorkflowState::Uploaded;
                inner.cache.store_dataset(summary.clone());
                if summary.is_valid {
                    info!(
                        "upload complete: {} rows x {} columns ({} KB)",
                        summary.row_count, summary.column_count, summary.size_kb
                    );
                } else {
                    warn!(
                        "upload accepted but validation failed (missing: {}); prediction stays gated",
                        summary.undetected_columns().join(", ")
                    );
                }
                Ok(summary)
            }
            Err(source) => {
                inner.state = WorkflowState::UploadFailed;
                warn!("upload failed: {}", source);
                Err(WorkflowError::Stage {
                    stage: Stage::Upload,
                    source,
                })
            }
        }
    }

    /// Request a forecast. Requires an uploaded, valid dataset; a previous
    /// prediction failure may be retried.
    pub async fn run_prediction(
        &self,
        config: &PredictionConfig,
    ) -> Result<PredictionResult, WorkflowError> {
        {
            let mut inner = self.inner.lock().await;
            if let Some(stage) = inner.state.in_flight() {
                return Err(WorkflowError::Busy { stage });
            }
            let dataset_ready = matches!(
                inner.state,
                WorkflowState::Uploaded | WorkflowState::PredictFailed
            ) && inner.cache.dataset().map(|d| d.is_valid).unwrap_or(false);
            if !dataset_ready {
                return Err(WorkflowError::Precondition(Precondition::DatasetNotReady));
            }
            inner.state = WorkflowState::Predicting;
        }

        info!("requesting a {}-point forecast", config.horizon_points);
        let outcome = self.api.predict(config).await;

        let mut inner = self.inner.lock().await;
        match outcome {
            Ok(result) => {
                inner.state = WorkflowState::Predicted;
                if result.points.is_empty() {
                    // Degenerate but still a completed prediction; the
                    // optimize gate opens on "prediction ran", not on points.
                    warn!("forecast returned zero points");
                } else {
                    info!(
                        "forecast ready: {} points, mae {:.2}, r2 {:.3}",
                        result.points.len(),
                        result.metrics.mae,
                        result.metrics.r2
                    );
                }
                inner.cache.store_prediction(result.clone());
                Ok(result)
            }
            Err(source) => {
                inner.state = WorkflowState::PredictFailed;
                warn!("prediction failed: {}", source);
                Err(WorkflowError::Stage {
                    stage: Stage::Predict,
                    source,
                })
            }
        }
    }

    /// Request a bidding strategy for the cached forecast. The forecast's
    /// points are snapshotted at acceptance, so a concurrent config edit or a
    /// later upload cannot change what this call sends.
    pub async fn run_optimization(
        &self,
        config: &OptimizationConfig,
    ) -> Result<OptimizationResult, WorkflowError> {
        let points = {
            let mut inner = self.inner.lock().await;
            if let Some(stage) = inner.state.in_flight() {
                return Err(WorkflowError::Busy { stage });
            }
            let prediction = match inner.state {
                WorkflowState::Predicted | WorkflowState::OptimizeFailed => {
                    inner.cache.prediction()
                }
                _ => None,
            };
            let points = match prediction {
                Some(p) => p.points.clone(),
                None => {
                    return Err(WorkflowError::Precondition(Precondition::PredictionNotReady))
                }
            };
            inner.state = WorkflowState::Optimizing;
            points
        };

        info!("optimizing bids over {} forecast points", points.len());
        let outcome = self.api.optimize(&points, config).await;

        let mut inner = self.inner.lock().await;
        match outcome {
            Ok(result) => {
                inner.state = WorkflowState::Optimized;
                info!(
                    "strategy ready: bid {:.1} at {:.1} MW, expected revenue {:.0}",
                    result.optimal_price, result.optimal_power, result.expected_revenue
                );
                inner.cache.store_optimization(result.clone());
                Ok(result)
            }
            Err(source) => {
                inner.state = WorkflowState::OptimizeFailed;
                warn!("optimization failed: {}", source);
                Err(WorkflowError::Stage {
                    stage: Stage::Optimize,
                    source,
                })
            }
        }
    }
}
