use crate::model::{DatasetSummary, OptimizationResult, PredictionResult};

/// Latest successful result per stage. Entries are only ever replaced
/// wholesale by that stage's next success; a failed call leaves them alone.
#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    dataset: Option<DatasetSummary>,
    prediction: Option<PredictionResult>,
    optimization: Option<OptimizationResult>,
}

impl ResultCache {
    pub fn dataset(&self) -> Option<&DatasetSummary> {
        self.dataset.as_ref()
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.prediction.as_ref()
    }

    pub fn optimization(&self) -> Option<&OptimizationResult> {
        self.optimization.as_ref()
    }

    pub fn store_dataset(&mut self, summary: DatasetSummary) {
        self.dataset = Some(summary);
    }

    pub fn store_prediction(&mut self, result: PredictionResult) {
        self.prediction = Some(result);
    }

    pub fn store_optimization(&mut self, result: OptimizationResult) {
        self.optimization = Some(result);
    }

    /// A new upload makes any forecast or strategy computed from the previous
    /// dataset stale; both are dropped before the upload even starts.
    pub fn clear_downstream_of_upload(&mut self) {
        self.prediction = None;
        self.optimization = None;
    }
}
