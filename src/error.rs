//! Error taxonomy shared across the crate. Library modules return these
//! typed errors; `main` aggregates them behind `anyhow`.

use thiserror::Error;

use crate::model::Stage;

/// A config patch that failed validation. The store is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ConfigValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// How a service call failed, as seen by callers of the API client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),
    /// The service answered with a non-2xx status.
    #[error("service returned HTTP {0}")]
    HttpStatus(u16),
    #[error("request timed out")]
    Timeout,
    /// The response arrived but its body does not match the documented shape.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Gate that was not satisfied when a stage was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("dataset-not-ready: upload a valid dataset before requesting predictions")]
    DatasetNotReady,
    #[error("prediction-not-ready: run a prediction before optimizing bids")]
    PredictionNotReady,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Another call is running; the request was rejected without touching
    /// state or caches.
    #[error("a {stage} call is already in flight")]
    Busy { stage: Stage },
    #[error("{0}")]
    Precondition(Precondition),
    /// The service call itself failed; the workflow sits in the matching
    /// failed state and the same stage may be retried.
    #[error("{stage} stage failed")]
    Stage {
        stage: Stage,
        #[source]
        source: ApiError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("nothing to export: the table has no rows")]
    Empty,
    /// A record's field sequence differs from the first record's. Rows are
    /// never padded or reordered to fit.
    #[error("record {row} does not match the header (expected [{expected}], found [{found}])")]
    ShapeMismatch {
        row: usize,
        expected: String,
        found: String,
    },
}
