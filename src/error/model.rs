// Classifier / prediction error types and constants

use crate::error::ErrorCode;
use std::fmt;

/// Prediction error code constants
///
/// Error code range: 3001-3004
pub struct PredictionErrorCodes {}

impl PredictionErrorCodes {
    /// Model artifact could not be read or parsed
    pub const MODEL_LOAD_FAILED: i32 = 3001;

    /// Feature vector width differs from the model input width
    pub const DIMENSION_MISMATCH: i32 = 3002;

    /// Classifier returned no label for the batch
    pub const EMPTY_PREDICTION: i32 = 3003;

    /// Model artifact parsed but is internally inconsistent
    pub const INVALID_MODEL: i32 = 3004;
}

/// Errors raised at the classifier boundary
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// Reading or parsing the model artifact failed
    ModelLoadFailed { path: String, reason: String },

    /// Input vector has the wrong number of features
    DimensionMismatch { expected: usize, actual: usize },

    /// Batch prediction produced no labels
    EmptyPrediction,

    /// Weights, classes or centroids do not line up
    InvalidModel { reason: String },
}

impl ErrorCode for PredictionError {
    fn code(&self) -> i32 {
        match self {
            PredictionError::ModelLoadFailed { .. } => PredictionErrorCodes::MODEL_LOAD_FAILED,
            PredictionError::DimensionMismatch { .. } => PredictionErrorCodes::DIMENSION_MISMATCH,
            PredictionError::EmptyPrediction => PredictionErrorCodes::EMPTY_PREDICTION,
            PredictionError::InvalidModel { .. } => PredictionErrorCodes::INVALID_MODEL,
        }
    }

    fn message(&self) -> String {
        match self {
            PredictionError::ModelLoadFailed { path, reason } => {
                format!("Failed to load model from {}: {}", path, reason)
            }
            PredictionError::DimensionMismatch { expected, actual } => format!(
                "Feature vector has {} values but the model expects {}",
                actual, expected
            ),
            PredictionError::EmptyPrediction => "Classifier returned no prediction".to_string(),
            PredictionError::InvalidModel { reason } => format!("Invalid model: {}", reason),
        }
    }
}

impl fmt::Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PredictionError (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PredictionError {}
