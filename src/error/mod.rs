// Error types for the emotion recognition pipeline
//
// Each pipeline stage owns an error enum with numeric codes. PipelineError
// wraps them so callers can tell a decode fault from an extraction fault
// from a prediction fault without string matching.

mod audio;
mod features;
mod model;

pub use audio::{AudioError, AudioErrorCodes};
pub use features::{ExtractionError, ExtractionErrorCodes};
pub use model::{PredictionError, PredictionErrorCodes};

use log::error;
use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so the CLI and HTTP layers can report them
/// uniformly.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Stage of the pipeline that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Decode,
    Extraction,
    Prediction,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Decode => "decode",
            PipelineStage::Extraction => "extraction",
            PipelineStage::Prediction => "prediction",
        }
    }
}

/// Any fault raised between upload and label
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Upload could not be decoded or converted to canonical PCM
    Decode(AudioError),
    /// Canonical file could not be re-read for feature extraction
    Extraction(ExtractionError),
    /// Classifier rejected the vector or failed internally
    Prediction(PredictionError),
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Decode(_) => PipelineStage::Decode,
            PipelineError::Extraction(_) => PipelineStage::Extraction,
            PipelineError::Prediction(_) => PipelineStage::Prediction,
        }
    }
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::Decode(err) => err.code(),
            PipelineError::Extraction(err) => err.code(),
            PipelineError::Prediction(err) => err.code(),
        }
    }

    fn message(&self) -> String {
        match self {
            PipelineError::Decode(err) => err.message(),
            PipelineError::Extraction(err) => err.message(),
            PipelineError::Prediction(err) => err.message(),
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error (code {}): {}",
            self.stage().as_str(),
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Decode(err) => Some(err),
            PipelineError::Extraction(err) => Some(err),
            PipelineError::Prediction(err) => Some(err),
        }
    }
}

impl From<AudioError> for PipelineError {
    fn from(err: AudioError) -> Self {
        PipelineError::Decode(err)
    }
}

impl From<ExtractionError> for PipelineError {
    fn from(err: ExtractionError) -> Self {
        PipelineError::Extraction(err)
    }
}

impl From<PredictionError> for PipelineError {
    fn from(err: PredictionError) -> Self {
        PipelineError::Prediction(err)
    }
}

/// Log a pipeline error with its stage and code
pub fn log_pipeline_error(err: &PipelineError, context: &str) {
    error!(
        "Pipeline error in {}: stage={}, code={}, message={}",
        context,
        err.stage().as_str(),
        err.code(),
        err.message()
    );
}
