// Model module - pre-trained emotion classifiers
//
// The model artifact is a JSON document tagged by `kind`. It is loaded once
// at startup and shared read-only behind an `Arc<dyn Classifier>`.

mod centroid;
mod mlp;
mod predictor;

pub use centroid::{Centroid, CentroidModel};
pub use mlp::{Activation, DenseLayer, MlpModel, StandardScaler};
pub use predictor::Predictor;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::PredictionError;

/// Predicted emotion, as named by the model artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionLabel(String);

impl EmotionLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Presentation line shown to the user
    pub fn headline(&self) -> String {
        format!("Emotion of the audio is {}", self.0.to_uppercase())
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A trained classifier over fixed-width feature rows
pub trait Classifier: Send + Sync {
    /// Short name of the model family, e.g. `mlp`
    fn kind(&self) -> &'static str;

    /// Number of features each row must have
    fn input_dimension(&self) -> usize;

    /// Label vocabulary in model order
    fn labels(&self) -> Vec<EmotionLabel>;

    /// Predict one label per row
    fn predict_batch(&self, rows: &[Vec<f32>]) -> Result<Vec<EmotionLabel>, PredictionError>;
}

/// Serialized model artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmotionModel {
    /// Multilayer perceptron exported from a trained network
    Mlp(MlpModel),
    /// Nearest labelled centroid by Euclidean distance
    NearestCentroid(CentroidModel),
}

impl EmotionModel {
    /// Parse and validate a JSON artifact
    pub fn from_json(json: &str) -> Result<Self, PredictionError> {
        let model: EmotionModel =
            serde_json::from_str(json).map_err(|e| PredictionError::InvalidModel {
                reason: e.to_string(),
            })?;
        model.validate()?;
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String, PredictionError> {
        serde_json::to_string_pretty(self).map_err(|e| PredictionError::InvalidModel {
            reason: e.to_string(),
        })
    }

    /// Check that layer shapes, classes and centroids line up
    pub fn validate(&self) -> Result<(), PredictionError> {
        match self {
            EmotionModel::Mlp(model) => model.validate(),
            EmotionModel::NearestCentroid(model) => model.validate(),
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            EmotionModel::Mlp(model) => model,
            EmotionModel::NearestCentroid(model) => model,
        }
    }
}

impl Classifier for EmotionModel {
    fn kind(&self) -> &'static str {
        self.inner().kind()
    }

    fn input_dimension(&self) -> usize {
        self.inner().input_dimension()
    }

    fn labels(&self) -> Vec<EmotionLabel> {
        self.inner().labels()
    }

    fn predict_batch(&self, rows: &[Vec<f32>]) -> Result<Vec<EmotionLabel>, PredictionError> {
        self.inner().predict_batch(rows)
    }
}

/// Load a model artifact from disk
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<EmotionModel, PredictionError> {
    let path = path.as_ref();
    let load_failed = |reason: String| PredictionError::ModelLoadFailed {
        path: path.display().to_string(),
        reason,
    };

    let json = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
    let model = EmotionModel::from_json(&json).map_err(|e| match e {
        PredictionError::InvalidModel { reason } => load_failed(reason),
        other => other,
    })?;

    log::info!(
        "[Model] Loaded {} model from {} ({} inputs, {} labels)",
        model.kind(),
        path.display(),
        model.input_dimension(),
        model.labels().len()
    );
    Ok(model)
}

/// Reject rows whose width differs from the model input
pub(crate) fn check_rows(rows: &[Vec<f32>], expected: usize) -> Result<(), PredictionError> {
    match rows.iter().find(|row| row.len() != expected) {
        Some(row) => Err(PredictionError::DimensionMismatch {
            expected,
            actual: row.len(),
        }),
        None => Ok(()),
    }
}
