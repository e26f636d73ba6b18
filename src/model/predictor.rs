// Predictor - single-vector prediction over a shared classifier

use std::sync::Arc;

use super::{Classifier, EmotionLabel};
use crate::error::PredictionError;

/// Wraps a feature vector as a one-row batch and returns the first label
#[derive(Clone)]
pub struct Predictor {
    classifier: Arc<dyn Classifier>,
}

impl Predictor {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    pub fn predict(&self, features: &[f32]) -> Result<EmotionLabel, PredictionError> {
        let expected = self.classifier.input_dimension();
        if features.len() != expected {
            return Err(PredictionError::DimensionMismatch {
                expected,
                actual: features.len(),
            });
        }

        let label = self
            .classifier
            .predict_batch(&[features.to_vec()])?
            .into_iter()
            .next()
            .ok_or(PredictionError::EmptyPrediction)?;

        log::debug!("[Predictor] {} -> {}", self.classifier.kind(), label);
        Ok(label)
    }
}
