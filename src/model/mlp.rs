// MLP classifier - dense feed-forward network with argmax output
//
// Weights are stored input-major (`weights[i][j]` connects input i to
// unit j), the layout sklearn's `coefs_` uses. The hidden activation is
// applied between layers; the output layer is read as raw scores since the
// final softmax/logistic does not change which unit wins.

use serde::{Deserialize, Serialize};

use super::{check_rows, Classifier, EmotionLabel};
use crate::error::PredictionError;

/// Hidden layer activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Logistic,
    Identity,
}

impl Activation {
    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Logistic => 1.0 / (1.0 + (-x).exp()),
            Activation::Identity => x,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub biases: Vec<f32>,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.len()
    }

    fn outputs(&self) -> usize {
        self.biases.len()
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut out = self.biases.clone();
        for (x, row) in input.iter().zip(&self.weights) {
            for (acc, w) in out.iter_mut().zip(row) {
                *acc += x * w;
            }
        }
        out
    }
}

/// Per-feature standardization applied before the first layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl StandardScaler {
    fn transform(&self, row: &[f32]) -> Vec<f32> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (&m, &s))| if s != 0.0 { (x - m) / s } else { x - m })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpModel {
    pub classes: Vec<String>,
    pub layers: Vec<DenseLayer>,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
}

impl MlpModel {
    pub fn validate(&self) -> Result<(), PredictionError> {
        let invalid = |reason: String| Err(PredictionError::InvalidModel { reason });

        if self.classes.is_empty() {
            return invalid("mlp has no classes".to_string());
        }
        let Some(first) = self.layers.first() else {
            return invalid("mlp has no layers".to_string());
        };
        if first.inputs() == 0 {
            return invalid("first layer has no inputs".to_string());
        }

        for (idx, layer) in self.layers.iter().enumerate() {
            if let Some(row) = layer.weights.iter().find(|row| row.len() != layer.outputs()) {
                return invalid(format!(
                    "layer {} has a weight row of {} values for {} units",
                    idx,
                    row.len(),
                    layer.outputs()
                ));
            }
            if idx > 0 && layer.inputs() != self.layers[idx - 1].outputs() {
                return invalid(format!(
                    "layer {} expects {} inputs but layer {} has {} units",
                    idx,
                    layer.inputs(),
                    idx - 1,
                    self.layers[idx - 1].outputs()
                ));
            }
        }

        let output_units = self.layers[self.layers.len() - 1].outputs();
        let binary = self.classes.len() == 2 && output_units == 1;
        if !binary && output_units != self.classes.len() {
            return invalid(format!(
                "output layer has {} units for {} classes",
                output_units,
                self.classes.len()
            ));
        }

        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != first.inputs() || scaler.scale.len() != first.inputs() {
                return invalid(format!(
                    "scaler covers {}/{} features, model has {}",
                    scaler.mean.len(),
                    scaler.scale.len(),
                    first.inputs()
                ));
            }
        }

        Ok(())
    }

    fn predict_row(&self, row: &[f32]) -> usize {
        let mut activations = match &self.scaler {
            Some(scaler) => scaler.transform(row),
            None => row.to_vec(),
        };

        let last = self.layers.len() - 1;
        for (idx, layer) in self.layers.iter().enumerate() {
            activations = layer.forward(&activations);
            if idx < last {
                for value in activations.iter_mut() {
                    *value = self.activation.apply(*value);
                }
            }
        }

        if activations.len() == 1 && self.classes.len() == 2 {
            // Single logistic unit: positive score selects the second class
            return usize::from(activations[0] > 0.0);
        }
        argmax(&activations)
    }
}

/// Index of the largest value; the first one wins ties
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = idx;
        }
    }
    best
}

impl Classifier for MlpModel {
    fn kind(&self) -> &'static str {
        "mlp"
    }

    fn input_dimension(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::inputs)
    }

    fn labels(&self) -> Vec<EmotionLabel> {
        self.classes.iter().map(EmotionLabel::new).collect()
    }

    fn predict_batch(&self, rows: &[Vec<f32>]) -> Result<Vec<EmotionLabel>, PredictionError> {
        check_rows(rows, self.input_dimension())?;
        rows.iter()
            .map(|row| {
                let idx = self.predict_row(row);
                self.classes
                    .get(idx)
                    .map(EmotionLabel::new)
                    .ok_or_else(|| PredictionError::InvalidModel {
                        reason: format!(
                            "output unit {} has no class ({} declared)",
                            idx,
                            self.classes.len()
                        ),
                    })
            })
            .collect()
    }
}
