// Nearest-centroid classifier

use serde::{Deserialize, Serialize};

use super::{check_rows, Classifier, EmotionLabel};
use crate::error::PredictionError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub label: String,
    pub values: Vec<f32>,
}

/// Picks the label of the closest centroid (Euclidean); earlier centroids win ties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidModel {
    pub centroids: Vec<Centroid>,
}

impl CentroidModel {
    pub fn new(centroids: Vec<Centroid>) -> Self {
        Self { centroids }
    }

    pub fn validate(&self) -> Result<(), PredictionError> {
        let Some(first) = self.centroids.first() else {
            return Err(PredictionError::InvalidModel {
                reason: "no centroids".to_string(),
            });
        };
        if first.values.is_empty() {
            return Err(PredictionError::InvalidModel {
                reason: "centroids are empty".to_string(),
            });
        }
        if let Some(bad) = self
            .centroids
            .iter()
            .find(|c| c.values.len() != first.values.len())
        {
            return Err(PredictionError::InvalidModel {
                reason: format!(
                    "centroid '{}' has {} values, expected {}",
                    bad.label,
                    bad.values.len(),
                    first.values.len()
                ),
            });
        }
        Ok(())
    }

    fn nearest(&self, row: &[f32]) -> Option<&Centroid> {
        let mut best: Option<(&Centroid, f64)> = None;
        for centroid in &self.centroids {
            let distance: f64 = centroid
                .values
                .iter()
                .zip(row)
                .map(|(&c, &x)| {
                    let d = (c - x) as f64;
                    d * d
                })
                .sum();
            if best.map_or(true, |(_, current)| distance < current) {
                best = Some((centroid, distance));
            }
        }
        best.map(|(centroid, _)| centroid)
    }
}

impl Classifier for CentroidModel {
    fn kind(&self) -> &'static str {
        "nearest_centroid"
    }

    fn input_dimension(&self) -> usize {
        self.centroids.first().map_or(0, |c| c.values.len())
    }

    fn labels(&self) -> Vec<EmotionLabel> {
        self.centroids
            .iter()
            .map(|c| EmotionLabel::new(c.label.clone()))
            .collect()
    }

    fn predict_batch(&self, rows: &[Vec<f32>]) -> Result<Vec<EmotionLabel>, PredictionError> {
        check_rows(rows, self.input_dimension())?;
        rows.iter()
            .map(|row| {
                self.nearest(row)
                    .map(|c| EmotionLabel::new(c.label.clone()))
                    .ok_or(PredictionError::EmptyPrediction)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> CentroidModel {
        CentroidModel::new(vec![
            Centroid {
                label: "neutral".into(),
                values: vec![0.0, 0.0],
            },
            Centroid {
                label: "fearful".into(),
                values: vec![4.0, 0.0],
            },
            Centroid {
                label: "disgust".into(),
                values: vec![0.0, 4.0],
            },
        ])
    }

    #[test]
    fn test_nearest_wins() {
        let labels = model()
            .predict_batch(&[vec![3.5, 0.2], vec![0.1, 3.0], vec![0.5, 0.5]])
            .unwrap();
        let names: Vec<&str> = labels.iter().map(EmotionLabel::as_str).collect();
        assert_eq!(names, vec!["fearful", "disgust", "neutral"]);
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        let labels = model().predict_batch(&[vec![2.0, 2.0]]).unwrap();
        // Equidistant from all three but "neutral" is declared first
        assert_eq!(labels[0].as_str(), "neutral");
    }

    #[test]
    fn test_empty_batch_yields_no_labels() {
        assert!(model().predict_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_ragged_centroids_are_invalid() {
        let mut bad = model();
        bad.centroids[1].values.push(1.0);
        assert!(matches!(
            bad.validate(),
            Err(PredictionError::InvalidModel { .. })
        ));
        assert!(CentroidModel::new(vec![]).validate().is_err());
    }

    #[test]
    fn test_wrong_width_row() {
        let err = model().predict_batch(&[vec![1.0]]).unwrap_err();
        assert_eq!(
            err,
            PredictionError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }
}
