// Pipeline - canonical clip -> features -> label
//
// Each run is synchronous and stateless. The classifier handle is shared
// read-only, so one pipeline can serve concurrent requests.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::analysis::features::{FeatureExtractor, FeatureSelection, FeatureVector};
use crate::audio::{wav, CanonicalClip, Ingestor, Waveform};
use crate::config::FeatureConfig;
use crate::error::PipelineError;
use crate::model::{Classifier, EmotionLabel, Predictor};

/// Outcome of one prediction
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub label: EmotionLabel,
    pub features: FeatureVector,
    pub sample_rate: u32,
    pub duration_secs: f32,
}

impl PredictionReport {
    /// Headline shown to the user, e.g. `Emotion of the audio is HAPPY`
    pub fn header(&self) -> String {
        self.label.headline()
    }
}

pub struct EmotionPipeline {
    extractor: FeatureExtractor,
    predictor: Predictor,
    selection: FeatureSelection,
}

impl EmotionPipeline {
    pub fn new(config: FeatureConfig, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            extractor: FeatureExtractor::new(config),
            predictor: Predictor::new(classifier),
            selection: FeatureSelection::ALL,
        }
    }

    /// Use a subset of the feature groups; the classifier must expect the matching width
    pub fn with_selection(mut self, selection: FeatureSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn selection(&self) -> FeatureSelection {
        self.selection
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        self.predictor.classifier()
    }

    /// Feature vector of a canonical WAV file
    pub fn features<P: AsRef<Path>>(&self, path: P) -> Result<FeatureVector, PipelineError> {
        Ok(self.extractor.extract_file(path, self.selection)?)
    }

    pub fn predict_waveform(&self, wave: &Waveform) -> Result<PredictionReport, PipelineError> {
        let features = self.extractor.extract_waveform(wave, self.selection)?;
        let label = self.predictor.predict(features.as_slice())?;
        Ok(PredictionReport {
            label,
            features,
            sample_rate: wave.sample_rate,
            duration_secs: wave.duration_secs(),
        })
    }

    /// Predict from a canonical WAV file on disk
    pub fn predict_path<P: AsRef<Path>>(&self, path: P) -> Result<PredictionReport, PipelineError> {
        let wave = wav::read_wav(path)?;
        self.predict_waveform(&wave)
    }

    pub fn predict_clip(&self, clip: &CanonicalClip) -> Result<PredictionReport, PipelineError> {
        let report = self.predict_path(clip.path())?;
        log::info!(
            "[Pipeline] Clip {} -> {} ({:.2}s)",
            clip.id(),
            report.label,
            report.duration_secs
        );
        Ok(report)
    }

    /// Full run on raw upload bytes; the canonical file is removed before returning
    pub fn predict_upload(
        &self,
        ingestor: &Ingestor,
        bytes: Vec<u8>,
        file_name: Option<&str>,
    ) -> Result<PredictionReport, PipelineError> {
        let clip = ingestor.ingest_bytes(bytes, file_name)?;
        self.predict_clip(&clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use crate::error::{ExtractionError, PipelineStage, PredictionError};
    use crate::model::{Centroid, CentroidModel};
    use crate::testing::{voiced_tone, wav_bytes};

    fn two_class_model(dim: usize) -> Arc<dyn Classifier> {
        Arc::new(CentroidModel::new(vec![
            Centroid {
                label: "neutral".into(),
                values: vec![0.0; dim],
            },
            Centroid {
                label: "angry".into(),
                values: vec![1.0e6; dim],
            },
        ]))
    }

    #[test]
    fn test_predict_waveform_reports_metadata() {
        let pipeline = EmotionPipeline::new(FeatureConfig::default(), two_class_model(180));
        let wave = Waveform::mono(voiced_tone(16_000, 200.0, 16_000), 16_000);

        let report = pipeline.predict_waveform(&wave).unwrap();
        assert_eq!(report.label.as_str(), "neutral");
        assert_eq!(report.header(), "Emotion of the audio is NEUTRAL");
        assert_eq!(report.features.len(), 180);
        assert_eq!(report.sample_rate, 16_000);
        assert!((report.duration_secs - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_wrong_model_width_is_prediction_error() {
        let pipeline = EmotionPipeline::new(FeatureConfig::default(), two_class_model(12));
        let wave = Waveform::mono(vec![0.0; 4096], 22_050);

        let err = pipeline.predict_waveform(&wave).unwrap_err();
        assert_eq!(err.stage(), PipelineStage::Prediction);
        assert!(matches!(
            err,
            PipelineError::Prediction(PredictionError::DimensionMismatch {
                expected: 12,
                actual: 180
            })
        ));
    }

    #[test]
    fn test_selection_changes_expected_width() {
        let pipeline = EmotionPipeline::new(FeatureConfig::default(), two_class_model(12))
            .with_selection(FeatureSelection {
                mfcc: false,
                chroma: true,
                mel: false,
            });
        let wave = Waveform::mono(voiced_tone(22_050, 220.0, 8192), 22_050);
        assert_eq!(pipeline.predict_waveform(&wave).unwrap().features.len(), 12);
    }

    #[test]
    fn test_missing_file_is_extraction_error() {
        let pipeline = EmotionPipeline::new(FeatureConfig::default(), two_class_model(180));
        let err = pipeline.predict_path("/nonexistent/clip.wav").unwrap_err();
        assert_eq!(err.stage(), PipelineStage::Extraction);
        assert!(matches!(
            err,
            PipelineError::Extraction(ExtractionError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_corrupt_upload_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = Ingestor::new(IngestConfig {
            temp_dir: Some(dir.path().to_path_buf()),
            ..IngestConfig::default()
        });
        let pipeline = EmotionPipeline::new(FeatureConfig::default(), two_class_model(180));

        let err = pipeline
            .predict_upload(&ingestor, b"definitely not audio".to_vec(), Some("x.wav"))
            .unwrap_err();
        assert_eq!(err.stage(), PipelineStage::Decode);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_upload_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = Ingestor::new(IngestConfig {
            temp_dir: Some(dir.path().to_path_buf()),
            ..IngestConfig::default()
        });
        let pipeline = EmotionPipeline::new(FeatureConfig::default(), two_class_model(180));
        let bytes = wav_bytes(&voiced_tone(22_050, 180.0, 22_050), 1, 22_050);

        let report = pipeline
            .predict_upload(&ingestor, bytes, Some("voice.wav"))
            .unwrap();
        assert_eq!(report.features.len(), 180);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
