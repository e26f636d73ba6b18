// Speech Emotion Recognizer core
// Upload -> canonical WAV -> MFCC/chroma/mel features -> pre-trained classifier

// Module declarations
pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod plot;
pub mod testing;

// Re-exports for convenience
pub use analysis::features::{FeatureExtractor, FeatureSelection, FeatureVector};
pub use audio::{CanonicalClip, Ingestor, Waveform};
pub use config::AppConfig;
pub use error::{PipelineError, PipelineStage};
pub use model::{load_model, Classifier, EmotionLabel, EmotionModel};
pub use pipeline::{EmotionPipeline, PredictionReport};
