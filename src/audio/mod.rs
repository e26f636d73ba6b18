// Audio module - upload decoding and canonical PCM conversion

pub mod decode;
pub mod ingest;
pub mod resample;
pub mod wav;
mod waveform;

// Re-export commonly used types for convenience
pub use ingest::{CanonicalClip, Ingestor};
pub use waveform::Waveform;
