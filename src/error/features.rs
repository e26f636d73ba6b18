// Feature extraction error types and constants

use crate::error::ErrorCode;
use std::fmt;

/// Extraction error code constants
///
/// Error code range: 2001-2003
pub struct ExtractionErrorCodes {}

impl ExtractionErrorCodes {
    /// Canonical file could not be opened or read
    pub const READ_FAILED: i32 = 2001;

    /// File is not a well-formed WAV
    pub const INVALID_WAV: i32 = 2002;

    /// WAV sample format is not supported
    pub const UNSUPPORTED_SAMPLE_FORMAT: i32 = 2003;
}

/// Errors raised while re-reading the canonical waveform
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// I/O error opening or reading the file
    ReadFailed { details: String },

    /// Malformed WAV header or truncated data
    InvalidWav { details: String },

    /// Bit depth / sample format not handled
    UnsupportedSampleFormat { bits_per_sample: u16 },
}

impl ErrorCode for ExtractionError {
    fn code(&self) -> i32 {
        match self {
            ExtractionError::ReadFailed { .. } => ExtractionErrorCodes::READ_FAILED,
            ExtractionError::InvalidWav { .. } => ExtractionErrorCodes::INVALID_WAV,
            ExtractionError::UnsupportedSampleFormat { .. } => {
                ExtractionErrorCodes::UNSUPPORTED_SAMPLE_FORMAT
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ExtractionError::ReadFailed { details } => {
                format!("Failed to read waveform: {}", details)
            }
            ExtractionError::InvalidWav { details } => format!("Invalid WAV file: {}", details),
            ExtractionError::UnsupportedSampleFormat { bits_per_sample } => {
                format!("Unsupported bits per sample: {}", bits_per_sample)
            }
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExtractionError (code {}): {}",
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ExtractionError {}

impl From<hound::Error> for ExtractionError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => ExtractionError::ReadFailed {
                details: io.to_string(),
            },
            other => ExtractionError::InvalidWav {
                details: other.to_string(),
            },
        }
    }
}
