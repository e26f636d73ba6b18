// Audio ingestion error types and constants

use crate::error::ErrorCode;
use std::fmt;

/// Audio error code constants
///
/// Single source of truth for the decode category codes reported by the
/// CLI exit status and the HTTP error payload.
///
/// Error code range: 1001-1007
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Container was recognised but a packet could not be decoded
    pub const DECODE_FAILED: i32 = 1001;

    /// No registered demuxer/codec accepts the upload
    pub const UNSUPPORTED_FORMAT: i32 = 1002;

    /// Container holds no decodable audio track
    pub const NO_AUDIO_TRACK: i32 = 1003;

    /// Decoding succeeded but produced zero samples
    pub const EMPTY_STREAM: i32 = 1004;

    /// Canonical WAV could not be written
    pub const ENCODE_FAILED: i32 = 1005;

    /// Sample rate conversion failed
    pub const RESAMPLE_FAILED: i32 = 1006;

    /// Filesystem error while handling the upload
    pub const IO: i32 = 1007;
}

/// Audio-related errors
///
/// These cover decoding of arbitrary uploads and conversion to the
/// canonical PCM container.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// A packet failed to decode
    DecodeFailed { reason: String },

    /// Format probe or codec lookup failed
    UnsupportedFormat { reason: String },

    /// No audio track in the container
    NoAudioTrack,

    /// The stream decoded to nothing
    EmptyStream,

    /// Writing the canonical WAV failed
    EncodeFailed { reason: String },

    /// Resampler construction or processing failed
    ResampleFailed { reason: String },

    /// Underlying I/O error
    Io { details: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::DecodeFailed { .. } => AudioErrorCodes::DECODE_FAILED,
            AudioError::UnsupportedFormat { .. } => AudioErrorCodes::UNSUPPORTED_FORMAT,
            AudioError::NoAudioTrack => AudioErrorCodes::NO_AUDIO_TRACK,
            AudioError::EmptyStream => AudioErrorCodes::EMPTY_STREAM,
            AudioError::EncodeFailed { .. } => AudioErrorCodes::ENCODE_FAILED,
            AudioError::ResampleFailed { .. } => AudioErrorCodes::RESAMPLE_FAILED,
            AudioError::Io { .. } => AudioErrorCodes::IO,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::DecodeFailed { reason } => format!("Failed to decode audio: {}", reason),
            AudioError::UnsupportedFormat { reason } => {
                format!("Unsupported audio format: {}", reason)
            }
            AudioError::NoAudioTrack => "No audio track found in upload".to_string(),
            AudioError::EmptyStream => "Audio stream contains no samples".to_string(),
            AudioError::EncodeFailed { reason } => {
                format!("Failed to write canonical WAV: {}", reason)
            }
            AudioError::ResampleFailed { reason } => format!("Resampling failed: {}", reason),
            AudioError::Io { details } => format!("I/O error: {}", details),
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AudioError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::Io {
            details: err.to_string(),
        }
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => io.into(),
            other => AudioError::EncodeFailed {
                reason: other.to_string(),
            },
        }
    }
}
