//! Configuration management for the emotion recognizer
//!
//! Runtime configuration is loaded from a JSON file so analysis parameters,
//! upload limits and the model location can change without recompilation.
//! Every section falls back to defaults that reproduce the 180-value
//! feature layout the bundled classifiers are trained on.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "EMOTION_CONFIG";
/// Environment variable overriding the HTTP bind address
pub const ADDR_ENV: &str = "EMOTION_HTTP_ADDR";
/// Environment variable overriding the model artifact path
pub const MODEL_ENV: &str = "EMOTION_MODEL_PATH";

const DEFAULT_CONFIG_PATH: &str = "assets/emotion_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub ingest: IngestConfig,
    pub features: FeatureConfig,
    pub plot: PlotConfig,
}

/// HTTP front end settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the server binds
    pub addr: String,
    /// Requests running longer than this are answered with 408
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8501".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Location of the serialized classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("emotion_model.json"),
        }
    }
}

/// Upload normalization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Resample canonical clips to this rate; `None` keeps the source rate
    pub target_sample_rate: Option<u32>,
    /// Directory for per-upload temporary files; `None` uses the system temp dir
    pub temp_dir: Option<PathBuf>,
    /// Uploaded-but-not-yet-predicted clips kept before the oldest is evicted
    pub max_pending_clips: usize,
    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: None,
            temp_dir: None,
            max_pending_clips: 16,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Spectral analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// FFT window size in samples
    pub n_fft: usize,
    /// Hop between successive STFT frames
    pub hop_length: usize,
    /// Cepstral coefficients kept after the DCT
    pub n_mfcc: usize,
    /// Mel bands for both the MFCC and mel sub-vectors
    pub n_mels: usize,
    /// Pitch classes in the chromagram
    pub n_chroma: usize,
    /// Signal extension before centered framing
    pub pad_mode: PadMode,
}

/// How the signal is extended by `n_fft / 2` samples on each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadMode {
    /// Zeros (librosa 0.10 and later)
    #[default]
    Constant,
    /// Mirror image without repeating the edge sample (librosa 0.9 and earlier)
    Reflect,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            n_mfcc: 40,
            n_mels: 128,
            n_chroma: 12,
            pad_mode: PadMode::Constant,
        }
    }
}

impl FeatureConfig {
    /// Reject sizes the STFT and filterbanks cannot be built from
    pub fn validate(&self) -> Result<(), String> {
        if self.n_fft < 2 {
            return Err(format!("n_fft must be at least 2, got {}", self.n_fft));
        }
        if self.hop_length == 0 {
            return Err("hop_length must be positive".to_string());
        }
        for (name, value) in [
            ("n_mfcc", self.n_mfcc),
            ("n_mels", self.n_mels),
            ("n_chroma", self.n_chroma),
        ] {
            if value == 0 {
                return Err(format!("{} must be positive", name));
            }
        }
        Ok(())
    }
}

/// Waveform plot settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    /// Rate the waveform is resampled to before plotting
    pub sample_rate: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 400,
            sample_rate: 22_050,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    ///
    /// Missing or unparsable files fall back to defaults with a warning, so
    /// the demo always starts.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(mut config) => {
                    if let Err(reason) = config.features.validate() {
                        log::warn!(
                            "[Config] Invalid feature settings in {:?}: {}. Using default features.",
                            path.as_ref(),
                            reason
                        );
                        config.features = FeatureConfig::default();
                    }
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from `EMOTION_CONFIG` (or the bundled default path)
    /// and apply environment overrides
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_from_file(path);
        config.apply_env_overrides();
        config
    }

    /// Apply `EMOTION_HTTP_ADDR` / `EMOTION_MODEL_PATH` when set
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(ADDR_ENV) {
            self.server.addr = addr;
        }
        if let Ok(path) = std::env::var(MODEL_ENV) {
            self.model.path = PathBuf::from(path);
        }
    }
}
