// Ingestor - normalize uploads into canonical per-request WAV files
//
// Every upload is decoded, optionally resampled, and written to its own
// uniquely named temporary file. The file lives exactly as long as the
// CanonicalClip that owns it: dropping the clip removes it, whichever way
// the request ends.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;
use uuid::Uuid;

use super::{decode, resample, wav, Waveform};
use crate::config::IngestConfig;
use crate::error::AudioError;

const TEMP_PREFIX: &str = "emotion_clip_";

/// A normalized upload backed by a transient WAV file
#[derive(Debug)]
pub struct CanonicalClip {
    id: Uuid,
    file: NamedTempFile,
    original_name: Option<String>,
    channels: u16,
    sample_rate: u32,
    frames: usize,
}

impl CanonicalClip {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Path of the canonical WAV; valid until the clip is dropped
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f32 / self.sample_rate as f32
    }

    /// Canonical WAV bytes, used for playback
    pub fn read_bytes(&self) -> Result<Vec<u8>, AudioError> {
        Ok(fs::read(self.path())?)
    }

    /// Keep the canonical file after the clip is dropped
    pub fn persist<P: AsRef<Path>>(self, target: P) -> Result<PathBuf, AudioError> {
        let target = target.as_ref().to_path_buf();
        fs::copy(self.path(), &target)?;
        Ok(target)
    }
}

impl Drop for CanonicalClip {
    fn drop(&mut self) {
        debug!("[Ingest] Releasing clip {} ({:?})", self.id, self.file.path());
    }
}

/// Converts uploads into canonical clips
#[derive(Debug, Clone, Default)]
pub struct Ingestor {
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Decode an upload and write it as a canonical WAV
    ///
    /// # Arguments
    /// * `bytes` - Upload contents in any supported container
    /// * `file_name` - Client-supplied name; its extension is a probe hint only
    pub fn ingest_bytes(
        &self,
        bytes: Vec<u8>,
        file_name: Option<&str>,
    ) -> Result<CanonicalClip, AudioError> {
        let extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str());

        let upload_len = bytes.len();
        let decoded = decode::decode_bytes(bytes, extension)?;
        let wave = match self.config.target_sample_rate {
            Some(rate) if rate != decoded.sample_rate => resample::resample(&decoded, rate)?,
            _ => decoded,
        };

        let file = self.write_canonical(&wave)?;
        let clip = CanonicalClip {
            id: Uuid::new_v4(),
            file,
            original_name: file_name.map(str::to_string),
            channels: wave.channels,
            sample_rate: wave.sample_rate,
            frames: wave.frames(),
        };

        info!(
            "[Ingest] Clip {} from {:?}: {} bytes -> {} frames, {} ch @ {} Hz",
            clip.id,
            file_name,
            upload_len,
            clip.frames,
            clip.channels,
            clip.sample_rate
        );

        Ok(clip)
    }

    /// Read a file from disk and ingest it
    pub fn ingest_file<P: AsRef<Path>>(&self, path: P) -> Result<CanonicalClip, AudioError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path.file_name().and_then(|name| name.to_str());
        self.ingest_bytes(bytes, name)
    }

    fn write_canonical(&self, wave: &Waveform) -> Result<NamedTempFile, AudioError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(".wav");
        let file = match &self.config.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        wav::write_wav(BufWriter::new(file.reopen()?), wave)?;
        Ok(file)
    }
}
