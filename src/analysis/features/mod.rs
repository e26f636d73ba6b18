// FeatureExtractor - fixed-length acoustic features for emotion classification
//
// A canonical WAV clip is reduced to one vector by averaging three
// time-frequency representations over time:
//
// - fft: centered STFT (periodic Hann window)
// - mfcc: 40 cepstral coefficients of the log mel power spectrogram
// - chroma: 12 pitch-class energies from the magnitude spectrogram
// - tuning: deviation from A440 the chroma filterbank is shifted by
// - mel: 128 Slaney mel bands of the power spectrogram
// - types: selection flags and the output vector
//
// Sub-vectors are concatenated in the fixed order MFCC, chroma, mel.

mod chroma;
mod fft;
mod mel;
mod mfcc;
mod tuning;
mod types;


pub use chroma::ChromaFilterbank;
pub use fft::{Spectrogram, StftProcessor};
pub use mel::{hz_to_mel, mel_to_hz, MelFilterbank};
pub use mfcc::{power_to_db, MfccProcessor};
pub use tuning::{estimate_tuning, piptrack, pitch_tuning, PitchPeak};
pub use types::{FeatureSelection, FeatureVector};

use std::path::Path;

use crate::audio::{wav, Waveform};
use crate::config::FeatureConfig;
use crate::error::ExtractionError;

/// Coordinates STFT, filterbanks and frame averaging
pub struct FeatureExtractor {
    config: FeatureConfig,
    stft: StftProcessor,
    mfcc: MfccProcessor,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            stft: StftProcessor::new(config.n_fft, config.hop_length)
                .with_pad_mode(config.pad_mode),
            mfcc: MfccProcessor::new(config.n_mfcc, config.n_mels),
            config,
        }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Length of the vector produced for `selection`
    pub fn dimension(&self, selection: FeatureSelection) -> usize {
        selection.dimension(&self.config)
    }

    /// Read a WAV file and extract its feature vector
    pub fn extract_file<P: AsRef<Path>>(
        &self,
        path: P,
        selection: FeatureSelection,
    ) -> Result<FeatureVector, ExtractionError> {
        let path = path.as_ref();
        let wave = wav::read_wav(path)?;
        log::debug!(
            "[FeatureExtractor] Read {} ({} ch, {} Hz, {} frames)",
            path.display(),
            wave.channels,
            wave.sample_rate,
            wave.frames()
        );
        self.extract_waveform(&wave, selection)
    }

    /// Extract from an in-memory waveform; multichannel audio is averaged to mono
    pub fn extract_waveform(
        &self,
        wave: &Waveform,
        selection: FeatureSelection,
    ) -> Result<FeatureVector, ExtractionError> {
        if wave.sample_rate == 0 {
            return Err(ExtractionError::InvalidWav {
                details: "sample rate is zero".to_string(),
            });
        }
        Ok(self.extract(&wave.to_mono(), wave.sample_rate, selection))
    }

    /// Extract from mono samples
    ///
    /// Silent or very short signals still yield finite values since the
    /// STFT always produces at least one frame.
    pub fn extract(
        &self,
        samples: &[f32],
        sample_rate: u32,
        selection: FeatureSelection,
    ) -> FeatureVector {
        let mut values = Vec::with_capacity(self.dimension(selection));
        if !selection.any() {
            return FeatureVector { values, selection };
        }

        let magnitude = self.stft.magnitude(samples);

        let mel_power = if selection.mfcc || selection.mel {
            let bank =
                MelFilterbank::full_band(sample_rate, self.config.n_fft, self.config.n_mels);
            Some(bank.spectrogram(&magnitude.power()))
        } else {
            None
        };

        if let Some(mel_power) = mel_power.as_deref().filter(|_| selection.mfcc) {
            let mfcc_frames = self.mfcc.from_mel_power(mel_power);
            values.extend(frame_mean(&mfcc_frames, self.config.n_mfcc));
        }

        if selection.chroma {
            let tuning = estimate_tuning(
                &magnitude.frames,
                sample_rate,
                self.config.n_fft,
                self.config.n_chroma,
            );
            log::debug!("[FeatureExtractor] Estimated tuning {:+.2} bins", tuning);
            let bank = ChromaFilterbank::new(
                sample_rate,
                self.config.n_fft,
                self.config.n_chroma,
                tuning,
            );
            let chroma_frames = bank.chromagram(&magnitude.frames);
            values.extend(frame_mean(&chroma_frames, self.config.n_chroma));
        }

        if let Some(mel_power) = mel_power.as_deref().filter(|_| selection.mel) {
            values.extend(frame_mean(mel_power, self.config.n_mels));
        }

        log::debug!(
            "[FeatureExtractor] {} frames -> {} values",
            magnitude.frame_count(),
            values.len()
        );

        FeatureVector { values, selection }
    }
}

/// Average a frames x rows matrix over frames
fn frame_mean(frames: &[Vec<f32>], rows: usize) -> Vec<f32> {
    let mut sums = vec![0.0f64; rows];
    for frame in frames {
        for (sum, &value) in sums.iter_mut().zip(frame) {
            *sum += value as f64;
        }
    }
    let count = frames.len().max(1) as f64;
    sums.into_iter().map(|sum| (sum / count) as f32).collect()
}
