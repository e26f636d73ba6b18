// MFCC module - cepstral coefficients from a mel power spectrogram
//
// Mel power is converted to decibels (floor 1e-10, clipped to 80 dB below
// the loudest cell of the whole spectrogram), then each frame is projected
// on an orthonormal DCT-II basis and the leading coefficients are kept.

use std::f64::consts::PI;

/// Smallest power considered before taking the logarithm
const AMIN: f32 = 1e-10;
/// Dynamic range kept below the spectrogram maximum
const TOP_DB: f32 = 80.0;

/// Convert a power spectrogram to decibels (reference power 1.0)
///
/// Values more than 80 dB below the global maximum are raised to that floor.
pub fn power_to_db(power: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let mut db: Vec<Vec<f32>> = power
        .iter()
        .map(|frame| frame.iter().map(|&p| 10.0 * p.max(AMIN).log10()).collect())
        .collect();

    let peak = db
        .iter()
        .flatten()
        .fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    if peak.is_finite() {
        let floor = peak - TOP_DB;
        for value in db.iter_mut().flatten() {
            *value = value.max(floor);
        }
    }
    db
}

/// DCT-II projection of log-mel frames
#[derive(Debug, Clone)]
pub struct MfccProcessor {
    /// `n_mfcc` rows x `n_mels` columns
    basis: Vec<Vec<f32>>,
}

impl MfccProcessor {
    pub fn new(n_mfcc: usize, n_mels: usize) -> Self {
        let n = n_mels as f64;
        let basis = (0..n_mfcc)
            .map(|k| {
                let scale = if k == 0 {
                    (1.0 / n).sqrt()
                } else {
                    (2.0 / n).sqrt()
                };
                (0..n_mels)
                    .map(|m| {
                        (scale * (PI * k as f64 * (2.0 * m as f64 + 1.0) / (2.0 * n)).cos()) as f32
                    })
                    .collect()
            })
            .collect();

        Self { basis }
    }

    pub fn n_mfcc(&self) -> usize {
        self.basis.len()
    }

    /// Coefficients for a single log-mel frame
    pub fn apply(&self, log_mel_frame: &[f32]) -> Vec<f32> {
        self.basis
            .iter()
            .map(|row| row.iter().zip(log_mel_frame).map(|(&b, &x)| b * x).sum())
            .collect()
    }

    /// MFCC frames from a mel power spectrogram
    pub fn from_mel_power(&self, mel_power: &[Vec<f32>]) -> Vec<Vec<f32>> {
        power_to_db(mel_power)
            .iter()
            .map(|frame| self.apply(frame))
            .collect()
    }
}
