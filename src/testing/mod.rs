//! Deterministic PCM fixtures for unit, integration and CLI tests.
//!
//! Test clips are synthesized rather than checked in, so every fixture is
//! reproducible bit for bit from its parameters.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use crate::audio::{wav, Waveform};

/// Pure sine tone
pub fn sine_wave(sample_rate: u32, frequency: f32, frames: usize, amplitude: f32) -> Vec<f32> {
    (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Sum of harmonics with a slow amplitude envelope, closer to voiced speech than a pure tone
pub fn voiced_tone(sample_rate: u32, fundamental: f32, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let envelope = 0.5 + 0.5 * (2.0 * PI * 3.0 * t).sin().abs();
            let voice: f32 = (1..=5)
                .map(|h| (2.0 * PI * fundamental * h as f32 * t).sin() / h as f32)
                .sum();
            0.3 * envelope * voice
        })
        .collect()
}

/// Encode interleaved samples as a 16-bit PCM WAV in memory
pub fn wav_bytes(samples: &[f32], channels: u16, sample_rate: u32) -> Vec<u8> {
    let wave = Waveform::new(samples.to_vec(), channels, sample_rate);
    wav::encode_wav_bytes(&wave).expect("in-memory WAV encoding")
}

/// Write interleaved samples as a 16-bit PCM WAV file and return its path
pub fn write_wav_file<P: AsRef<Path>>(
    path: P,
    samples: &[f32],
    channels: u16,
    sample_rate: u32,
) -> PathBuf {
    let path = path.as_ref().to_path_buf();
    std::fs::write(&path, wav_bytes(samples, channels, sample_rate)).expect("fixture WAV write");
    path
}
