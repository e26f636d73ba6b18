// FFT module - centered short-time Fourier transform
//
// Frames are windowed with a periodic Hann window and the signal is
// extended by n_fft / 2 on both sides (zeros or a mirror image), so frame t
// is centred on sample t * hop_length. Only the non-negative frequency bins
// are kept.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use crate::config::PadMode;

/// Magnitude spectrogram, one row per frame, `n_fft / 2 + 1` bins per row
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    pub frames: Vec<Vec<f32>>,
    pub n_bins: usize,
}

impl Spectrogram {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Squared magnitudes (power spectrogram)
    pub fn power(&self) -> Vec<Vec<f32>> {
        self.frames
            .iter()
            .map(|frame| frame.iter().map(|&mag| mag * mag).collect())
            .collect()
    }
}

/// STFT processor with a pre-planned forward FFT
pub struct StftProcessor {
    fft: Arc<dyn Fft<f32>>,
    n_fft: usize,
    hop_length: usize,
    pad_mode: PadMode,
    /// Periodic Hann window (pre-computed)
    window: Vec<f32>,
}

/// Sample at `idx` of the signal extended by `pad_mode`
///
/// Reflection repeats with period `2 * (len - 1)`, so pads longer than the
/// signal keep mirroring; a single sample is repeated.
fn padded_sample(signal: &[f32], idx: isize, pad_mode: PadMode) -> f32 {
    let len = signal.len() as isize;
    if (0..len).contains(&idx) {
        return signal[idx as usize];
    }
    match pad_mode {
        PadMode::Constant => 0.0,
        PadMode::Reflect => match len {
            0 => 0.0,
            1 => signal[0],
            _ => {
                let period = 2 * (len - 1);
                let folded = idx.rem_euclid(period);
                let mirrored = if folded >= len { period - folded } else { folded };
                signal[mirrored as usize]
            }
        },
    }
}

impl StftProcessor {
    /// Create a new STFT processor
    ///
    /// # Arguments
    /// * `n_fft` - FFT window size (2048 by default)
    /// * `hop_length` - Samples between frame centres (512 by default)
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        let window = (0..n_fft)
            .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / n_fft as f32).cos())
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);

        Self {
            fft,
            n_fft,
            hop_length: hop_length.max(1),
            pad_mode: PadMode::default(),
            window,
        }
    }

    pub fn with_pad_mode(mut self, pad_mode: PadMode) -> Self {
        self.pad_mode = pad_mode;
        self
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len / self.hop_length
    }

    /// Compute the magnitude spectrogram of a mono signal
    ///
    /// Always yields at least one frame, even for an empty signal.
    pub fn magnitude(&self, signal: &[f32]) -> Spectrogram {
        let pad = self.n_fft / 2;
        let n_bins = self.n_fft / 2 + 1;
        let n_frames = self.frame_count(signal.len());

        let sample_at = |padded_idx: usize| {
            padded_sample(signal, padded_idx as isize - pad as isize, self.pad_mode)
        };

        let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); self.n_fft];
        let mut frames = Vec::with_capacity(n_frames);

        for frame_idx in 0..n_frames {
            let start = frame_idx * self.hop_length;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(sample_at(start + i) * self.window[i], 0.0);
            }

            self.fft.process(&mut buffer);

            frames.push(buffer[..n_bins].iter().map(|c| c.norm()).collect());
        }

        Spectrogram { frames, n_bins }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sine_wave;

    #[test]
    fn test_reflect_padding_mirrors_without_edge() {
        let signal = [1.0, 2.0, 3.0];
        let left: Vec<f32> = (1..=5)
            .map(|i| padded_sample(&signal, -i, PadMode::Reflect))
            .collect();
        assert_eq!(left, vec![2.0, 3.0, 2.0, 1.0, 2.0]);
        let right: Vec<f32> = (3..=6)
            .map(|i| padded_sample(&signal, i, PadMode::Reflect))
            .collect();
        assert_eq!(right, vec![2.0, 1.0, 2.0, 3.0]);

        assert_eq!(padded_sample(&[4.0], -3, PadMode::Reflect), 4.0);
        assert_eq!(padded_sample(&[], 2, PadMode::Reflect), 0.0);
        assert_eq!(padded_sample(&signal, -1, PadMode::Constant), 0.0);
    }

    #[test]
    fn test_reflect_padding_changes_only_edge_frames() {
        let signal = sine_wave(22_050, 440.0, 8192, 0.5);
        let constant = StftProcessor::new(2048, 512).magnitude(&signal);
        let reflect = StftProcessor::new(2048, 512)
            .with_pad_mode(PadMode::Reflect)
            .magnitude(&signal);

        assert_eq!(constant.frame_count(), reflect.frame_count());
        assert_ne!(constant.frames[0], reflect.frames[0]);
        // Frame 2 starts at sample 0 of the signal
        assert_eq!(constant.frames[2], reflect.frames[2]);
    }

    #[test]
    fn test_frame_count_matches_centered_layout() {
        let stft = StftProcessor::new(2048, 512);
        assert_eq!(stft.frame_count(0), 1);
        assert_eq!(stft.frame_count(511), 1);
        assert_eq!(stft.frame_count(512), 2);
        assert_eq!(stft.frame_count(22_050 * 5), 1 + 22_050 * 5 / 512);
    }

    #[test]
    fn test_spectrogram_shape() {
        let stft = StftProcessor::new(1024, 256);
        let spec = stft.magnitude(&vec![0.1; 4096]);
        assert_eq!(spec.n_bins, 513);
        assert_eq!(spec.frame_count(), 17);
        assert!(spec.frames.iter().all(|frame| frame.len() == 513));
    }

    #[test]
    fn test_sine_peak_bin() {
        let sample_rate = 22_050;
        let stft = StftProcessor::new(2048, 512);
        // Bin 100 centre frequency
        let freq = 100.0 * sample_rate as f32 / 2048.0;
        let spec = stft.magnitude(&sine_wave(sample_rate, freq, 8192, 1.0));

        let middle = &spec.frames[spec.frame_count() / 2];
        let peak = middle
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 100);
    }

    #[test]
    fn test_silence_has_zero_magnitude() {
        let stft = StftProcessor::new(512, 128);
        let spec = stft.magnitude(&[0.0; 1000]);
        assert!(spec.frames.iter().flatten().all(|&m| m == 0.0));
    }

    #[test]
    fn test_power_is_squared_magnitude() {
        let spec = Spectrogram {
            frames: vec![vec![2.0, 0.5]],
            n_bins: 2,
        };
        assert_eq!(spec.power(), vec![vec![4.0, 0.25]]);
    }
}
