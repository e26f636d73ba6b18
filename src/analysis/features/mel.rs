// Mel module - Slaney mel scale and triangular filterbank
//
// The scale is linear below 1 kHz and logarithmic above it; each triangular
// filter is area-normalized (2 / bandwidth) so the filterbank has roughly
// constant energy per band.

/// Linear region slope: 200/3 Hz per mel
const F_SP: f64 = 200.0 / 3.0;
/// Start of the logarithmic region
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Convert frequency in Hz to Slaney mels
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Convert Slaney mels to frequency in Hz
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Mel filterbank matrix (`n_mels` rows x `n_fft / 2 + 1` columns)
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    filters: Vec<Vec<f32>>,
}

impl MelFilterbank {
    /// Build the filterbank
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `n_fft` - FFT size the spectrogram was computed with
    /// * `n_mels` - Number of mel bands
    /// * `fmin` / `fmax` - Frequency range covered by the bands
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, fmin: f64, fmax: f64) -> Self {
        let n_bins = n_fft / 2 + 1;
        let bin_hz = sample_rate as f64 / n_fft as f64;

        let min_mel = hz_to_mel(fmin);
        let max_mel = hz_to_mel(fmax);
        let edges: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(min_mel + (max_mel - min_mel) * i as f64 / (n_mels + 1) as f64))
            .collect();

        let filters = (0..n_mels)
            .map(|m| {
                let (lower, center, upper) = (edges[m], edges[m + 1], edges[m + 2]);
                let enorm = 2.0 / (upper - lower);
                (0..n_bins)
                    .map(|k| {
                        let freq = k as f64 * bin_hz;
                        let rising = (freq - lower) / (center - lower);
                        let falling = (upper - freq) / (upper - center);
                        (rising.min(falling).max(0.0) * enorm) as f32
                    })
                    .collect()
            })
            .collect();

        Self { filters }
    }

    /// Full-band filterbank, `fmin = 0`, `fmax = sample_rate / 2`
    pub fn full_band(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        Self::new(sample_rate, n_fft, n_mels, 0.0, sample_rate as f64 / 2.0)
    }

    pub fn n_mels(&self) -> usize {
        self.filters.len()
    }

    pub fn filters(&self) -> &[Vec<f32>] {
        &self.filters
    }

    /// Project one power-spectrum frame onto the mel bands
    pub fn apply(&self, power_frame: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|filter| {
                filter
                    .iter()
                    .zip(power_frame)
                    .map(|(&w, &p)| w * p)
                    .sum()
            })
            .collect()
    }

    /// Mel spectrogram from a power spectrogram
    pub fn spectrogram(&self, power: &[Vec<f32>]) -> Vec<Vec<f32>> {
        power.iter().map(|frame| self.apply(frame)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_region() {
        assert!((hz_to_mel(0.0)).abs() < 1e-12);
        assert!((hz_to_mel(200.0) - 3.0).abs() < 1e-9);
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_log_region_known_value() {
        // 6.4 kHz sits exactly 27 mels above the 1 kHz break point
        assert!((hz_to_mel(6400.0) - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_mel_hz_roundtrip() {
        for hz in [50.0, 440.0, 999.0, 1000.0, 4000.0, 11_025.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < 1e-6, "roundtrip failed for {} Hz", hz);
        }
    }

    #[test]
    fn test_filterbank_shape_and_sign() {
        let bank = MelFilterbank::full_band(22_050, 2048, 128);
        assert_eq!(bank.n_mels(), 128);
        for filter in bank.filters() {
            assert_eq!(filter.len(), 1025);
            assert!(filter.iter().all(|&w| w >= 0.0));
        }
    }

    #[test]
    fn test_high_bands_have_weights() {
        // Low bands may fall between FFT bins at this resolution; upper bands never do
        let bank = MelFilterbank::full_band(22_050, 2048, 128);
        for filter in &bank.filters()[40..] {
            assert!(filter.iter().sum::<f32>() > 0.0);
        }
    }

    #[test]
    fn test_apply_picks_band_of_tone() {
        let bank = MelFilterbank::full_band(16_000, 512, 40);
        let mut frame = vec![0.0f32; 257];
        frame[64] = 1.0; // 2 kHz

        let mel = bank.apply(&frame);
        let peak = mel
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        let hz = 2000.0;
        let mel_pos = hz_to_mel(hz);
        let max_mel = hz_to_mel(8000.0);
        let expected = (mel_pos / max_mel * 41.0).round() as usize - 1;
        assert!((peak as i64 - expected as i64).abs() <= 1, "peak {} vs {}", peak, expected);
    }
}
