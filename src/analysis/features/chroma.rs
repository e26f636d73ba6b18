// Chroma module - pitch-class filterbank over STFT magnitudes
//
// Each FFT bin is mapped to a fractional pitch class (A440 shifted by the
// estimated tuning) and
// spread over the 12 chroma rows with a Gaussian whose width follows the
// local bin spacing. Columns are L2-normalized, weighted by a Gaussian over
// octaves centred at octave 5, and rolled so row 0 is C.

/// Octave the weighting window is centred on
const CENTER_OCTAVE: f64 = 5.0;
/// Gaussian half-width of the octave weighting, in octaves
const OCTAVE_WIDTH: f64 = 2.0;
/// Concert pitch before tuning correction
const A440_HZ: f64 = 440.0;

/// Frequency in Hz to (fractional) octave number, A0 = A440 / 16
///
/// `tuning` shifts the reference by fractions of a bin at `bins_per_octave`.
pub fn hz_to_octaves(hz: f64, tuning: f64, bins_per_octave: usize) -> f64 {
    let a440 = A440_HZ * 2f64.powf(tuning / bins_per_octave as f64);
    (hz / (a440 / 16.0)).log2()
}

/// Chroma filterbank matrix (`n_chroma` rows x `n_fft / 2 + 1` columns)
#[derive(Debug, Clone)]
pub struct ChromaFilterbank {
    filters: Vec<Vec<f32>>,
}

impl ChromaFilterbank {
    /// `tuning` is the deviation from A440 in fractions of a chroma bin
    pub fn new(sample_rate: u32, n_fft: usize, n_chroma: usize, tuning: f64) -> Self {
        let n_chroma_f = n_chroma as f64;

        // Fractional pitch-class position of every bin except DC; DC gets a
        // synthetic position 1.5 octaves below bin 1
        let mut positions = Vec::with_capacity(n_fft);
        for k in 1..n_fft {
            let hz = k as f64 * sample_rate as f64 / n_fft as f64;
            positions.push(n_chroma_f * hz_to_octaves(hz, tuning, n_chroma));
        }
        positions.insert(0, positions[0] - 1.5 * n_chroma_f);

        let mut bin_widths: Vec<f64> = positions
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).max(1.0))
            .collect();
        bin_widths.push(1.0);

        let half = (n_chroma_f / 2.0).round();
        let mut weights = vec![vec![0.0f64; n_fft]; n_chroma];
        for (c, row) in weights.iter_mut().enumerate() {
            for (k, weight) in row.iter_mut().enumerate() {
                let distance =
                    (positions[k] - c as f64 + half + 10.0 * n_chroma_f).rem_euclid(n_chroma_f)
                        - half;
                *weight = (-0.5 * (2.0 * distance / bin_widths[k]).powi(2)).exp();
            }
        }

        for k in 0..n_fft {
            let norm = weights.iter().map(|row| row[k] * row[k]).sum::<f64>().sqrt();
            let octave_weight = (-0.5
                * ((positions[k] / n_chroma_f - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2))
            .exp();
            for row in weights.iter_mut() {
                if norm > f64::MIN_POSITIVE {
                    row[k] /= norm;
                }
                row[k] *= octave_weight;
            }
        }

        // Rotate so that row 0 is C rather than A
        let shift = 3 * (n_chroma / 12);
        let n_bins = n_fft / 2 + 1;
        let filters = (0..n_chroma)
            .map(|c| {
                weights[(c + shift) % n_chroma][..n_bins]
                    .iter()
                    .map(|&w| w as f32)
                    .collect()
            })
            .collect();

        Self { filters }
    }

    pub fn n_chroma(&self) -> usize {
        self.filters.len()
    }

    /// Chroma energies for one magnitude frame, normalized so the largest is 1
    ///
    /// Frames with no energy stay all-zero.
    pub fn apply(&self, magnitude_frame: &[f32]) -> Vec<f32> {
        let mut chroma: Vec<f32> = self
            .filters
            .iter()
            .map(|filter| {
                filter
                    .iter()
                    .zip(magnitude_frame)
                    .map(|(&w, &m)| w * m)
                    .sum()
            })
            .collect();

        let peak = chroma.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()));
        if peak > f32::MIN_POSITIVE {
            for value in chroma.iter_mut() {
                *value /= peak;
            }
        }
        chroma
    }

    /// Chromagram from a magnitude spectrogram
    pub fn chromagram(&self, magnitude: &[Vec<f32>]) -> Vec<Vec<f32>> {
        magnitude.iter().map(|frame| self.apply(frame)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak_class(bank: &ChromaFilterbank, sample_rate: u32, n_fft: usize, hz: f64) -> usize {
        let mut frame = vec![0.0f32; n_fft / 2 + 1];
        let bin = (hz * n_fft as f64 / sample_rate as f64).round() as usize;
        frame[bin] = 1.0;
        let chroma = bank.apply(&frame);
        chroma
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_octaves_reference() {
        assert!((hz_to_octaves(440.0, 0.0, 12) - 4.0).abs() < 1e-12);
        assert!((hz_to_octaves(880.0, 0.0, 12) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_tuning_shifts_reference() {
        // Half a bin sharp: 440 Hz now sits half a semitone below the new A
        let a = 440.0 * 2f64.powf(0.5 / 12.0);
        assert!((hz_to_octaves(a, 0.5, 12) - 4.0).abs() < 1e-12);
        assert!((12.0 * hz_to_octaves(440.0, 0.5, 12) - 47.5).abs() < 1e-9);
    }

    #[test]
    fn test_sharp_tone_with_tuning_stays_on_its_class() {
        let n_fft = 16_384;
        let hz = 440.0 * 2f64.powf(0.3 / 12.0);
        let tuned = ChromaFilterbank::new(22_050, n_fft, 12, 0.3);
        let untuned = ChromaFilterbank::new(22_050, n_fft, 12, 0.0);
        assert_eq!(peak_class(&tuned, 22_050, n_fft, hz), 9);

        let spill = |bank: &ChromaFilterbank| {
            let mut frame = vec![0.0f32; n_fft / 2 + 1];
            frame[(hz * n_fft as f64 / 22_050.0).round() as usize] = 1.0;
            bank.apply(&frame)[10]
        };
        assert!(spill(&tuned) < spill(&untuned));
    }

    #[test]
    fn test_shape() {
        let bank = ChromaFilterbank::new(22_050, 2048, 12, 0.0);
        assert_eq!(bank.n_chroma(), 12);
        assert!(bank.filters.iter().all(|row| row.len() == 1025));
    }

    #[test]
    fn test_a440_maps_to_pitch_class_a() {
        // High resolution so the tone lands close to a bin centre
        let n_fft = 16_384;
        let bank = ChromaFilterbank::new(22_050, n_fft, 12, 0.0);
        assert_eq!(peak_class(&bank, 22_050, n_fft, 440.0), 9);
    }

    #[test]
    fn test_middle_c_maps_to_pitch_class_c() {
        let n_fft = 16_384;
        let bank = ChromaFilterbank::new(22_050, n_fft, 12, 0.0);
        assert_eq!(peak_class(&bank, 22_050, n_fft, 261.63), 0);
    }

    #[test]
    fn test_frame_is_max_normalized() {
        let bank = ChromaFilterbank::new(22_050, 2048, 12, 0.0);
        let frame: Vec<f32> = (0..1025).map(|k| 1.0 / (1.0 + k as f32)).collect();
        let chroma = bank.apply(&frame);
        let max = chroma.iter().cloned().fold(f32::MIN, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(chroma.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_silent_frame_stays_zero() {
        let bank = ChromaFilterbank::new(22_050, 2048, 12, 0.0);
        let chroma = bank.apply(&vec![0.0; 1025]);
        assert!(chroma.iter().all(|&v| v == 0.0));
    }
}
