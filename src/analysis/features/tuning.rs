// Tuning module - deviation of the recording from A440, in fractional bins
//
// Spectral peaks between 150 Hz and 4 kHz are refined by parabolic
// interpolation. Peaks at least as strong as the median peak vote in a
// histogram of their offset from the nearest equal-tempered bin. The
// left edge of the fullest histogram bin is the tuning estimate.

use super::chroma::hz_to_octaves;

/// Lowest frequency considered by the pitch tracker
const PITCH_FMIN_HZ: f64 = 150.0;
/// Upper frequency bound (exclusive) of the pitch tracker
const PITCH_FMAX_HZ: f64 = 4000.0;
/// Peaks below this fraction of the frame maximum are ignored
const PEAK_THRESHOLD: f64 = 0.1;
/// Width of one histogram bin, in fractions of a chroma bin
const TUNING_RESOLUTION: f64 = 0.01;

/// One interpolated spectral peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchPeak {
    pub frame: usize,
    pub hz: f64,
    pub magnitude: f64,
}

/// Sub-bin offset of the parabola vertex through bins k-1, k, k+1
fn parabolic_shift(prev: f64, cur: f64, next: f64) -> f64 {
    let a = next + prev - 2.0 * cur;
    let b = (next - prev) / 2.0;
    if b.abs() >= a.abs() {
        0.0
    } else {
        -b / a
    }
}

/// Centered first difference, one-sided at the edges
fn gradient(frame: &[f64], k: usize) -> f64 {
    let n = frame.len();
    if n < 2 {
        0.0
    } else if k == 0 {
        frame[1] - frame[0]
    } else if k == n - 1 {
        frame[n - 1] - frame[n - 2]
    } else {
        (frame[k + 1] - frame[k - 1]) / 2.0
    }
}

/// Interpolated local maxima of a magnitude spectrogram
///
/// A bin is a peak when, after zeroing everything at or below 10% of the
/// frame maximum, it is strictly greater than the bin below and not less than
/// the bin above.
pub fn piptrack(magnitude: &[Vec<f32>], sample_rate: u32, n_fft: usize) -> Vec<PitchPeak> {
    let sr = sample_rate as f64;
    let fmax = PITCH_FMAX_HZ.min(sr / 2.0);
    let bin_hz = sr / n_fft as f64;

    let mut peaks = Vec::new();
    for (t, frame) in magnitude.iter().enumerate() {
        let frame: Vec<f64> = frame.iter().map(|&m| (m as f64).abs()).collect();
        let n = frame.len();
        if n == 0 {
            continue;
        }
        let reference = PEAK_THRESHOLD * frame.iter().cloned().fold(0.0, f64::max);
        let gated: Vec<f64> = frame
            .iter()
            .map(|&m| if m > reference { m } else { 0.0 })
            .collect();

        for k in 0..n {
            let hz = k as f64 * bin_hz;
            if hz < PITCH_FMIN_HZ || hz >= fmax {
                continue;
            }
            let below = if k == 0 { gated[0] } else { gated[k - 1] };
            let above = if k + 1 == n { gated[k] } else { gated[k + 1] };
            if !(gated[k] > below && gated[k] >= above) {
                continue;
            }

            let shift = if k == 0 || k + 1 == n {
                0.0
            } else {
                parabolic_shift(frame[k - 1], frame[k], frame[k + 1])
            };
            peaks.push(PitchPeak {
                frame: t,
                hz: (k as f64 + shift) * bin_hz,
                magnitude: frame[k] + 0.5 * gradient(&frame, k) * shift,
            });
        }
    }
    peaks
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Most common offset of `frequencies` from the equal-tempered grid
///
/// Returns a value in [-0.5, 0.5) in fractions of a bin, or 0.0 when no
/// positive frequency is given.
pub fn pitch_tuning(frequencies: &[f64], bins_per_octave: usize) -> f64 {
    let bpo = bins_per_octave as f64;
    let n_bins = (1.0 / TUNING_RESOLUTION).ceil() as usize;
    let edge = |k: usize| {
        if k == n_bins {
            0.5
        } else {
            k as f64 * (1.0 / n_bins as f64) - 0.5
        }
    };

    let mut counts = vec![0usize; n_bins];
    let mut any = false;
    for &hz in frequencies.iter().filter(|&&hz| hz > 0.0) {
        let mut residual = (bpo * hz_to_octaves(hz, 0.0, bins_per_octave)).rem_euclid(1.0);
        if residual >= 0.5 {
            residual -= 1.0;
        }
        if !residual.is_finite() {
            continue;
        }
        let mut idx = (((residual + 0.5) * n_bins as f64) as usize).min(n_bins - 1);
        if residual < edge(idx) && idx > 0 {
            idx -= 1;
        } else if idx + 1 < n_bins && residual >= edge(idx + 1) {
            idx += 1;
        }
        counts[idx] += 1;
        any = true;
    }

    if !any {
        return 0.0;
    }
    let mut best = 0;
    for (idx, &count) in counts.iter().enumerate().skip(1) {
        if count > counts[best] {
            best = idx;
        }
    }
    edge(best)
}

/// Tuning deviation of a magnitude spectrogram, in fractions of a bin
///
/// Silent or pitchless input yields 0.0 (A440).
pub fn estimate_tuning(
    magnitude: &[Vec<f32>],
    sample_rate: u32,
    n_fft: usize,
    bins_per_octave: usize,
) -> f64 {
    let peaks: Vec<PitchPeak> = piptrack(magnitude, sample_rate, n_fft)
        .into_iter()
        .filter(|peak| peak.hz > 0.0)
        .collect();
    if peaks.is_empty() {
        return 0.0;
    }

    let mut magnitudes: Vec<f64> = peaks.iter().map(|peak| peak.magnitude).collect();
    let threshold = median(&mut magnitudes);
    let frequencies: Vec<f64> = peaks
        .iter()
        .filter(|peak| peak.magnitude >= threshold)
        .map(|peak| peak.hz)
        .collect();

    pitch_tuning(&frequencies, bins_per_octave)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::features::StftProcessor;
    use crate::testing::sine_wave;

    #[test]
    fn test_parabolic_shift_finds_vertex() {
        // Samples of -(x - 0.25)^2 at x = -1, 0, 1
        let f = |x: f64| -(x - 0.25) * (x - 0.25);
        assert!((parabolic_shift(f(-1.0), f(0.0), f(1.0)) - 0.25).abs() < 1e-12);
        assert_eq!(parabolic_shift(1.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_in_tune_frequencies() {
        assert!(pitch_tuning(&[440.0, 880.0, 261.625_565], 12).abs() < 1e-9);
    }

    #[test]
    fn test_sharp_frequencies() {
        let sharp = 440.0 * 2f64.powf(0.305 / 12.0);
        let tuning = pitch_tuning(&[sharp, sharp * 2.0, sharp * 1.5], 12);
        // 1.5x is a just fifth, two cents sharp of equal temperament, and is outvoted
        assert!((tuning - 0.3).abs() < 1e-6, "{}", tuning);
    }

    #[test]
    fn test_flat_frequencies_are_negative() {
        let flat = 440.0 * 2f64.powf(-0.195 / 12.0);
        let tuning = pitch_tuning(&[flat, flat, flat * 2.0], 12);
        assert!((tuning + 0.2).abs() < 1e-6, "{}", tuning);
    }

    #[test]
    fn test_empty_input_is_in_tune() {
        assert_eq!(pitch_tuning(&[], 12), 0.0);
        assert_eq!(pitch_tuning(&[0.0, -3.0], 12), 0.0);
        assert_eq!(estimate_tuning(&vec![vec![0.0; 1025]; 4], 22_050, 2048, 12), 0.0);
    }

    #[test]
    fn test_sine_tuning_is_recovered() {
        let sample_rate = 22_050;
        let stft = StftProcessor::new(2048, 512);
        for cents in [0.0f64, 30.0, -25.0] {
            let hz = 440.0 * 2f64.powf(cents / 1200.0);
            let spec = stft.magnitude(&sine_wave(sample_rate, hz as f32, sample_rate as usize, 0.5));
            let tuning = estimate_tuning(&spec.frames, sample_rate, 2048, 12);
            assert!(
                (tuning - cents / 100.0).abs() <= 0.08,
                "{} cents estimated as {}",
                cents,
                tuning
            );
        }
    }

    #[test]
    fn test_piptrack_respects_band() {
        let mut frame = vec![0.0f32; 1025];
        // 100 Hz peak is below the band, 1 kHz peak is inside
        frame[9] = 1.0;
        frame[93] = 0.8;
        let peaks = piptrack(&[frame], 22_050, 2048);
        assert_eq!(peaks.len(), 1);
        assert!((peaks[0].hz - 93.0 * 22_050.0 / 2048.0).abs() < 1e-9);
    }
}
