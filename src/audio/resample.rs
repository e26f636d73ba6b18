// Whole-buffer sample rate conversion using rubato

use log::debug;
use rubato::{FftFixedIn, Resampler};

use super::Waveform;
use crate::error::AudioError;

/// Input chunk size fed to the FFT resampler
const CHUNK_FRAMES: usize = 1024;

/// Resample a single channel from `from_rate` to `to_rate`
///
/// The output is trimmed of the resampler delay and has
/// `round(len * to_rate / from_rate)` samples.
pub fn resample_channel(
    samples: &[f32],
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>, AudioError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        CHUNK_FRAMES,
        2,
        1,
    )
    .map_err(|err| AudioError::ResampleFailed {
        reason: err.to_string(),
    })?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let mut output = Vec::with_capacity(expected + delay + CHUNK_FRAMES);

    let mut pos = 0;
    while pos + resampler.input_frames_next() <= samples.len() {
        let needed = resampler.input_frames_next();
        let input = [&samples[pos..pos + needed]];
        let chunk = resampler
            .process(&input[..], None)
            .map_err(resample_error)?;
        output.extend_from_slice(&chunk[0]);
        pos += needed;
    }

    if pos < samples.len() {
        let input = [&samples[pos..]];
        let chunk = resampler
            .process_partial(Some(&input[..]), None)
            .map_err(resample_error)?;
        output.extend_from_slice(&chunk[0]);
    }

    // Flush the delay line until enough output exists
    while output.len() < expected + delay {
        let chunk = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(resample_error)?;
        if chunk[0].is_empty() {
            break;
        }
        output.extend_from_slice(&chunk[0]);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);

    debug!(
        "[Resample] {} -> {} Hz: {} -> {} samples",
        from_rate,
        to_rate,
        samples.len(),
        output.len()
    );

    Ok(output)
}

/// Resample every channel of a waveform
pub fn resample(wave: &Waveform, to_rate: u32) -> Result<Waveform, AudioError> {
    if wave.sample_rate == to_rate {
        return Ok(wave.clone());
    }

    let planes = wave
        .deinterleave()
        .iter()
        .map(|plane| resample_channel(plane, wave.sample_rate, to_rate))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Waveform::from_planes(&planes, to_rate))
}

fn resample_error(err: rubato::ResampleError) -> AudioError {
    AudioError::ResampleFailed {
        reason: err.to_string(),
    }
}
