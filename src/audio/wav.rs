// Canonical WAV container: 16-bit PCM written with hound, any PCM read back

use std::io::{Cursor, Seek, Write};
use std::path::Path;

use super::Waveform;
use crate::error::{AudioError, ExtractionError};

/// Bit depth of canonical clips
pub const CANONICAL_BITS_PER_SAMPLE: u16 = 16;

const PCM16_SCALE: f32 = 32_768.0;

/// Write a waveform as 16-bit PCM WAV
///
/// Samples are scaled by 2^15 like `read_wav` divides, so 16-bit input
/// survives a read/write cycle unchanged.
pub fn write_wav<W: Write + Seek>(writer: W, wave: &Waveform) -> Result<(), AudioError> {
    let spec = hound::WavSpec {
        channels: wave.channels,
        sample_rate: wave.sample_rate,
        bits_per_sample: CANONICAL_BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::new(writer, spec)?;
    for &sample in &wave.samples {
        writer.write_sample(quantize_i16(sample))?;
    }
    writer.finalize()?;
    Ok(())
}

fn quantize_i16(sample: f32) -> i16 {
    (sample * PCM16_SCALE)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Encode a waveform into an in-memory WAV file
pub fn encode_wav_bytes(wave: &Waveform) -> Result<Vec<u8>, AudioError> {
    let mut cursor = Cursor::new(Vec::new());
    write_wav(&mut cursor, wave)?;
    Ok(cursor.into_inner())
}

/// Read a PCM WAV file into a waveform
///
/// Integer samples are scaled by 2^(bits-1) so full-scale 16-bit audio maps
/// to [-1.0, 1.0). 8/16/24/32-bit integer and 32-bit float files are
/// accepted.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Waveform, ExtractionError> {
    let reader = hound::WavReader::open(path.as_ref())?;
    read_from(reader)
}

fn read_from<R: std::io::Read>(mut reader: hound::WavReader<R>) -> Result<Waveform, ExtractionError> {
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(ExtractionError::UnsupportedSampleFormat {
                    bits_per_sample: spec.bits_per_sample,
                });
            }
            reader
                .samples::<f32>()
                .collect::<Result<Vec<f32>, hound::Error>>()?
        }
        hound::SampleFormat::Int => match spec.bits_per_sample {
            8 | 16 | 24 | 32 => {
                let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / scale))
                    .collect::<Result<Vec<f32>, hound::Error>>()?
            }
            other => {
                return Err(ExtractionError::UnsupportedSampleFormat {
                    bits_per_sample: other,
                })
            }
        },
    };

    Ok(Waveform::new(samples, spec.channels, spec.sample_rate))
}
