// Decode arbitrary uploads to interleaved f32 PCM using symphonia

use std::io::Cursor;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::Waveform;
use crate::error::AudioError;

/// Decode an in-memory audio file of any supported container
///
/// # Arguments
/// * `bytes` - Raw upload contents
/// * `extension` - Optional file extension used as a probe hint (e.g. "wav")
///
/// # Returns
/// Interleaved samples with the source channel count and sample rate
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<Waveform, AudioError> {
    if bytes.is_empty() {
        return Err(AudioError::EmptyStream);
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| AudioError::UnsupportedFormat {
            reason: err.to_string(),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::NoAudioTrack)?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|err| AudioError::UnsupportedFormat {
            reason: err.to_string(),
        })?;

    let mut samples = Vec::new();
    let mut channels = codec_params.channels.map(|c| c.count() as u16);
    let mut sample_rate = codec_params.sample_rate;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(err) => {
                return Err(AudioError::DecodeFailed {
                    reason: err.to_string(),
                })
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                // Corrupt packet: skip it and keep the rest of the stream
                warn!("[Decode] Skipping undecodable packet: {}", reason);
                continue;
            }
            Err(err) => {
                return Err(AudioError::DecodeFailed {
                    reason: err.to_string(),
                })
            }
        };

        let spec = *decoded.spec();
        channels.get_or_insert(spec.channels.count() as u16);
        sample_rate.get_or_insert(spec.rate);

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buffer.samples());
    }

    if samples.is_empty() {
        return Err(AudioError::EmptyStream);
    }

    let sample_rate = sample_rate.ok_or_else(|| AudioError::DecodeFailed {
        reason: "sample rate not specified".to_string(),
    })?;
    let channels = channels.unwrap_or(1);

    debug!(
        "[Decode] {} samples, {} channel(s) at {} Hz",
        samples.len(),
        channels,
        sample_rate
    );

    Ok(Waveform::new(samples, channels, sample_rate))
}
