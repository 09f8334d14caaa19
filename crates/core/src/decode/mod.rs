//! Turning an uploaded payload into interleaved stereo samples.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hound::{SampleFormat, WavReader};
use serde::{Deserialize, Serialize};

use crate::{PlayLinkError, Result};

/// Value delivered by the upload source. `None` at the controller boundary
/// means no override has been chosen (or it was withdrawn).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub data_url: String,
}

impl Upload {
    pub fn new(data_url: impl Into<String>) -> Self {
        Self {
            data_url: data_url.into(),
        }
    }

    /// Builds a `data:audio/wav;base64,...` upload from raw bytes.
    pub fn from_wav_bytes(bytes: &[u8]) -> Self {
        Self::new(format!("data:audio/wav;base64,{}", BASE64.encode(bytes)))
    }

    /// Extracts the binary payload.
    pub fn payload(&self) -> Result<Vec<u8>> {
        parse_data_url(&self.data_url)
    }
}

/// Decodes the body of a base64 `data:` URL.
pub fn parse_data_url(url: &str) -> Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or(PlayLinkError::DataUrl("missing `data:` scheme"))?;
    let (header, body) = rest
        .split_once(',')
        .ok_or(PlayLinkError::DataUrl("missing `,` separator"))?;
    if !header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        return Err(PlayLinkError::DataUrl("payload is not base64 encoded"));
    }
    Ok(BASE64.decode(body.trim())?)
}

/// Result of decoding an upload: interleaved stereo samples at the
/// payload's native rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    /// Channel count of the source before stereo normalisation.
    pub channels: u16,
    /// `L R L R ...`, always two channels.
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    /// Number of `L R` sample pairs. Not the same unit as
    /// [`crate::Frame`], which groups `FRAME_SIZE` pairs.
    pub fn pair_count(&self) -> usize {
        self.samples.len() / 2
    }
}

/// Platform audio decoding capability. Opaque to the controller.
pub trait AudioDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio>;
}

/// Decoder for RIFF/WAVE payloads, integer or float PCM.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavDecoder;

impl AudioDecoder for WavDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio> {
        let reader = WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        let raw: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()?,
            SampleFormat::Int => {
                let max_val = (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        let samples = match spec.channels {
            1 => raw.iter().flat_map(|&s| [s, s]).collect(),
            2 => raw,
            other => return Err(PlayLinkError::UnsupportedChannels(other)),
        };

        Ok(DecodedAudio {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }
}

#[cfg(test)]
pub(crate) fn wav_bytes(channels: u16, sample_rate: u32, samples: &[f32]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_stereo_float_wav() {
        let bytes = wav_bytes(2, 48_000, &[0.5, -0.5, 0.25, -0.25]);
        let decoded = WavDecoder.decode(&bytes).unwrap();

        assert_eq!(decoded.sample_rate, 48_000);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.samples, vec![0.5, -0.5, 0.25, -0.25]);
        assert_eq!(decoded.pair_count(), 2);
    }

    #[test]
    fn duplicates_mono_into_both_channels() {
        let bytes = wav_bytes(1, 44_100, &[0.1, 0.2]);
        let decoded = WavDecoder.decode(&bytes).unwrap();

        assert_eq!(decoded.sample_rate, 44_100);
        assert_eq!(decoded.samples, vec![0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn decodes_integer_pcm() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(16_384_i16).unwrap();
            writer.write_sample(-32_768_i16).unwrap();
            writer.finalize().unwrap();
        }

        let decoded = WavDecoder.decode(&cursor.into_inner()).unwrap();
        assert_eq!(decoded.samples, vec![0.5, -1.0]);
    }

    #[test]
    fn rejects_surround_layouts() {
        let bytes = wav_bytes(3, 48_000, &[0.0; 6]);
        let err = WavDecoder.decode(&bytes).unwrap_err();
        assert!(matches!(err, PlayLinkError::UnsupportedChannels(3)));
    }

    #[test]
    fn rejects_garbage_payloads() {
        assert!(WavDecoder.decode(b"not a wav file").is_err());
    }

    #[test]
    fn round_trips_data_urls() {
        let upload = Upload::from_wav_bytes(&[1, 2, 3, 4]);
        assert!(upload.data_url.starts_with("data:audio/wav;base64,"));
        assert_eq!(upload.payload().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn rejects_non_base64_data_urls() {
        let err = parse_data_url("data:audio/wav,RIFF").unwrap_err();
        assert!(matches!(err, PlayLinkError::DataUrl(_)));

        let err = parse_data_url("https://example.com/clip.wav").unwrap_err();
        assert!(matches!(err, PlayLinkError::DataUrl(_)));
    }
}
