//! Owned mono PCM16 audio handed to one identification call.

use std::io::{Cursor, Read};
use std::path::Path;

use hound::{SampleFormat, WavReader};

use crate::VoiceprintError;

/// Default sample rate of recorded commands (16 kHz mono).
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;

/// One utterance worth of mono PCM16 audio.
///
/// Every event carries its own sample, so concurrent identifications never
/// share a buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSample {
    sample_rate: u32,
    samples: Vec<i16>,
}

impl AudioSample {
    /// Wraps already decoded mono samples.
    pub fn new(sample_rate: u32, samples: Vec<i16>) -> Self {
        Self { sample_rate, samples }
    }

    /// Decodes PCM16 signed little-endian mono bytes. A trailing odd byte is ignored.
    pub fn from_pcm16_le(sample_rate: u32, bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        Self { sample_rate, samples }
    }

    /// Reads a WAV file, down-mixing to mono and converting to 16-bit.
    pub fn read_wav(path: impl AsRef<Path>) -> Result<Self, VoiceprintError> {
        let path = path.as_ref();
        let reader = WavReader::open(path)
            .map_err(|e| VoiceprintError::Audio(format!("{}: {e}", path.display())))?;
        Self::decode(reader)
    }

    /// Decodes an in-memory WAV container.
    pub fn from_wav_bytes(data: &[u8]) -> Result<Self, VoiceprintError> {
        Self::decode(WavReader::new(Cursor::new(data))?)
    }

    fn decode<R: Read>(mut reader: WavReader<R>) -> Result<Self, VoiceprintError> {
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<i16> = match spec.sample_format {
            SampleFormat::Int => {
                let bits = spec.bits_per_sample as u32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| rescale_int(v, bits)))
                    .collect::<Result<_, _>>()?
            }
            SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
                .collect::<Result<_, _>>()?,
        };

        let samples = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / frame.len() as i32) as i16
                })
                .collect()
        };

        Ok(Self {
            sample_rate: spec.sample_rate,
            samples,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

fn rescale_int(v: i32, bits: u32) -> i16 {
    match bits {
        0..=15 => (v << (16 - bits)) as i16,
        16 => v as i16,
        _ => (v >> (bits - 16)) as i16,
    }
}
