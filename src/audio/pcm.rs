use std::path::Path;

use super::{AudioError, CHANNELS};

/// Divisor mapping the `i16` range onto roughly `[-1.0, 1.0)`.
const I16_SCALE: f32 = 32768.0;

/// A decoded, playable block of audio.
///
/// Contains normalized f32 samples, the channel count and the sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Normalized samples in `[-1.0, 1.0]`, interleaved if `channels > 1`
    pub samples: Vec<f32>,
    /// Sample rate of the audio (24000 for the speech service)
    pub sample_rate: u32,
    /// Number of channels (always 1 for service audio)
    pub channels: u16,
}

impl AudioBuffer {
    /// Number of samples in the buffer.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Write the normalized samples to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), hound::Error> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }
}

/// Interpret raw bytes as 16-bit little-endian mono PCM.
///
/// Sample `i` is built from bytes `2i` (low) and `2i + 1` (high) and scaled by
/// `1 / 32768`. An odd byte count is rejected with
/// [`AudioError::MalformedAudio`] rather than dropping the trailing byte.
pub fn decode_audio(bytes: &[u8], sample_rate: u32) -> Result<AudioBuffer, AudioError> {
    if bytes.len() % 2 != 0 {
        return Err(AudioError::MalformedAudio { len: bytes.len() });
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / I16_SCALE)
        .collect();

    let buffer = AudioBuffer {
        samples,
        sample_rate,
        channels: CHANNELS,
    };
    log::debug!(
        "Decoded {} PCM bytes into {} samples ({:.2}s @ {}Hz)",
        bytes.len(),
        buffer.len(),
        buffer.duration_secs(),
        sample_rate
    );
    Ok(buffer)
}
