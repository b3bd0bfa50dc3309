use std::time::Duration;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::{decode_audio, decode_base64, AudioBuffer, AudioError, SAMPLE_RATE};

#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("Failed to open audio output device: {0}")]
    Device(#[from] rodio::StreamError),
    #[error("Refusing to play an empty audio buffer")]
    EmptyBuffer,
    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Owned handle to the default audio output device.
///
/// The device stream is opened on the first [`play`](Self::play) and kept for
/// the lifetime of the handle. Every call creates its own sink, so overlapping
/// plays mix together rather than interrupting each other.
#[derive(Default)]
pub struct AudioOutput {
    stream: Option<OutputStream>,
}

impl AudioOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the output device has been opened.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&OutputStream, PlaybackError> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => {
                let mut stream = OutputStreamBuilder::open_default_stream()?;
                stream.log_on_drop(false);
                log::info!("Opened default audio output stream");
                stream
            }
        };
        Ok(self.stream.insert(stream))
    }

    /// Start playing `buffer` and return a handle to the new playback.
    pub fn play(&mut self, buffer: &AudioBuffer) -> Result<Playback, PlaybackError> {
        if buffer.is_empty() {
            return Err(PlaybackError::EmptyBuffer);
        }

        let stream = self.stream()?;
        let sink = Sink::connect_new(stream.mixer());
        sink.append(SamplesBuffer::new(
            buffer.channels,
            buffer.sample_rate,
            buffer.samples.clone(),
        ));
        sink.play();

        log::debug!(
            "Started playback of {:.2}s ({} samples)",
            buffer.duration_secs(),
            buffer.len()
        );
        Ok(Playback {
            sink,
            duration: Duration::from_secs_f64(buffer.duration_secs()),
        })
    }

    /// Decode a base64 service payload and play it.
    pub fn play_base64(&mut self, payload: &str) -> Result<Playback, PlaybackError> {
        let bytes = decode_base64(payload)?;
        let buffer = decode_audio(&bytes, SAMPLE_RATE)?;
        self.play(&buffer)
    }
}

/// A single in-flight playback.
///
/// Dropping the handle stops the sound; call [`detach`](Self::detach) to let
/// it run to completion in the background.
pub struct Playback {
    sink: Sink,
    duration: Duration,
}

impl Playback {
    /// Length of the queued audio.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_finished(&self) -> bool {
        self.sink.empty()
    }

    /// Block until the audio has finished playing.
    pub fn wait(&self) {
        self.sink.sleep_until_end();
    }

    pub fn stop(&self) {
        self.sink.stop();
    }

    pub fn detach(self) {
        self.sink.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::{AudioOutput, PlaybackError};
    use crate::audio::{AudioBuffer, AudioError, SAMPLE_RATE};

    #[test]
    fn empty_buffer_is_rejected_without_opening_device() {
        let mut output = AudioOutput::new();
        let buffer = AudioBuffer {
            samples: Vec::new(),
            sample_rate: SAMPLE_RATE,
            channels: 1,
        };
        assert!(matches!(output.play(&buffer), Err(PlaybackError::EmptyBuffer)));
        assert!(!output.is_open());
    }

    #[test]
    fn bad_payload_fails_before_touching_device() {
        let mut output = AudioOutput::new();
        let err = output.play_base64("not base64!").err().unwrap();
        assert!(matches!(err, PlaybackError::Audio(AudioError::Decode(_))));

        // "AQID" decodes to three bytes: odd length.
        let err = output.play_base64("AQID").err().unwrap();
        assert!(matches!(
            err,
            PlaybackError::Audio(AudioError::MalformedAudio { len: 3 })
        ));
        assert!(!output.is_open());
    }
}
