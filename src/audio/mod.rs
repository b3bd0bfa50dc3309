//! Audio pipeline for narration payloads.
//!
//! The remote speech service returns raw PCM as a base64 string. This module
//! turns that payload into something playable or saveable:
//!
//! ```text
//! base64 ──decode_base64──▶ raw bytes ──decode_audio──▶ AudioBuffer (f32, playback)
//!                                     └──encode_wav────▶ WavBlob     (download)
//! ```
//!
//! # Format Contract
//!
//! | Property | Value |
//! |---|---|
//! | Encoding | signed 16-bit PCM, little-endian |
//! | Channels | 1 (mono) |
//! | Sample rate | 24000 Hz |
//!
//! The format is an agreement with the service, not something detected from
//! the bytes. Every function here is pure and allocates its own output.
//!
//! # Examples
//!
//! ```rust
//! use qiraa_rs::audio::{decode_audio, decode_base64, encode_wav, SAMPLE_RATE};
//!
//! let bytes = decode_base64("AID/fw==")?;
//! let buffer = decode_audio(&bytes, SAMPLE_RATE)?;
//! assert_eq!(buffer.len(), 2);
//!
//! let wav = encode_wav(&bytes);
//! assert_eq!(wav.len(), 44 + bytes.len());
//! # Ok::<(), qiraa_rs::audio::AudioError>(())
//! ```

pub mod base64;
pub mod pcm;
#[cfg(feature = "playback")]
pub mod player;
pub mod wav;

pub use self::base64::{decode_base64, encode_base64};
pub use pcm::{decode_audio, AudioBuffer};
#[cfg(feature = "playback")]
pub use player::{AudioOutput, Playback, PlaybackError};
pub use wav::{encode_wav, export_file_name, wav_header, WavBlob};

/// Sample rate shared by the speech service and playback.
pub const SAMPLE_RATE: u32 = 24000;

/// Number of interleaved channels in service audio.
pub const CHANNELS: u16 = 1;

/// Bit depth of service audio.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Bytes per sample frame (`CHANNELS * BITS_PER_SAMPLE / 8`).
pub const BLOCK_ALIGN: u16 = CHANNELS * (BITS_PER_SAMPLE / 8);

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("Invalid base64 audio payload: {0}")]
    Decode(#[from] ::base64::DecodeError),
    #[error("Malformed PCM audio: {len} bytes is not a whole number of 16-bit samples")]
    MalformedAudio { len: usize },
}
