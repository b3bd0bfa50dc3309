use std::path::Path;

use super::{BITS_PER_SAMPLE, BLOCK_ALIGN, CHANNELS, SAMPLE_RATE};

/// Size of the canonical RIFF/WAVE header written by [`encode_wav`].
pub const HEADER_LEN: usize = 44;

/// Size of the PCM `fmt ` subchunk body.
const FMT_CHUNK_LEN: u32 = 16;

/// WAVE format tag for integer PCM.
const FORMAT_PCM: u16 = 1;

/// Bytes of the RIFF chunk that precede the data payload (everything after
/// the `ChunkSize` field up to and including the `data` size field).
const RIFF_OVERHEAD: u32 = 36;

/// An encoded WAV file held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavBlob {
    bytes: Vec<u8>,
}

impl WavBlob {
    /// MIME type to advertise when handing the blob to a file-save mechanism.
    pub const MIME_TYPE: &'static str = "audio/wav";

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Total length including the header.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length of the PCM payload following the header.
    pub fn data_len(&self) -> usize {
        self.bytes.len().saturating_sub(HEADER_LEN)
    }

    /// Write the blob to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)?;
        log::info!("Wrote {} byte WAV to {}", self.bytes.len(), path.display());
        Ok(())
    }
}

impl AsRef<[u8]> for WavBlob {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Build the 44-byte header for `data_len` bytes of mono 16-bit PCM at
/// [`SAMPLE_RATE`].
///
/// All multi-byte fields are little-endian. `ChunkSize` saturates at
/// `u32::MAX` instead of wrapping.
pub fn wav_header(data_len: u32) -> [u8; HEADER_LEN] {
    let byte_rate = SAMPLE_RATE * BLOCK_ALIGN as u32;
    let riff_size = RIFF_OVERHEAD.saturating_add(data_len);

    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&riff_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    header[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&SAMPLE_RATE.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&BLOCK_ALIGN.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());
    header
}

/// Wrap raw 16-bit mono PCM in a canonical WAV container.
///
/// The payload is copied unmodified after the header. Odd-length input is
/// accepted; the data size field is simply the byte count.
pub fn encode_wav(bytes: &[u8]) -> WavBlob {
    let data_len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);

    let mut out = Vec::with_capacity(HEADER_LEN + bytes.len());
    out.extend_from_slice(&wav_header(data_len));
    out.extend_from_slice(bytes);

    log::debug!("Encoded {} PCM bytes into WAV ({} bytes)", bytes.len(), out.len());
    WavBlob { bytes: out }
}

/// File name used when exporting a narration, e.g. `qiraa-narration-1700000000000.wav`.
pub fn export_file_name(epoch_millis: i64) -> String {
    format!("qiraa-narration-{epoch_millis}.wav")
}

#[cfg(test)]
mod tests {
    use super::{encode_wav, export_file_name, wav_header, WavBlob, HEADER_LEN};
    use crate::audio::SAMPLE_RATE;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn four_byte_payload_matches_reference_layout() {
        let wav = encode_wav(&[0x01, 0x02, 0x03, 0x04]);
        let bytes = wav.as_bytes();

        assert_eq!(bytes.len(), 48);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(bytes, 4), 40);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(bytes, 16), 16);
        assert_eq!(u16_at(bytes, 20), 1);
        assert_eq!(u16_at(bytes, 22), 1);
        assert_eq!(u32_at(bytes, 24), 24000);
        assert_eq!(u32_at(bytes, 28), 48000);
        assert_eq!(u16_at(bytes, 32), 2);
        assert_eq!(u16_at(bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(&bytes[40..44], &[0x04, 0x00, 0x00, 0x00]);
        assert_eq!(&bytes[44..], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn length_and_data_size_track_payload() {
        for len in [0usize, 1, 2, 3, 1000, 65_537] {
            let payload = vec![0xAB; len];
            let wav = encode_wav(&payload);
            assert_eq!(wav.len(), HEADER_LEN + len);
            assert_eq!(wav.data_len(), len);
            assert_eq!(u32_at(wav.as_bytes(), 40) as usize, len);
            assert_eq!(u32_at(wav.as_bytes(), 4) as usize, 36 + len);
        }
    }

    #[test]
    fn empty_payload_is_header_only() {
        let wav = encode_wav(&[]);
        assert_eq!(wav.as_bytes(), &wav_header(0)[..]);
    }

    #[test]
    fn header_size_saturates() {
        let header = wav_header(u32::MAX);
        assert_eq!(u32_at(&header, 4), u32::MAX);
        assert_eq!(u32_at(&header, 40), u32::MAX);
    }

    #[test]
    fn output_is_readable_by_hound() {
        let pcm: Vec<u8> = [0i16, 1000, -1000, i16::MAX, i16::MIN]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let wav = encode_wav(&pcm);

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav.into_bytes())).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 1000, -1000, i16::MAX, i16::MIN]);
    }

    #[test]
    fn writes_blob_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(export_file_name(1_700_000_000_000));
        let wav = encode_wav(&[0, 0, 1, 0]);
        wav.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), wav.as_bytes());
        assert!(path.ends_with("qiraa-narration-1700000000000.wav"));
    }

    #[test]
    fn advertises_wav_mime_type() {
        assert_eq!(WavBlob::MIME_TYPE, "audio/wav");
    }
}
