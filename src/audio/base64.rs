use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use super::AudioError;

/// Standard alphabet, canonical padding, unused bits of the last symbol ignored.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode a standard-alphabet base64 string into raw bytes.
///
/// Padding must be canonical. Characters outside the alphabet, misplaced `=`
/// or a truncated final quantum are reported as [`AudioError::Decode`]; the
/// input is never partially decoded. Non-zero unused bits in the final
/// symbol are ignored, so `"AR=="` decodes to `[0x01]`.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, AudioError> {
    let bytes = PAYLOAD_ENGINE.decode(input)?;
    log::trace!("Decoded {} base64 chars into {} bytes", input.len(), bytes.len());
    Ok(bytes)
}

/// Encode raw bytes as padded standard-alphabet base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    PAYLOAD_ENGINE.encode(bytes)
}
