//! Transport encoding of uplink payloads.
//!
//! Network servers record each frame as a base64 string. This module turns
//! that string back into bytes and keeps transport failures apart from
//! protocol ones: a payload that is not valid base64 never reaches the frame
//! walk.
//!
//! Decoding is lenient the way network-server exports need it to be: bytes
//! outside the base64 alphabet (line breaks, stray punctuation) are dropped
//! and non-zero trailing bits are accepted. Padding is still required.

pub mod error;

use base64::Engine;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use tracing::{debug, trace};

pub use error::TransportError;

const PAD: u8 = b'=';

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode a base64 payload into raw frame bytes.
///
/// Absent, empty and whitespace-only payloads mean "no reading" and yield
/// `Ok(None)`. Surrounding whitespace is ignored.
///
/// # Examples
/// ```
/// use uplink_core::transport::decode_base64;
///
/// assert_eq!(decode_base64(Some("BXEB")).unwrap(), Some(vec![0x05, 0x71, 0x01]));
/// assert_eq!(decode_base64(Some("")).unwrap(), None);
/// assert_eq!(decode_base64(None).unwrap(), None);
/// assert_eq!(decode_base64(Some("BXEB\n!")).unwrap(), Some(vec![0x05, 0x71, 0x01]));
/// assert!(decode_base64(Some("not base64!")).is_err());
/// ```
///
/// # Errors
/// Returns `TransportError::InvalidEncoding` when what remains after
/// dropping foreign bytes is not padded standard base64.
pub fn decode_base64(payload: Option<&str>) -> Result<Option<Vec<u8>>, TransportError> {
    let Some(payload) = payload.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    let cleaned = strip_foreign_bytes(payload);
    if cleaned.len() != payload.len() {
        trace!(
            dropped = payload.len() - cleaned.len(),
            "dropped bytes outside the base64 alphabet"
        );
    }
    match LENIENT.decode(&cleaned) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) => {
            debug!(%err, "payload is not valid base64");
            Err(TransportError::InvalidEncoding(err.to_string()))
        }
    }
}

/// Keep alphabet bytes and padding; stop after the first run of padding.
fn strip_foreign_bytes(payload: &str) -> Vec<u8> {
    let mut cleaned = Vec::with_capacity(payload.len());
    for byte in payload.bytes() {
        let is_data = byte.is_ascii_alphanumeric() || byte == b'+' || byte == b'/';
        if is_data && cleaned.last() == Some(&PAD) {
            break;
        }
        if is_data || byte == PAD {
            cleaned.push(byte);
        }
    }
    cleaned
}
