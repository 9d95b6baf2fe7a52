use thiserror::Error;
use tracing::trace;

use crate::profile::{DeviceProfile, ProfileError, ProfileRegistry};
use crate::transport::{TransportError, decode_base64};
use crate::{DecodeOutcome, DecodedFrame};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Decode one base64 payload with `profile`.
///
/// An absent or empty payload yields an empty record without running the
/// frame walk; a payload that is not base64 yields
/// [`DecodeOutcome::InvalidEncoding`].
///
/// # Examples
/// ```
/// use uplink_core::{ProfileRegistry, Termination, DecodeOutcome, decode_payload};
///
/// let registry = ProfileRegistry::builtin();
/// let profile = registry.get("EM310-UDL").unwrap();
/// match decode_payload(profile, None) {
///     DecodeOutcome::Decoded(frame) => {
///         assert!(frame.record.is_empty());
///         assert_eq!(frame.termination, Termination::NoPayload);
///     }
///     other => panic!("unexpected outcome: {other:?}"),
/// }
/// ```
pub fn decode_payload(profile: &DeviceProfile, payload: Option<&str>) -> DecodeOutcome {
    match decode_base64(payload) {
        Ok(Some(bytes)) => {
            trace!(profile = profile.name(), len = bytes.len(), "decoding payload");
            DecodeOutcome::Decoded(profile.decode(&bytes))
        }
        Ok(None) => DecodeOutcome::Decoded(DecodedFrame::empty()),
        Err(TransportError::InvalidEncoding(reason)) => DecodeOutcome::InvalidEncoding { reason },
    }
}

/// Look up `profile` by name, then decode `payload` with it.
///
/// # Errors
/// Returns `DecodeError::Profile` when no profile has that name; nothing is
/// decoded in that case.
pub fn decode_with_registry(
    registry: &ProfileRegistry,
    profile: &str,
    payload: Option<&str>,
) -> Result<DecodeOutcome, DecodeError> {
    let profile = registry.get(profile)?;
    Ok(decode_payload(profile, payload))
}
