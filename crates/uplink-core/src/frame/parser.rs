use tracing::{debug, trace};

use super::layout;
use super::reader::ByteCursor;
use crate::profile::{TagTable, TruncatedTagPolicy, UnknownTagPolicy};
use crate::{DecodedFrame, DecodedRecord, Termination};

/// Walk a raw frame against `table`.
///
/// Never fails: anomalies end the walk and are reported through
/// [`DecodedFrame::termination`], with every field decoded before the stop
/// kept in the record.
///
/// # Examples
/// ```
/// use uplink_core::frame::decode_frame;
/// use uplink_core::{FieldValue, ProfileRegistry, Termination};
///
/// let registry = ProfileRegistry::builtin();
/// let table = registry.get("EM310-UDL").unwrap().table();
///
/// let frame = decode_frame(&[0x04, 0x80, 0x2C, 0x01, 0x01, 0x75], table);
/// assert_eq!(frame.record.get("distance"), Some(&FieldValue::Unsigned(300)));
/// assert!(matches!(frame.termination, Termination::Truncated { .. }));
/// ```
pub fn decode_frame(bytes: &[u8], table: &TagTable) -> DecodedFrame {
    let mut cursor = ByteCursor::new(bytes);
    let mut record = DecodedRecord::new();
    let mut skipped_bytes = 0usize;
    trace!(len = bytes.len(), "decoding frame");

    let termination = loop {
        if cursor.remaining() == 0 {
            break Termination::Complete;
        }

        let tag = match cursor.peek_tag() {
            Ok(tag) => tag,
            Err(err) => {
                debug!(position = cursor.position(), %err, "dropping trailing byte");
                break Termination::TrailingByte;
            }
        };
        if cursor.advance(layout::TAG_LEN).is_err() {
            break Termination::TrailingByte;
        }

        let Some(spec) = table.lookup(tag) else {
            match table.on_unknown_tag() {
                UnknownTagPolicy::AbortFrame => {
                    debug!(%tag, position = cursor.position(), "unknown tag, aborting frame");
                    break Termination::UnknownTag { tag };
                }
                UnknownTagPolicy::SkipOneByte => {
                    skipped_bytes += layout::TAG_LEN;
                    if cursor.advance(layout::UNKNOWN_TAG_SKIP_LEN).is_ok() {
                        skipped_bytes += layout::UNKNOWN_TAG_SKIP_LEN;
                    }
                    trace!(%tag, position = cursor.position(), "skipping unknown tag");
                    continue;
                }
            }
        };

        let value = match cursor.advance(spec.width()) {
            Ok(value) => value,
            Err(err) => {
                debug!(%tag, field = spec.field(), %err, "field truncated");
                match table.on_truncated_tag() {
                    TruncatedTagPolicy::AbortFrame => break Termination::Truncated { tag },
                }
            }
        };
        // A spec's width is never below its rule's natural width, so a full
        // value slice always decodes.
        if let Some(value) = spec.decode(value) {
            record.insert(spec.field(), value);
        }
    };

    DecodedFrame {
        record,
        termination,
        skipped_bytes,
    }
}
