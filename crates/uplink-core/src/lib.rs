//! Uplink core library: decoding of LoRaWAN sensor payloads.
//!
//! A network server records every uplink as a base64 string. This crate
//! turns one such string into typed sensor readings: the transport layer
//! strips base64, then the frame walk reads channel-tagged segments against
//! the tag table of a caller-selected device profile. Everything is pure and
//! synchronous; nothing here reads files or talks to a network.
//!
//! Invariants:
//! - Malformed frames never fail: the walk stops and the fields decoded so
//!   far are returned, along with the reason it stopped.
//! - Only configuration errors (an unknown profile name, an invalid profile
//!   definition) are reported as `Err`.
//! - Records are deterministic: the same input always yields the same
//!   record, serialized with stable key order.
//!
//! Version française (résumé):
//! Cette crate décode les trames LoRaWAN encodées en base64 : la couche
//! `transport` retire le base64, puis `frame` parcourt les segments
//! (canal, type) selon la table du profil choisi. Les trames mal formées
//! donnent un enregistrement partiel ; seules les erreurs de configuration
//! remontent comme `Err`.
//!
//! # Examples
//! ```
//! use uplink_core::{FieldValue, ProfileRegistry, decode_with_registry};
//!
//! let registry = ProfileRegistry::builtin();
//! let outcome = decode_with_registry(&registry, "EM500-CO2", Some("AXVkA2fJ/w=="))?;
//! let record = outcome.into_record();
//! assert_eq!(record.get("battery"), Some(&FieldValue::Unsigned(100)));
//! assert_eq!(record.get("temperature"), Some(&FieldValue::Decimal(-5.5)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

mod decode;
pub mod frame;
pub mod profile;
pub mod transport;

pub use decode::{DecodeError, decode_payload, decode_with_registry};
pub use profile::{
    DecodeRule, DeviceProfile, EM310_UDL, EM500_CO2, EncodeError, ProfileConfig, ProfileError,
    ProfileRegistry, RegistryConfig, Tag, TagSpec, TagTable, TruncatedTagPolicy,
    UnknownTagPolicy,
};
pub use transport::TransportError;

/// Tilt state reported by `bool_status` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TiltStatus {
    Normal,
    Tilt,
}

impl TiltStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            TiltStatus::Normal => "normal",
            TiltStatus::Tilt => "tilt",
        }
    }
}

/// A decoded sensor reading.
///
/// Serializes as a bare JSON number or string.
///
/// # Examples
/// ```
/// use uplink_core::{FieldValue, TiltStatus};
///
/// assert_eq!(serde_json::to_string(&FieldValue::Unsigned(420)).unwrap(), "420");
/// assert_eq!(serde_json::to_string(&FieldValue::Decimal(-5.5)).unwrap(), "-5.5");
/// assert_eq!(
///     serde_json::to_string(&FieldValue::Status(TiltStatus::Tilt)).unwrap(),
///     "\"tilt\""
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Raw unsigned reading (battery %, ppm, mm).
    Unsigned(u64),
    /// Scaled reading (°C).
    Decimal(f64),
    Status(TiltStatus),
}

impl FieldValue {
    /// Numeric view of the value; `None` for statuses.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Unsigned(v) => Some(*v as f64),
            FieldValue::Decimal(v) => Some(*v),
            FieldValue::Status(_) => None,
        }
    }

    pub fn as_status(&self) -> Option<TiltStatus> {
        match self {
            FieldValue::Status(status) => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(v) => write!(f, "{v}"),
            FieldValue::Decimal(v) => write!(f, "{v}"),
            FieldValue::Status(status) => f.write_str(status.as_str()),
        }
    }
}

/// Field name → value for one frame.
///
/// Fields whose tag never appeared (or appeared after the walk stopped) are
/// absent. Keys serialize in sorted order.
///
/// # Examples
/// ```
/// use uplink_core::{DecodedRecord, FieldValue};
///
/// let mut record = DecodedRecord::new();
/// record.insert("battery", FieldValue::Unsigned(80));
/// record.insert("battery", FieldValue::Unsigned(79));
/// assert_eq!(record.len(), 1);
/// assert_eq!(record.get("battery"), Some(&FieldValue::Unsigned(79)));
/// assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"battery":79}"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl DecodedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning the value it replaced.
    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(field.into(), value)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for DecodedRecord {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Why the frame walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// Every byte was consumed.
    Complete,
    /// The payload was absent or empty; nothing was walked.
    NoPayload,
    /// One byte was left, too short for a tag, and was dropped.
    TrailingByte,
    /// A known tag's value ran past the end of the frame.
    Truncated { tag: Tag },
    /// An unknown tag stopped a profile that aborts on unknown tags.
    UnknownTag { tag: Tag },
}

impl Termination {
    /// True when the frame bytes themselves were malformed.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Termination::Truncated { .. } | Termination::UnknownTag { .. }
        )
    }
}

/// Record decoded from one frame, with the walk's stop reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedFrame {
    pub record: DecodedRecord,
    pub termination: Termination,
    /// Bytes stepped over as unrecognised under the lenient policy.
    pub skipped_bytes: usize,
}

impl DecodedFrame {
    pub fn empty() -> Self {
        Self {
            record: DecodedRecord::new(),
            termination: Termination::NoPayload,
            skipped_bytes: 0,
        }
    }
}

/// Result of decoding one payload string.
///
/// Transport failures and protocol anomalies are both values, not errors:
/// an invalid payload is treated as a missing reading.
///
/// # Examples
/// ```
/// use uplink_core::{DecodeOutcome, ProfileRegistry};
///
/// let registry = ProfileRegistry::builtin();
/// let profile = registry.get("EM310-UDL").unwrap();
///
/// let outcome = profile.decode_payload(Some("AXVkA"));
/// assert!(matches!(outcome, DecodeOutcome::InvalidEncoding { .. }));
/// assert!(outcome.into_record().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DecodeOutcome {
    Decoded(DecodedFrame),
    InvalidEncoding { reason: String },
}

impl DecodeOutcome {
    /// The decoded record, `None` for invalid transport encoding.
    pub fn record(&self) -> Option<&DecodedRecord> {
        match self {
            DecodeOutcome::Decoded(frame) => Some(&frame.record),
            DecodeOutcome::InvalidEncoding { .. } => None,
        }
    }

    /// The decoded record; empty for invalid transport encoding.
    pub fn into_record(self) -> DecodedRecord {
        match self {
            DecodeOutcome::Decoded(frame) => frame.record,
            DecodeOutcome::InvalidEncoding { .. } => DecodedRecord::new(),
        }
    }

    pub fn is_invalid_encoding(&self) -> bool {
        matches!(self, DecodeOutcome::InvalidEncoding { .. })
    }

    /// True for invalid encoding or malformed protocol bytes.
    pub fn is_malformed(&self) -> bool {
        match self {
            DecodeOutcome::Decoded(frame) => frame.termination.is_malformed(),
            DecodeOutcome::InvalidEncoding { .. } => true,
        }
    }
}
