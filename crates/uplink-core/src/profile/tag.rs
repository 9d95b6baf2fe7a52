use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{EncodeError, ProfileError};
use crate::{FieldValue, TiltStatus};

/// The (channel, type) pair at the front of every frame segment.
///
/// # Examples
/// ```
/// use uplink_core::Tag;
///
/// let tag = Tag::new(0x03, 0x67);
/// assert_eq!(tag.to_bytes(), [0x03, 0x67]);
/// assert_eq!(tag.to_string(), "03:67");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    pub channel: u8,
    #[serde(rename = "type")]
    pub kind: u8,
}

impl Tag {
    pub const fn new(channel: u8, kind: u8) -> Self {
        Self { channel, kind }
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        [self.channel, self.kind]
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}:{:02x}", self.channel, self.kind)
    }
}

/// How the value bytes of a segment turn into a [`FieldValue`].
///
/// Multi-byte rules are little-endian and read the leading bytes of the
/// value; any extra bytes of a wider field are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecodeRule {
    /// One unsigned byte.
    #[serde(rename = "raw_u8")]
    RawU8,
    /// Signed 16-bit integer in tenths (`-55` reads as `-5.5`).
    #[serde(rename = "i16_scaled_0_1")]
    I16ScaledTenth,
    /// Unsigned 16-bit integer, unscaled.
    #[serde(rename = "u16_raw")]
    U16Raw,
    /// One byte, `1` is tilt and anything else is normal.
    #[serde(rename = "bool_status")]
    BoolStatus,
}

impl DecodeRule {
    /// Bytes the rule reads; a field may be declared wider, never narrower.
    pub const fn natural_width(self) -> usize {
        match self {
            DecodeRule::RawU8 | DecodeRule::BoolStatus => 1,
            DecodeRule::I16ScaledTenth | DecodeRule::U16Raw => 2,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DecodeRule::RawU8 => "raw_u8",
            DecodeRule::I16ScaledTenth => "i16_scaled_0_1",
            DecodeRule::U16Raw => "u16_raw",
            DecodeRule::BoolStatus => "bool_status",
        }
    }

    /// Decode a value, returning `None` when fewer than
    /// [`natural_width`](Self::natural_width) bytes are given.
    ///
    /// # Examples
    /// ```
    /// use uplink_core::{DecodeRule, FieldValue};
    ///
    /// let value = DecodeRule::I16ScaledTenth.decode(&[0xC9, 0xFF]);
    /// assert_eq!(value, Some(FieldValue::Decimal(-5.5)));
    /// assert_eq!(DecodeRule::U16Raw.decode(&[0x01]), None);
    /// ```
    pub fn decode(self, bytes: &[u8]) -> Option<FieldValue> {
        match self {
            DecodeRule::RawU8 => bytes.first().map(|b| FieldValue::Unsigned(u64::from(*b))),
            DecodeRule::I16ScaledTenth => {
                le_i16(bytes).map(|raw| FieldValue::Decimal(f64::from(raw) / 10.0))
            }
            DecodeRule::U16Raw => le_u16(bytes).map(|raw| FieldValue::Unsigned(u64::from(raw))),
            DecodeRule::BoolStatus => bytes.first().map(|b| {
                FieldValue::Status(if *b == 1 {
                    TiltStatus::Tilt
                } else {
                    TiltStatus::Normal
                })
            }),
        }
    }

    /// Produce the natural-width bytes for `value`.
    pub fn encode(self, value: &FieldValue) -> Result<Vec<u8>, EncodeError> {
        let wrong_kind = || EncodeError::WrongValueKind {
            rule: self,
            value: value.to_string(),
        };
        let out_of_range = || EncodeError::OutOfRange {
            rule: self,
            value: value.to_string(),
        };
        match (self, value) {
            (DecodeRule::RawU8, FieldValue::Unsigned(v)) => {
                let byte = u8::try_from(*v).map_err(|_| out_of_range())?;
                Ok(vec![byte])
            }
            (DecodeRule::U16Raw, FieldValue::Unsigned(v)) => {
                let raw = u16::try_from(*v).map_err(|_| out_of_range())?;
                Ok(raw.to_le_bytes().to_vec())
            }
            (DecodeRule::I16ScaledTenth, FieldValue::Decimal(v)) => {
                let tenths = (v * 10.0).round();
                if !tenths.is_finite()
                    || tenths < f64::from(i16::MIN)
                    || tenths > f64::from(i16::MAX)
                {
                    return Err(out_of_range());
                }
                Ok((tenths as i16).to_le_bytes().to_vec())
            }
            (DecodeRule::BoolStatus, FieldValue::Status(status)) => Ok(vec![match status {
                TiltStatus::Tilt => 1,
                TiltStatus::Normal => 0,
            }]),
            _ => Err(wrong_kind()),
        }
    }
}

impl fmt::Display for DecodeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn le_u16(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

fn le_i16(bytes: &[u8]) -> Option<i16> {
    match bytes {
        [lo, hi, ..] => Some(i16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

/// One recognised tag: where its value goes and how wide it is.
///
/// Deserialization goes through validation, so a `TagSpec` always has a
/// field name and a width the rule can read.
///
/// # Examples
/// ```
/// use uplink_core::{DecodeRule, Tag, TagSpec};
///
/// let spec = TagSpec::new(Tag::new(0x04, 0x80), "distance", DecodeRule::U16Raw).unwrap();
/// assert_eq!(spec.width(), 2);
///
/// let padded = spec.with_width(4).unwrap();
/// assert_eq!(padded.width(), 4);
/// assert!(TagSpec::new(Tag::new(0x04, 0x80), "", DecodeRule::U16Raw).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TagSpecConfig")]
pub struct TagSpec {
    #[serde(flatten)]
    tag: Tag,
    field: String,
    rule: DecodeRule,
    width: usize,
}

impl TagSpec {
    /// Widest value a field may declare; a LoRaWAN frame never carries more.
    pub const MAX_WIDTH: usize = u8::MAX as usize;

    pub fn new(tag: Tag, field: impl Into<String>, rule: DecodeRule) -> Result<Self, ProfileError> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(ProfileError::EmptyField { tag });
        }
        Ok(Self {
            tag,
            field,
            rule,
            width: rule.natural_width(),
        })
    }

    /// Infallible constructor for the built-in tables, whose field names are
    /// fixed and non-empty.
    pub(crate) fn fixed(tag: Tag, field: &'static str, rule: DecodeRule) -> Self {
        Self {
            tag,
            field: field.to_string(),
            rule,
            width: rule.natural_width(),
        }
    }

    /// Declare a wider field; the trailing bytes are consumed and ignored.
    pub fn with_width(mut self, width: usize) -> Result<Self, ProfileError> {
        let min = self.rule.natural_width();
        if width < min {
            return Err(ProfileError::WidthTooSmall {
                tag: self.tag,
                rule: self.rule,
                width,
                min,
            });
        }
        if width > Self::MAX_WIDTH {
            return Err(ProfileError::WidthTooLarge {
                tag: self.tag,
                width,
                max: Self::MAX_WIDTH,
            });
        }
        self.width = width;
        Ok(self)
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn rule(&self) -> DecodeRule {
        self.rule
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Decode the value bytes of this segment.
    pub fn decode(&self, value: &[u8]) -> Option<FieldValue> {
        self.rule.decode(value)
    }

    /// Full segment bytes (tag, value, zero padding up to the width).
    pub fn encode(&self, value: &FieldValue) -> Result<Vec<u8>, EncodeError> {
        let mut segment = Vec::with_capacity(2 + self.width);
        segment.extend_from_slice(&self.tag.to_bytes());
        segment.extend(self.rule.encode(value)?);
        segment.resize(2 + self.width, 0);
        Ok(segment)
    }
}

#[derive(Debug, Deserialize)]
struct TagSpecConfig {
    #[serde(flatten)]
    tag: Tag,
    field: String,
    rule: DecodeRule,
    #[serde(default)]
    width: Option<usize>,
}

impl TryFrom<TagSpecConfig> for TagSpec {
    type Error = ProfileError;

    fn try_from(config: TagSpecConfig) -> Result<Self, Self::Error> {
        let spec = TagSpec::new(config.tag, config.field, config.rule)?;
        match config.width {
            Some(width) => spec.with_width(width),
            None => Ok(spec),
        }
    }
}
