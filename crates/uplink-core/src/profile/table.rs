use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ProfileError;
use super::tag::{Tag, TagSpec};

/// What the frame walk does when it meets a tag the table does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownTagPolicy {
    /// Stop and keep the fields decoded so far.
    AbortFrame,
    /// Step over the tag and one more byte, then retry.
    SkipOneByte,
}

/// What the frame walk does when a known field runs past the end.
///
/// Every observed family stops; the enum exists so the choice is explicit
/// in configuration and in the walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncatedTagPolicy {
    #[default]
    AbortFrame,
}

/// Tag lookup table for one device family, plus its anomaly policies.
///
/// Tags are unique within a table; construction rejects duplicates.
///
/// # Examples
/// ```
/// use uplink_core::{DecodeRule, Tag, TagSpec, TagTable, UnknownTagPolicy};
///
/// let table = TagTable::new(
///     UnknownTagPolicy::AbortFrame,
///     [TagSpec::new(Tag::new(0x01, 0x75), "battery", DecodeRule::RawU8).unwrap()],
/// )
/// .unwrap();
/// assert_eq!(table.lookup(Tag::new(0x01, 0x75)).unwrap().field(), "battery");
/// assert!(table.lookup(Tag::new(0x09, 0x99)).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTable {
    specs: BTreeMap<Tag, TagSpec>,
    on_unknown_tag: UnknownTagPolicy,
    on_truncated_tag: TruncatedTagPolicy,
}

impl TagTable {
    pub fn new(
        on_unknown_tag: UnknownTagPolicy,
        specs: impl IntoIterator<Item = TagSpec>,
    ) -> Result<Self, ProfileError> {
        let mut table = Self {
            specs: BTreeMap::new(),
            on_unknown_tag,
            on_truncated_tag: TruncatedTagPolicy::default(),
        };
        for spec in specs {
            table.insert(spec)?;
        }
        Ok(table)
    }

    /// Table for the built-in families; their tags are distinct by
    /// construction.
    pub(crate) fn fixed(on_unknown_tag: UnknownTagPolicy, specs: Vec<TagSpec>) -> Self {
        Self {
            specs: specs.into_iter().map(|spec| (spec.tag(), spec)).collect(),
            on_unknown_tag,
            on_truncated_tag: TruncatedTagPolicy::default(),
        }
    }

    pub fn with_truncated_policy(mut self, policy: TruncatedTagPolicy) -> Self {
        self.on_truncated_tag = policy;
        self
    }

    fn insert(&mut self, spec: TagSpec) -> Result<(), ProfileError> {
        if let Some(existing) = self.specs.get(&spec.tag()) {
            return Err(ProfileError::DuplicateTag {
                tag: spec.tag(),
                first: existing.field().to_string(),
                second: spec.field().to_string(),
            });
        }
        self.specs.insert(spec.tag(), spec);
        Ok(())
    }

    pub fn lookup(&self, tag: Tag) -> Option<&TagSpec> {
        self.specs.get(&tag)
    }

    /// First entry writing to `field`, in tag order.
    pub fn spec_for_field(&self, field: &str) -> Option<&TagSpec> {
        self.specs.values().find(|spec| spec.field() == field)
    }

    pub fn on_unknown_tag(&self) -> UnknownTagPolicy {
        self.on_unknown_tag
    }

    pub fn on_truncated_tag(&self) -> TruncatedTagPolicy {
        self.on_truncated_tag
    }

    /// Specs in tag order.
    pub fn specs(&self) -> impl Iterator<Item = &TagSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{TagTable, TruncatedTagPolicy, UnknownTagPolicy};
    use crate::profile::error::ProfileError;
    use crate::profile::tag::{DecodeRule, Tag, TagSpec};

    fn spec(channel: u8, kind: u8, field: &str, rule: DecodeRule) -> TagSpec {
        TagSpec::new(Tag::new(channel, kind), field, rule).unwrap()
    }

    #[test]
    fn rejects_duplicate_tags() {
        let err = TagTable::new(
            UnknownTagPolicy::AbortFrame,
            [
                spec(0x01, 0x75, "battery", DecodeRule::RawU8),
                spec(0x01, 0x75, "battery_again", DecodeRule::RawU8),
            ],
        )
        .unwrap_err();
        match err {
            ProfileError::DuplicateTag { tag, first, second } => {
                assert_eq!(tag, Tag::new(0x01, 0x75));
                assert_eq!(first, "battery");
                assert_eq!(second, "battery_again");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_channel_different_type_is_distinct() {
        let table = TagTable::new(
            UnknownTagPolicy::SkipOneByte,
            [
                spec(0x03, 0x67, "temperature", DecodeRule::I16ScaledTenth),
                spec(0x03, 0x68, "humidity", DecodeRule::RawU8),
            ],
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup(Tag::new(0x03, 0x68)).unwrap().field(),
            "humidity"
        );
    }

    #[test]
    fn truncated_policy_defaults_to_abort() {
        let table = TagTable::new(UnknownTagPolicy::SkipOneByte, Vec::<TagSpec>::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.on_truncated_tag(), TruncatedTagPolicy::AbortFrame);
        assert_eq!(table.on_unknown_tag(), UnknownTagPolicy::SkipOneByte);
    }

    #[test]
    fn spec_for_field_finds_by_name() {
        let table = TagTable::new(
            UnknownTagPolicy::AbortFrame,
            [
                spec(0x04, 0x80, "distance", DecodeRule::U16Raw),
                spec(0x05, 0x71, "status", DecodeRule::BoolStatus),
            ],
        )
        .unwrap();
        assert_eq!(
            table.spec_for_field("status").unwrap().tag(),
            Tag::new(0x05, 0x71)
        );
        assert!(table.spec_for_field("co2").is_none());
    }

    #[test]
    fn policies_use_snake_case_names() {
        assert_eq!(
            serde_json::to_value(UnknownTagPolicy::SkipOneByte).unwrap(),
            "skip_one_byte"
        );
        assert_eq!(
            serde_json::from_str::<UnknownTagPolicy>("\"abort_frame\"").unwrap(),
            UnknownTagPolicy::AbortFrame
        );
    }
}
