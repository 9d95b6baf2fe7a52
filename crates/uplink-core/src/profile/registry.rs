use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::builtin;
use super::error::{EncodeError, ProfileError};
use super::table::{TagTable, TruncatedTagPolicy, UnknownTagPolicy};
use super::tag::TagSpec;
use crate::frame::decode_frame;
use crate::{DecodeOutcome, DecodedFrame, FieldValue};

/// A named device family: its tag table and anomaly policies.
///
/// Profiles are immutable once built and hold no per-frame state, so one
/// instance can serve any number of concurrent decodes.
///
/// # Examples
/// ```
/// use uplink_core::{FieldValue, ProfileRegistry};
///
/// let registry = ProfileRegistry::builtin();
/// let profile = registry.get("EM500-CO2").unwrap();
/// let frame = profile.decode(&[0x01, 0x75, 0x64, 0x03, 0x67, 0xC9, 0xFF]);
/// assert_eq!(frame.record.get("battery"), Some(&FieldValue::Unsigned(100)));
/// assert_eq!(frame.record.get("temperature"), Some(&FieldValue::Decimal(-5.5)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProfileConfig", into = "ProfileConfig")]
pub struct DeviceProfile {
    name: String,
    table: TagTable,
}

impl DeviceProfile {
    pub fn new(name: impl Into<String>, table: TagTable) -> Result<Self, ProfileError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        Ok(Self { name, table })
    }

    pub(crate) fn fixed(name: &'static str, table: TagTable) -> Self {
        Self {
            name: name.to_string(),
            table,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &TagTable {
        &self.table
    }

    /// Decode raw frame bytes with this profile's table.
    pub fn decode(&self, bytes: &[u8]) -> DecodedFrame {
        decode_frame(bytes, &self.table)
    }

    /// Decode a base64 payload; see [`crate::decode_payload`].
    pub fn decode_payload(&self, payload: Option<&str>) -> DecodeOutcome {
        crate::decode::decode_payload(self, payload)
    }

    /// Frame bytes carrying `fields` in the given order.
    ///
    /// # Examples
    /// ```
    /// use uplink_core::{FieldValue, ProfileRegistry, TiltStatus};
    ///
    /// let registry = ProfileRegistry::builtin();
    /// let profile = registry.get("EM310-UDL").unwrap();
    /// let bytes = profile
    ///     .encode_fields([("status", FieldValue::Status(TiltStatus::Tilt))])
    ///     .unwrap();
    /// assert_eq!(bytes, vec![0x05, 0x71, 0x01]);
    /// ```
    pub fn encode_fields<'f>(
        &self,
        fields: impl IntoIterator<Item = (&'f str, FieldValue)>,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = Vec::new();
        for (field, value) in fields {
            let spec = self
                .table
                .spec_for_field(field)
                .ok_or_else(|| EncodeError::UnknownField {
                    field: field.to_string(),
                })?;
            bytes.extend(spec.encode(&value)?);
        }
        Ok(bytes)
    }
}

/// Serialized shape of a [`DeviceProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub name: String,
    pub on_unknown_tag: UnknownTagPolicy,
    #[serde(default)]
    pub on_truncated_tag: TruncatedTagPolicy,
    pub tags: Vec<TagSpec>,
}

impl TryFrom<ProfileConfig> for DeviceProfile {
    type Error = ProfileError;

    fn try_from(config: ProfileConfig) -> Result<Self, Self::Error> {
        let table = TagTable::new(config.on_unknown_tag, config.tags)?
            .with_truncated_policy(config.on_truncated_tag);
        DeviceProfile::new(config.name, table)
    }
}

impl From<DeviceProfile> for ProfileConfig {
    fn from(profile: DeviceProfile) -> Self {
        Self {
            on_unknown_tag: profile.table.on_unknown_tag(),
            on_truncated_tag: profile.table.on_truncated_tag(),
            tags: profile.table.specs().cloned().collect(),
            name: profile.name,
        }
    }
}

/// A set of profiles as read from (or written to) JSON configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub profiles: Vec<DeviceProfile>,
}

impl RegistryConfig {
    /// Parse and validate a JSON profile document.
    ///
    /// # Errors
    /// Returns `ProfileError::Config` for malformed JSON and for any
    /// profile or tag that fails validation.
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Immutable name → profile lookup, built once at startup.
///
/// Profiles only enter through [`builtin`](Self::builtin) and
/// [`with_config`](Self::with_config); a built registry cannot grow.
///
/// ```compile_fail
/// use uplink_core::ProfileRegistry;
///
/// let extra = ProfileRegistry::builtin().get("EM500-CO2").unwrap().clone();
/// let mut registry = ProfileRegistry::new();
/// registry.insert(extra).unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, DeviceProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in families (`EM500-CO2`, `EM310-UDL`).
    pub fn builtin() -> Self {
        Self {
            profiles: builtin::all()
                .into_iter()
                .map(|profile| (profile.name().to_string(), profile))
                .collect(),
        }
    }

    /// Built-in families extended with configured ones.
    ///
    /// A configured profile may not reuse a name already registered.
    pub fn with_config(config: RegistryConfig) -> Result<Self, ProfileError> {
        let mut registry = Self::builtin();
        for profile in config.profiles {
            registry.insert(profile)?;
        }
        Ok(registry)
    }

    fn insert(&mut self, profile: DeviceProfile) -> Result<(), ProfileError> {
        if self.profiles.contains_key(profile.name()) {
            return Err(ProfileError::DuplicateProfile {
                name: profile.name().to_string(),
            });
        }
        self.profiles.insert(profile.name().to_string(), profile);
        Ok(())
    }

    /// Look up a profile by exact name.
    ///
    /// # Errors
    /// Returns `ProfileError::UnknownProfile` (listing the registered names)
    /// when no profile has that name.
    pub fn get(&self, name: &str) -> Result<&DeviceProfile, ProfileError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ProfileError::UnknownProfile {
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &DeviceProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn to_config(&self) -> RegistryConfig {
        RegistryConfig {
            profiles: self.profiles.values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeviceProfile, ProfileRegistry, RegistryConfig};
    use crate::profile::builtin::{EM310_UDL, EM500_CO2};
    use crate::profile::error::{EncodeError, ProfileError};
    use crate::profile::table::{TagTable, UnknownTagPolicy};
    use crate::profile::tag::{DecodeRule, Tag, TagSpec};
    use crate::{FieldValue, TiltStatus};

    const EM300_TH: &str = r#"{
        "profiles": [
            {
                "name": "EM300-TH",
                "on_unknown_tag": "abort_frame",
                "tags": [
                    { "channel": 1, "type": 117, "field": "battery", "rule": "raw_u8" },
                    { "channel": 3, "type": 103, "field": "temperature", "rule": "i16_scaled_0_1" },
                    { "channel": 4, "type": 104, "field": "humidity", "rule": "raw_u8", "width": 1 }
                ]
            }
        ]
    }"#;

    #[test]
    fn builtin_registry_has_both_families() {
        let registry = ProfileRegistry::builtin();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec![EM310_UDL, EM500_CO2]);
        assert!(registry.get(EM500_CO2).is_ok());
        assert!(registry.get(EM310_UDL).is_ok());
    }

    #[test]
    fn unknown_profile_lists_available_names() {
        let registry = ProfileRegistry::builtin();
        let err = registry.get("EM999").unwrap_err();
        assert!(err.to_string().contains("unknown device profile `EM999`"));
        match err {
            ProfileError::UnknownProfile { available, .. } => {
                assert_eq!(available, vec![EM310_UDL.to_string(), EM500_CO2.to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn profile_names_are_case_sensitive() {
        let registry = ProfileRegistry::builtin();
        assert!(registry.get("em500-co2").is_err());
    }

    #[test]
    fn configured_profiles_extend_builtins() {
        let config = RegistryConfig::from_json(EM300_TH).unwrap();
        let registry = ProfileRegistry::with_config(config).unwrap();
        assert_eq!(registry.len(), 3);

        let profile = registry.get("EM300-TH").unwrap();
        assert_eq!(profile.table().on_unknown_tag(), UnknownTagPolicy::AbortFrame);
        let frame = profile.decode(&[0x04, 0x68, 0x41]);
        assert_eq!(frame.record.get("humidity"), Some(&FieldValue::Unsigned(65)));
    }

    #[test]
    fn configured_profile_cannot_shadow_builtin() {
        let json = r#"{"profiles": [{"name": "EM310-UDL", "on_unknown_tag": "skip_one_byte", "tags": []}]}"#;
        let config = RegistryConfig::from_json(json).unwrap();
        let err = ProfileRegistry::with_config(config).unwrap_err();
        assert!(matches!(err, ProfileError::DuplicateProfile { .. }));
    }

    #[test]
    fn config_rejects_duplicate_tags() {
        let json = r#"{"profiles": [{
            "name": "X",
            "on_unknown_tag": "abort_frame",
            "tags": [
                { "channel": 1, "type": 117, "field": "a", "rule": "raw_u8" },
                { "channel": 1, "type": 117, "field": "b", "rule": "raw_u8" }
            ]
        }]}"#;
        let err = RegistryConfig::from_json(json).unwrap_err();
        assert!(matches!(err, ProfileError::Config(_)));
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn config_rejects_empty_name_and_bad_json() {
        let json = r#"{"profiles": [{"name": " ", "on_unknown_tag": "abort_frame", "tags": []}]}"#;
        assert!(RegistryConfig::from_json(json).is_err());
        assert!(RegistryConfig::from_json("{not json").is_err());
        let json = r#"{"profiles": [{"name": "X", "on_unknown_tag": "skip_two_bytes", "tags": []}]}"#;
        assert!(RegistryConfig::from_json(json).is_err());
    }

    #[test]
    fn profiles_round_trip_through_json() {
        let registry = ProfileRegistry::builtin();
        let json = serde_json::to_string(&registry.to_config()).unwrap();
        let config = RegistryConfig::from_json(&json).unwrap();
        let reloaded = config.profiles;
        let original = registry.profiles().cloned().collect::<Vec<_>>();
        assert_eq!(reloaded, original);
    }

    #[test]
    fn encode_fields_follows_argument_order() {
        let registry = ProfileRegistry::builtin();
        let profile = registry.get(EM310_UDL).unwrap();
        let bytes = profile
            .encode_fields([
                ("distance", FieldValue::Unsigned(300)),
                ("status", FieldValue::Status(TiltStatus::Normal)),
            ])
            .unwrap();
        assert_eq!(bytes, vec![0x04, 0x80, 0x2C, 0x01, 0x05, 0x71, 0x00]);
    }

    #[test]
    fn encode_fields_rejects_unknown_field() {
        let registry = ProfileRegistry::builtin();
        let profile = registry.get(EM310_UDL).unwrap();
        let err = profile
            .encode_fields([("co2", FieldValue::Unsigned(400))])
            .unwrap_err();
        assert!(matches!(err, EncodeError::UnknownField { .. }));
    }

    #[test]
    fn new_profile_requires_name() {
        let table = TagTable::new(
            UnknownTagPolicy::AbortFrame,
            [TagSpec::new(Tag::new(0x01, 0x75), "battery", DecodeRule::RawU8).unwrap()],
        )
        .unwrap();
        assert!(matches!(
            DeviceProfile::new("", table.clone()),
            Err(ProfileError::EmptyName)
        ));
        assert!(DeviceProfile::new("custom", table).is_ok());
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProfileRegistry>();
        assert_send_sync::<DeviceProfile>();
    }
}
