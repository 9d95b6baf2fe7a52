//! Built-in device families.
//!
//! Tag values come from the Milesight uplink format used by the EM500 and
//! EM310 series. Both families share the battery and temperature channels;
//! they differ in the remaining tags and in how they treat unknown tags.

use super::registry::DeviceProfile;
use super::table::{TagTable, UnknownTagPolicy};
use super::tag::{DecodeRule, Tag, TagSpec};

pub const EM500_CO2: &str = "EM500-CO2";
pub const EM310_UDL: &str = "EM310-UDL";

pub const TAG_BATTERY: Tag = Tag::new(0x01, 0x75);
pub const TAG_TEMPERATURE: Tag = Tag::new(0x03, 0x67);
pub const TAG_HUMIDITY: Tag = Tag::new(0x04, 0x68);
pub const TAG_CO2: Tag = Tag::new(0x05, 0x69);
pub const TAG_DISTANCE: Tag = Tag::new(0x04, 0x80);
pub const TAG_TILT_STATUS: Tag = Tag::new(0x05, 0x71);

/// EM500-CO2 air quality sensor. Unknown tags are crawled over.
pub fn em500_co2() -> DeviceProfile {
    DeviceProfile::fixed(
        EM500_CO2,
        TagTable::fixed(
            UnknownTagPolicy::SkipOneByte,
            vec![
                TagSpec::fixed(TAG_BATTERY, "battery", DecodeRule::RawU8),
                TagSpec::fixed(TAG_TEMPERATURE, "temperature", DecodeRule::I16ScaledTenth),
                TagSpec::fixed(TAG_HUMIDITY, "humidity", DecodeRule::RawU8),
                TagSpec::fixed(TAG_CO2, "co2", DecodeRule::U16Raw),
            ],
        ),
    )
}

/// EM310-UDL ultrasonic distance sensor. Unknown tags end the frame.
pub fn em310_udl() -> DeviceProfile {
    DeviceProfile::fixed(
        EM310_UDL,
        TagTable::fixed(
            UnknownTagPolicy::AbortFrame,
            vec![
                TagSpec::fixed(TAG_BATTERY, "battery", DecodeRule::RawU8),
                TagSpec::fixed(TAG_DISTANCE, "distance", DecodeRule::U16Raw),
                TagSpec::fixed(TAG_TILT_STATUS, "status", DecodeRule::BoolStatus),
                TagSpec::fixed(TAG_TEMPERATURE, "temperature", DecodeRule::I16ScaledTenth),
            ],
        ),
    )
}

pub fn all() -> Vec<DeviceProfile> {
    vec![em500_co2(), em310_udl()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_have_distinct_tags() {
        assert_eq!(em500_co2().table().len(), 4);
        assert_eq!(em310_udl().table().len(), 4);
    }

    #[test]
    fn builtin_policies_match_families() {
        assert_eq!(
            em500_co2().table().on_unknown_tag(),
            UnknownTagPolicy::SkipOneByte
        );
        assert_eq!(
            em310_udl().table().on_unknown_tag(),
            UnknownTagPolicy::AbortFrame
        );
    }

    #[test]
    fn builtin_specs_revalidate() {
        for profile in all() {
            let specs = profile.table().specs().cloned().collect::<Vec<_>>();
            let rebuilt = TagTable::new(profile.table().on_unknown_tag(), specs).unwrap();
            assert_eq!(&rebuilt, profile.table(), "{}", profile.name());
        }
    }
}
