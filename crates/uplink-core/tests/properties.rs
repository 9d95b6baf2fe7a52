use proptest::prelude::*;
use uplink_core::{
    DecodeRule, DecodedRecord, DeviceProfile, EM310_UDL, EM500_CO2, FieldValue, ProfileRegistry,
    TagSpec, Termination, TiltStatus,
};

fn profile(name: &str) -> DeviceProfile {
    ProfileRegistry::builtin()
        .get(name)
        .expect("builtin profile")
        .clone()
}

fn value_for(rule: DecodeRule, raw: u16, flag: bool) -> FieldValue {
    match rule {
        DecodeRule::RawU8 => FieldValue::Unsigned(u64::from(raw & 0xFF)),
        DecodeRule::U16Raw => FieldValue::Unsigned(u64::from(raw)),
        DecodeRule::I16ScaledTenth => FieldValue::Decimal(f64::from(raw as i16) / 10.0),
        DecodeRule::BoolStatus => FieldValue::Status(if flag {
            TiltStatus::Tilt
        } else {
            TiltStatus::Normal
        }),
    }
}

/// Encoded segments for a profile plus the record they should decode to.
fn segments(profile: &DeviceProfile, picks: &[(usize, u16, bool)]) -> (Vec<Vec<u8>>, DecodedRecord) {
    let specs: Vec<&TagSpec> = profile.table().specs().collect();
    let mut expected = DecodedRecord::new();
    let mut encoded = Vec::new();
    for (index, raw, flag) in picks {
        let spec = specs[index % specs.len()];
        let value = value_for(spec.rule(), *raw, *flag);
        encoded.push(spec.encode(&value).expect("value fits rule"));
        expected.insert(spec.field(), value);
    }
    (encoded, expected)
}

fn picks() -> impl Strategy<Value = Vec<(usize, u16, bool)>> {
    prop::collection::vec((0usize..16, any::<u16>(), any::<bool>()), 0..10)
}

proptest! {
    #[test]
    fn prop_decoding_is_deterministic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        for name in [EM500_CO2, EM310_UDL] {
            let profile = profile(name);
            prop_assert_eq!(profile.decode(&bytes), profile.decode(&bytes));
        }
    }

    #[test]
    fn prop_records_only_hold_table_fields(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        for name in [EM500_CO2, EM310_UDL] {
            let profile = profile(name);
            let frame = profile.decode(&bytes);
            for (field, _) in frame.record.iter() {
                prop_assert!(profile.table().spec_for_field(field).is_some());
            }
            prop_assert!(frame.skipped_bytes <= bytes.len());
        }
    }

    #[test]
    fn prop_round_trip_em500(picks in picks()) {
        let profile = profile(EM500_CO2);
        let (encoded, expected) = segments(&profile, &picks);
        let bytes = encoded.concat();
        let by_field = profile
            .encode_fields(expected.iter().map(|(field, value)| (field, *value)))
            .expect("fields belong to profile");
        prop_assert_eq!(profile.decode(&by_field).record, expected.clone());

        let frame = profile.decode(&bytes);
        prop_assert_eq!(frame.record, expected);
        prop_assert_eq!(frame.termination, Termination::Complete);
        prop_assert_eq!(frame.skipped_bytes, 0);
    }

    #[test]
    fn prop_round_trip_em310(picks in picks()) {
        let profile = profile(EM310_UDL);
        let (encoded, expected) = segments(&profile, &picks);
        let frame = profile.decode(&encoded.concat());
        prop_assert_eq!(frame.record, expected);
        prop_assert_eq!(frame.termination, Termination::Complete);
    }

    #[test]
    fn prop_truncated_value_equals_valid_prefix(
        picks in picks(),
        cut in any::<prop::sample::Index>(),
        missing in 1usize..3,
    ) {
        prop_assume!(!picks.is_empty());
        for name in [EM500_CO2, EM310_UDL] {
            let profile = profile(name);
            let (encoded, _) = segments(&profile, &picks);
            let segment = cut.index(encoded.len());
            let prefix = encoded[..segment].concat();

            let value_len = encoded[segment].len() - 2;
            let keep = value_len - missing.min(value_len);
            let mut truncated = prefix.clone();
            truncated.extend_from_slice(&encoded[segment][..2 + keep]);

            let full = profile.decode(&truncated);
            let valid = profile.decode(&prefix);
            prop_assert_eq!(&full.record, &valid.record);
            prop_assert!(full.termination.is_malformed());
        }
    }
}

#[test]
fn empty_payload_has_no_fields() {
    let registry = ProfileRegistry::builtin();
    for name in [EM500_CO2, EM310_UDL] {
        let outcome = registry.get(name).unwrap().decode_payload(Some(""));
        assert!(outcome.into_record().is_empty());
    }
}
