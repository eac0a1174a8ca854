//! Layout engine behavior across generated configs and records.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use padrelay_layout::{BitMapping, ByteLayout, ByteMapping, Field, LayoutConfig, StateRecord};
use proptest::prelude::*;

const WORKED_EXAMPLE: &str = r#"{"output_size":6,"bytes":[
    {"type":"bits","bits":[{"pos":0,"field":"W"}]},
    {"type":"field","field":"LjoyX"},
    {"type":"field","field":"LjoyY"},
    {"type":"field","field":"RjoyY"},
    {"type":"field","field":"RT"},
    {"type":"bits","bits":[{"pos":7,"field":"N"}]}
]}"#;

#[test]
fn worked_example_packet() {
    let config = LayoutConfig::from_json_str(WORKED_EXAMPLE).unwrap();
    let layout = ByteLayout::load(&config).unwrap();

    let record = StateRecord::default()
        .with(Field::West, 1)
        .with(Field::North, 1)
        .with(Field::LeftX, 0x98)
        .with(Field::LeftY, 0xFC)
        .with(Field::RightY, 0x66)
        .with(Field::RightTrigger, 0xE9);

    // Seeds 0xA8 / 0x15 OR-ed with bit 0 (W) and bit 7 (N).
    assert_eq!(
        layout.format(&record),
        vec![0xA9, 0x98, 0xFC, 0x66, 0xE9, 0x95]
    );
}

fn field_name() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(Field::ALL.to_vec()).prop_map(|f| f.name().to_string()),
        1 => "[a-z]{1,6}",
    ]
}

fn mapping() -> impl Strategy<Value = ByteMapping> {
    prop_oneof![
        any::<u8>().prop_map(|value| ByteMapping::Const { value }),
        field_name().prop_map(|field| ByteMapping::Field { field }),
        prop::collection::vec((0u8..8, field_name()), 0..8).prop_map(|entries| {
            ByteMapping::Bits {
                bits: entries
                    .into_iter()
                    .map(|(pos, field)| BitMapping { pos, field })
                    .collect(),
            }
        }),
    ]
}

fn config() -> impl Strategy<Value = LayoutConfig> {
    (
        1usize..16,
        prop::option::of(any::<bool>()),
        prop::collection::vec(mapping(), 0..20),
    )
        .prop_map(|(output_size, legacy_sentinels, bytes)| LayoutConfig {
            output_size,
            legacy_sentinels,
            bytes,
        })
}

fn record() -> impl Strategy<Value = StateRecord> {
    (prop::array::uniform18(any::<u8>()), any::<i64>()).prop_map(|(values, ts)| {
        let mut record = StateRecord {
            timestamp: ts,
            ..StateRecord::default()
        };
        for (field, value) in Field::ALL.into_iter().zip(values) {
            record.set(field, value);
        }
        record
    })
}

// Property: format is a pure function of (layout, record).
proptest! {
    #[test]
    fn prop_format_is_deterministic(config in config(), record in record()) {
        let first = ByteLayout::load(&config).expect("generated config should load");
        let second = ByteLayout::load(&config).expect("generated config should load");

        let a = first.format(&record);
        let b = first.format(&record);
        let c = second.format(&record);

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
    }
}

// Property: output length always equals output_size.
proptest! {
    #[test]
    fn prop_output_has_configured_length(config in config(), record in record()) {
        let layout = ByteLayout::load(&config).expect("generated config should load");
        prop_assert_eq!(layout.format(&record).len(), config.output_size);
    }
}

// Property: unknown names behave exactly like a field holding zero.
proptest! {
    #[test]
    fn prop_unknown_field_reads_zero(name in "[a-z]{1,6}", record in record()) {
        let config = LayoutConfig {
            output_size: 2,
            legacy_sentinels: None,
            bytes: vec![
                ByteMapping::Field { field: name.clone() },
                ByteMapping::Bits { bits: vec![BitMapping { pos: 3, field: name }] },
            ],
        };
        let layout = ByteLayout::load(&config).expect("config should load");
        prop_assert_eq!(layout.format(&record), vec![0, 0]);
    }
}

// Property: timestamp never influences the packet.
proptest! {
    #[test]
    fn prop_timestamp_is_ignored(record in record(), ts in any::<i64>()) {
        let layout = ByteLayout::default();
        let restamped = StateRecord { timestamp: ts, ..record };
        prop_assert_eq!(layout.format(&record), layout.format(&restamped));
    }
}

// Property: the config round-trips through its JSON form.
proptest! {
    #[test]
    fn prop_config_json_roundtrip(config in config()) {
        let json = serde_json::to_string(&config).expect("config should serialize");
        let parsed = LayoutConfig::from_json_str(&json).expect("config should parse");
        prop_assert_eq!(parsed, config);
    }
}
