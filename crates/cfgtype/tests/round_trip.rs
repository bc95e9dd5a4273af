use cfgtype::{Config, ConfigTypeExt, Frozen, IntSource, StringSource};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq, Config)]
struct Limits {
    soft: u16,
    hard: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Config)]
struct Tuning {
    small: i8,
    medium: i16,
    count: u32,
    big: i64,
    ratio: f64,
    label: Option<String>,
    #[config(alias = "batch-sizes")]
    batches: Vec<u8>,
    endpoint: StringSource,
    port: IntSource,
    limits: Limits,
    fallback: Option<Limits>,
}

fn string_source() -> impl Strategy<Value = StringSource> {
    prop_oneof![
        "[a-z0-9 ]{0,12}".prop_map(StringSource::from),
        "[A-Z_]{1,10}".prop_map(StringSource::env),
    ]
}

fn int_source() -> impl Strategy<Value = IntSource> {
    prop_oneof![
        any::<i64>().prop_map(IntSource::from),
        "[A-Z_]{1,10}".prop_map(IntSource::env),
    ]
}

fn limits() -> impl Strategy<Value = Limits> {
    (any::<u16>(), proptest::option::of(any::<i32>()))
        .prop_map(|(soft, hard)| Limits { soft, hard })
}

fn tuning() -> impl Strategy<Value = Tuning> {
    (
        (any::<i8>(), any::<i16>(), any::<u32>(), any::<i64>(), -1.0e9..1.0e9_f64),
        (
            proptest::option::of("[a-z]{0,8}"),
            proptest::collection::vec(any::<u8>(), 0..5),
            string_source(),
            int_source(),
        ),
        (limits(), proptest::option::of(limits())),
    )
        .prop_map(
            |(
                (small, medium, count, big, ratio),
                (label, batches, endpoint, port),
                (limits, fallback),
            )| Tuning {
                small,
                medium,
                count,
                big,
                ratio,
                label,
                batches,
                endpoint,
                port,
                limits,
                fallback,
            },
        )
}

proptest! {
    #[test]
    fn flattened_instances_rebuild_equal(value in tuning()) {
        let original = Frozen::new(value);
        let raw = original.to_config_dict();
        let rebuilt = Tuning::from_config_dict(raw.clone())
            .map_err(|err| TestCaseError::fail(format!("{err} for {raw:?}")))?;
        prop_assert_eq!(rebuilt, original);
    }
}
