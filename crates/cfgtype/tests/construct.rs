mod common;

use cfgtype::{
    ConfigArgs, ConfigError, ConfigTypeExt, ConfigValue, ValidationErrorKind,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use common::{Cat, Database, Dog, Household, Level, Pet, raw};

#[test_log::test]
fn household_round_trips_through_raw_config() {
    let input = raw(json!({
        "pet": {"cat": {"meows": 3}},
        "backup_pet": {"dog": {"barks": 1.5}},
        "level": "INFO",
    }));

    let household = Household::from_config_dict(input).expect("construct");
    assert_eq!(household.pet, Pet::Cat(Cat { meows: 3 }));
    assert_eq!(
        household.spare,
        Some(Pet::Dog(Dog {
            barks: 1.5,
            sound: "woof".to_string()
        }))
    );
    assert_eq!(household.level, Level::Info);
    assert_eq!(household.tags, Vec::<String>::new());

    let flattened = household.to_config_dict();
    assert_eq!(
        flattened,
        raw(json!({
            "pet": {"cat": {"meows": 3}},
            "backup_pet": {"dog": {"barks": 1.5, "sound": "woof"}},
            "level": "INFO",
            "tags": [],
        }))
    );

    let rebuilt = Household::from_config_dict(flattened).expect("reconstruct");
    assert_eq!(rebuilt, household);
}

#[test]
fn missing_required_fields_fail_with_field_path() {
    let err = Database::from_config_dict(raw(json!({"password": "pw"}))).unwrap_err();
    let ConfigError::Validation { class, source } = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(*class, "Database");
    assert_eq!(source.kind, ValidationErrorKind::MissingField);
    assert_eq!(source.path_string(), "host");
}

#[test]
fn explicit_null_on_required_field_is_missing() {
    let err = Database::from_config_dict(raw(json!({"host": null, "password": "pw"})))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Validation { ref source, .. } if source.kind == ValidationErrorKind::MissingField
    ));
}

#[test]
fn null_on_optional_field_falls_back_to_default() {
    let db = Database::from_config_dict(raw(json!({
        "host": "db.internal",
        "port": null,
        "password": "pw",
        "user": null,
    })))
    .expect("construct");
    assert_eq!(db.port, 5432);
    assert_eq!(db.user, None);
    assert_eq!(db.to_config_dict(), raw(json!({
        "host": "db.internal",
        "port": 5432,
        "password": "pw",
    })));
}

#[test]
fn undeclared_root_key_is_rejected() {
    let err = Database::from_config_dict(raw(json!({
        "host": "h",
        "password": "pw",
        "hots": "typo",
    })))
    .unwrap_err();
    assert_eq!(
        err,
        ConfigError::UndeclaredField {
            class: "Database",
            field: "hots".to_string(),
            kind: cfgtype::ConfigKind::Config,
        }
    );
}

#[rstest]
#[case::two_keys(json!({"cat": {"meows": 1}, "dog": {"barks": 2.0}}), "duplicate")]
#[case::empty(json!({}), "malformed")]
#[case::scalar(json!("cat"), "malformed")]
#[case::scalar_body(json!({"cat": 7}), "malformed")]
fn malformed_union_payloads(#[case] pet: serde_json::Value, #[case] expected: &str) {
    let err = Household::from_config_dict(raw(json!({"pet": pet, "level": "DEBUG"}))).unwrap_err();
    match (expected, &err) {
        ("duplicate", ConfigError::DuplicateUnionKey { field, discriminator, keys, .. }) => {
            assert_eq!(field, "pet");
            assert_eq!(discriminator, "pet_type");
            assert_eq!(keys, &["cat".to_string(), "dog".to_string()]);
        }
        ("malformed", ConfigError::MalformedUnionValue { field, .. }) => {
            assert_eq!(field, "pet");
        }
        _ => panic!("unexpected error for {expected}: {err:?}"),
    }
    assert!(err.to_string().contains("discriminator 'pet_type'"));
}

#[test]
fn unknown_union_variant_reports_nested_path() {
    let err = Household::from_config_dict(raw(json!({
        "pet": {"bird": {}},
        "level": "WARN",
    })))
    .unwrap_err();
    let ConfigError::Validation { source, .. } = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(source.path_string(), "pet.pet_type");
    assert!(matches!(
        source.kind,
        ValidationErrorKind::UnknownVariant { ref got, .. } if got == "bird"
    ));
}

#[test]
fn nested_errors_carry_full_path() {
    let err = Household::from_config_dict(raw(json!({
        "pet": {"dog": {"barks": "loud"}},
        "level": "WARN",
    })))
    .unwrap_err();
    let ConfigError::Validation { source, .. } = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(source.path_string(), "pet.barks");
}

#[test]
fn instance_arguments_are_reencoded() {
    let dog = Pet::Dog(Dog {
        barks: 2.0,
        sound: "arf".to_string(),
    });
    let household = Household::construct(
        ConfigArgs::new()
            .instance("pet", &dog)
            .set("level", "DEBUG")
            .set("tags", ConfigValue::List(vec!["a".into(), "b".into()])),
    )
    .expect("construct");

    assert_eq!(household.pet, dog);
    assert_eq!(household.tags, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn keyword_arguments_accept_field_name_or_alias() {
    let by_alias = Household::construct(
        ConfigArgs::new()
            .set("pet", raw(json!({"cat": {"meows": 1}})))
            .set("backup_pet", raw(json!({"cat": {"meows": 2}})))
            .set("level", "INFO"),
    )
    .expect("alias");
    let by_name = Household::construct(
        ConfigArgs::new()
            .set("pet", raw(json!({"cat": {"meows": 1}})))
            .set("spare", raw(json!({"cat": {"meows": 2}})))
            .set("level", "INFO"),
    )
    .expect("name");

    assert_eq!(by_alias, by_name);
    assert_eq!(by_alias.spare, Some(Pet::Cat(Cat { meows: 2 })));
}

#[rstest]
#[case(json!(5432), Some(5432))]
#[case(json!(65535), Some(65535))]
#[case(json!(70000), None)]
#[case(json!(-1), None)]
fn port_range_is_checked(#[case] port: serde_json::Value, #[case] expected: Option<u16>) {
    let result = Database::from_config_dict(raw(json!({
        "host": "h",
        "port": port,
        "password": "pw",
    })));
    assert_eq!(result.ok().map(|db| db.port), expected);
}

#[test]
fn field_given_by_name_and_alias_is_rejected() {
    let err = Household::construct(
        ConfigArgs::new()
            .set("pet", raw(json!({"cat": {"meows": 1}})))
            .set("spare", raw(json!({"cat": {"meows": 2}})))
            .set("backup_pet", raw(json!({"dog": {"barks": 1.0}})))
            .set("level", "INFO"),
    )
    .unwrap_err();

    let ConfigError::Validation { source, .. } = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(
        source.kind,
        ValidationErrorKind::DuplicateField {
            names: vec!["spare".to_string(), "backup_pet".to_string()],
        }
    );
}
