mod common;

use cfgtype::flatten::config_value_map;
use cfgtype::{
    Config, ConfigField, ConfigMap, ConfigTypeExt, ConfigTypeNode, ConfigValue, EnvVar,
    IntEnvVar, IntSource, SchemaError, StringSource, ValidationError,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{Database, raw};

/// A secret whose validation coerces references to an empty placeholder.
#[derive(Debug, Clone, PartialEq)]
enum Secret {
    Plain(String),
    Reference(EnvVar),
}

impl ConfigField for Secret {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::StringSource)
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        match value {
            ConfigValue::String(value) => Ok(Secret::Plain(value)),
            ConfigValue::EnvVar(_) => Ok(Secret::Plain(String::new())),
            other => Err(ValidationError::type_mismatch("secret", &other)),
        }
    }

    fn to_config_value(&self) -> ConfigValue {
        match self {
            Secret::Plain(value) => ConfigValue::String(value.clone()),
            Secret::Reference(var) => ConfigValue::EnvVar(var.clone()),
        }
    }

    fn restore_markers(&mut self, raw: &ConfigValue) {
        if let ConfigValue::EnvVar(var) = raw {
            *self = Secret::Reference(var.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Config)]
struct Credentials {
    user: StringSource,
    #[config(default = IntSource::Value(5432))]
    port: IntSource,
    token: Secret,
}

#[derive(Debug, Clone, PartialEq, Config)]
struct Deployment {
    primary: Credentials,
    replicas: Vec<Credentials>,
    #[config(default)]
    labels: ConfigMap,
}

fn credentials(user: ConfigValue, token: ConfigValue) -> ConfigValue {
    let mut map = ConfigMap::new();
    map.insert("user".into(), user);
    map.insert("token".into(), token);
    ConfigValue::Map(map)
}

#[test]
fn markers_survive_construction_and_render_on_flatten() {
    let mut input = raw(json!({"host": "h"}));
    input.insert("password".into(), EnvVar::new("DB_PASSWORD").into());

    let db = Database::from_config_dict(input).expect("construct");
    assert_eq!(db.password, StringSource::env("DB_PASSWORD"));

    let kept = config_value_map(db.get());
    assert_eq!(kept["password"], ConfigValue::EnvVar(EnvVar::new("DB_PASSWORD")));
    assert_eq!(
        db.to_config_dict(),
        raw(json!({"host": "h", "port": 5432, "password": {"env": "DB_PASSWORD"}}))
    );
}

#[test]
fn env_maps_are_accepted_as_markers() {
    let db = Database::from_config_dict(raw(json!({
        "host": "h",
        "password": {"env": "DB_PASSWORD"},
    })))
    .expect("construct");
    assert_eq!(db.password, StringSource::env("DB_PASSWORD"));
}

#[test]
fn markers_are_reinstalled_after_coercing_validation() {
    let mut input = ConfigMap::new();
    input.insert(
        "primary".into(),
        credentials(EnvVar::new("USER").into(), EnvVar::new("TOKEN").into()),
    );
    input.insert(
        "replicas".into(),
        ConfigValue::List(vec![
            credentials("replica".into(), "t0".into()),
            credentials("replica".into(), EnvVar::new("REPLICA_TOKEN").into()),
        ]),
    );

    let deployment = Deployment::from_config_dict(input).expect("construct");
    assert_eq!(deployment.primary.token, Secret::Reference(EnvVar::new("TOKEN")));
    assert_eq!(deployment.primary.user, StringSource::env("USER"));
    assert_eq!(deployment.replicas[0].token, Secret::Plain("t0".to_string()));
    assert_eq!(
        deployment.replicas[1].token,
        Secret::Reference(EnvVar::new("REPLICA_TOKEN"))
    );

    assert_eq!(
        deployment.to_config_dict(),
        raw(json!({
            "primary": {"user": {"env": "USER"}, "port": 5432, "token": {"env": "TOKEN"}},
            "replicas": [
                {"user": "replica", "port": 5432, "token": "t0"},
                {"user": "replica", "port": 5432, "token": {"env": "REPLICA_TOKEN"}},
            ],
            "labels": {},
        }))
    );
}

#[test]
fn int_markers_round_trip() {
    let mut primary = ConfigMap::new();
    primary.insert("user".into(), "u".into());
    primary.insert("port".into(), IntEnvVar::new("DB_PORT").into());
    primary.insert("token".into(), "t".into());
    let mut input = ConfigMap::new();
    input.insert("primary".into(), ConfigValue::Map(primary));
    input.insert("replicas".into(), ConfigValue::List(Vec::new()));

    let deployment = Deployment::from_config_dict(input).expect("construct");
    assert_eq!(deployment.primary.port, IntSource::env("DB_PORT"));
    assert_eq!(deployment.primary.port.literal(), None);

    let rebuilt = Deployment::from_config_dict(deployment.to_config_dict()).expect("rebuild");
    assert_eq!(rebuilt.primary.port, IntSource::env("DB_PORT"));
}

#[test]
fn untyped_values_keep_nested_markers() {
    let mut labels = ConfigMap::new();
    labels.insert("team".into(), EnvVar::new("TEAM").into());
    let mut input = raw(json!({
        "primary": {"user": "u", "token": "t"},
        "replicas": [],
    }));
    input.insert("labels".into(), ConfigValue::Map(labels.clone()));

    let deployment = Deployment::from_config_dict(input).expect("construct");
    assert_eq!(deployment.labels, labels);
    assert_eq!(
        deployment.to_config_dict()["labels"],
        ConfigValue::from(json!({"team": {"env": "TEAM"}}))
    );
}

#[test]
fn plain_strings_reject_markers() {
    let mut input = raw(json!({"password": "pw"}));
    input.insert("host".into(), EnvVar::new("HOST").into());
    assert!(Database::from_config_dict(input).is_err());
}
