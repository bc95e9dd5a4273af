//! Raw configuration values.
//!
//! [`ConfigValue`] is the wire representation consumed by construction and
//! produced by flattening: scalars, ordered lists and string-keyed maps, plus
//! the two indirection markers which stay opaque until a later stage resolves
//! them.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::env::{ENV_KEY, EnvVar, IntEnvVar};

/// Insertion-ordered mapping used for every raw config map.
pub type ConfigMap = IndexMap<String, ConfigValue>;

/// A raw configuration value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
    Map(ConfigMap),
    /// String-valued environment reference, resolved by a later stage.
    EnvVar(EnvVar),
    /// Integer-valued environment reference, resolved by a later stage.
    IntEnvVar(IntEnvVar),
}

impl ConfigValue {
    /// Short kind label used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Int(_) => "int",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::List(_) => "list",
            ConfigValue::Map(_) => "map",
            ConfigValue::EnvVar(_) => "env var",
            ConfigValue::IntEnvVar(_) => "int env var",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, ConfigValue::EnvVar(_) | ConfigValue::IntEnvVar(_))
    }

    /// Whether this value or anything nested inside it is an indirection marker.
    pub fn contains_marker(&self) -> bool {
        match self {
            ConfigValue::EnvVar(_) | ConfigValue::IntEnvVar(_) => true,
            ConfigValue::List(items) => items.iter().any(ConfigValue::contains_marker),
            ConfigValue::Map(map) => map.values().any(ConfigValue::contains_marker),
            _ => false,
        }
    }

    /// Replace every marker with its `{"env": <name>}` encoding, recursively.
    pub fn render_markers(self) -> ConfigValue {
        match self {
            ConfigValue::EnvVar(var) => var.to_env_map(),
            ConfigValue::IntEnvVar(var) => var.to_env_map(),
            ConfigValue::List(items) => {
                ConfigValue::List(items.into_iter().map(ConfigValue::render_markers).collect())
            }
            ConfigValue::Map(map) => ConfigValue::Map(
                map.into_iter()
                    .map(|(key, value)| (key, value.render_markers()))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Short rendering for error messages; long values are truncated.
    pub fn describe(&self) -> String {
        let rendered = match serde_json::to_string(self) {
            Ok(rendered) => rendered,
            Err(_) => format!("{self:?}"),
        };
        truncate(&rendered, 80)
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let cutoff = value
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(value.len());
    format!("{}...", &value[..cutoff])
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Null => serializer.serialize_unit(),
            ConfigValue::Bool(value) => serializer.serialize_bool(*value),
            ConfigValue::Int(value) => serializer.serialize_i64(*value),
            ConfigValue::Float(value) => serializer.serialize_f64(*value),
            ConfigValue::String(value) => serializer.serialize_str(value),
            ConfigValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ConfigValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            ConfigValue::EnvVar(var) => {
                let mut out = serializer.serialize_map(Some(1))?;
                out.serialize_entry(ENV_KEY, var.name())?;
                out.end()
            }
            ConfigValue::IntEnvVar(var) => {
                let mut out = serializer.serialize_map(Some(1))?;
                out.serialize_entry(ENV_KEY, var.name())?;
                out.end()
            }
        }
    }
}

impl From<serde_json::Value> for ConfigValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ConfigValue::Null,
            serde_json::Value::Bool(value) => ConfigValue::Bool(value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(int) => ConfigValue::Int(int),
                None => ConfigValue::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(value) => ConfigValue::String(value),
            serde_json::Value::Array(items) => {
                ConfigValue::List(items.into_iter().map(ConfigValue::from).collect())
            }
            serde_json::Value::Object(map) => ConfigValue::Map(
                map.into_iter()
                    .map(|(key, value)| (key, ConfigValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::List(items)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        ConfigValue::Map(map)
    }
}

impl From<EnvVar> for ConfigValue {
    fn from(var: EnvVar) -> Self {
        ConfigValue::EnvVar(var)
    }
}

impl From<IntEnvVar> for ConfigValue {
    fn from(var: IntEnvVar) -> Self {
        ConfigValue::IntEnvVar(var)
    }
}

impl<T: Into<ConfigValue>> From<Option<T>> for ConfigValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ConfigValue::Null)
    }
}

/// Convert a JSON object literal into a [`ConfigMap`]; non-objects yield an empty map.
pub fn config_map_from_json(value: serde_json::Value) -> ConfigMap {
    match ConfigValue::from(value) {
        ConfigValue::Map(map) => map,
        _ => ConfigMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn markers_render_as_env_maps() {
        let mut map = ConfigMap::new();
        map.insert("password".into(), EnvVar::new("DB_PW").into());
        map.insert(
            "ports".into(),
            ConfigValue::List(vec![ConfigValue::Int(1), IntEnvVar::new("PORT").into()]),
        );

        let rendered = ConfigValue::Map(map).render_markers();
        assert_eq!(
            serde_json::to_value(&rendered).unwrap(),
            json!({"password": {"env": "DB_PW"}, "ports": [1, {"env": "PORT"}]})
        );
        assert!(!rendered.contains_marker());
    }

    #[test]
    fn marker_is_not_equal_to_its_name() {
        let marker = ConfigValue::from(EnvVar::new("X"));
        assert_ne!(marker, ConfigValue::from("X"));
        assert!(marker.is_marker());
    }

    #[test]
    fn json_numbers_keep_int_vs_float() {
        let value = ConfigValue::from(json!({"a": 1, "b": 1.5}));
        let map = value.as_map().unwrap();
        assert_eq!(map["a"], ConfigValue::Int(1));
        assert_eq!(map["b"], ConfigValue::Float(1.5));
    }
}
