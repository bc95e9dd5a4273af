//! Indirection markers for values resolved after construction.
//!
//! Nothing here reads the process environment. Markers are carried through
//! construction and flattening untouched and rendered as `{"env": <name>}`.

use crate::value::{ConfigMap, ConfigValue};

/// Map key used by the `{"env": <name>}` encoding.
pub const ENV_KEY: &str = "env";

/// A string-valued reference to an environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvVar {
    name: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_env_map(&self) -> ConfigValue {
        env_map(&self.name)
    }
}

/// An integer-valued reference to an environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntEnvVar {
    name: String,
}

impl IntEnvVar {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn to_env_map(&self) -> ConfigValue {
        env_map(&self.name)
    }
}

fn env_map(name: &str) -> ConfigValue {
    let mut map = ConfigMap::new();
    map.insert(ENV_KEY.to_string(), ConfigValue::String(name.to_string()));
    ConfigValue::Map(map)
}

/// The variable name of an `{"env": <name>}` map, if `map` is exactly that.
pub fn env_name_from_map(map: &ConfigMap) -> Option<&str> {
    if map.len() != 1 {
        return None;
    }
    map.get(ENV_KEY).and_then(ConfigValue::as_str)
}

/// A string field that is either a literal or an environment reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StringSource {
    Value(String),
    Env(EnvVar),
}

impl StringSource {
    pub fn env(name: impl Into<String>) -> Self {
        StringSource::Env(EnvVar::new(name))
    }

    /// The literal value; `None` while the value is still an unresolved reference.
    pub fn literal(&self) -> Option<&str> {
        match self {
            StringSource::Value(value) => Some(value),
            StringSource::Env(_) => None,
        }
    }
}

impl From<&str> for StringSource {
    fn from(value: &str) -> Self {
        StringSource::Value(value.to_string())
    }
}

impl From<String> for StringSource {
    fn from(value: String) -> Self {
        StringSource::Value(value)
    }
}

impl From<EnvVar> for StringSource {
    fn from(var: EnvVar) -> Self {
        StringSource::Env(var)
    }
}

/// An integer field that is either a literal or an environment reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntSource {
    Value(i64),
    Env(IntEnvVar),
}

impl IntSource {
    pub fn env(name: impl Into<String>) -> Self {
        IntSource::Env(IntEnvVar::new(name))
    }

    pub fn literal(&self) -> Option<i64> {
        match self {
            IntSource::Value(value) => Some(*value),
            IntSource::Env(_) => None,
        }
    }
}

impl From<i64> for IntSource {
    fn from(value: i64) -> Self {
        IntSource::Value(value)
    }
}

impl From<IntEnvVar> for IntSource {
    fn from(var: IntEnvVar) -> Self {
        IntSource::Env(var)
    }
}
