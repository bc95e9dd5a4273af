//! The per-type validation primitive.
//!
//! [`ConfigField`] is implemented for every type that may appear as a field of
//! a `#[derive(Config)]` struct: scalars, marker sources, the standard
//! containers, and every derived type.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::env::{IntSource, StringSource, env_name_from_map};
use crate::error::{SchemaError, ValidationError};
use crate::schema::{ConfigTypeNode, ScalarKind};
use crate::value::{ConfigMap, ConfigValue};

pub trait ConfigField: Sized {
    /// Absence and null are both legal; the field defaults to its empty value.
    const OPTIONAL: bool = false;

    /// Discriminator key when the type is a discriminated union.
    const DISCRIMINATOR: Option<&'static str> = None;

    /// Resources are wired by another layer and never appear in schemas.
    const IS_RESOURCE: bool = false;

    /// Schema node describing the legal raw shape.
    fn config_type() -> Result<ConfigTypeNode, SchemaError>;

    /// Validate and convert a raw value. Errors carry the path below this value.
    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError>;

    /// Convert back to the raw form. Markers are kept as markers.
    fn to_config_value(&self) -> ConfigValue;

    /// Re-install indirection markers found in `raw`, the value this instance
    /// was built from. Types that cannot hold markers ignore the call.
    fn restore_markers(&mut self, _raw: &ConfigValue) {}
}

impl ConfigField for bool {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::Scalar(ScalarKind::Bool))
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        match value {
            ConfigValue::Bool(value) => Ok(value),
            other => Err(ValidationError::type_mismatch("bool", &other)),
        }
    }

    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Bool(*self)
    }
}

impl ConfigField for i64 {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::Scalar(ScalarKind::Int))
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        match value {
            ConfigValue::Int(value) => Ok(value),
            other => Err(ValidationError::type_mismatch("int", &other)),
        }
    }

    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Int(*self)
    }
}

// Only widths that embed losslessly in `i64`. `u64` and `usize` have no
// impl since their upper range cannot be flattened.
macro_rules! narrow_int_field {
    ($($ty:ty => $label:literal),* $(,)?) => {
        $(
            impl ConfigField for $ty {
                fn config_type() -> Result<ConfigTypeNode, SchemaError> {
                    Ok(ConfigTypeNode::Scalar(ScalarKind::Int))
                }

                fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
                    let wide = i64::from_config_value(value)?;
                    <$ty>::try_from(wide)
                        .map_err(|_| ValidationError::out_of_range($label, wide.to_string()))
                }

                fn to_config_value(&self) -> ConfigValue {
                    ConfigValue::Int(i64::from(*self))
                }
            }
        )*
    };
}

narrow_int_field!(
    i32 => "i32",
    i16 => "i16",
    i8 => "i8",
    u32 => "u32",
    u16 => "u16",
    u8 => "u8",
);

impl ConfigField for f64 {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::Scalar(ScalarKind::Float))
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        match value {
            ConfigValue::Float(value) => Ok(value),
            #[allow(clippy::cast_precision_loss)]
            ConfigValue::Int(value) => Ok(value as f64),
            other => Err(ValidationError::type_mismatch("float", &other)),
        }
    }

    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Float(*self)
    }
}

impl ConfigField for f32 {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::Scalar(ScalarKind::Float))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        f64::from_config_value(value).map(|value| value as f32)
    }

    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Float(f64::from(*self))
    }
}

impl ConfigField for String {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::Scalar(ScalarKind::String))
    }

    /// Markers are rejected: a plain `String` cannot carry an unresolved
    /// reference. Use [`StringSource`] for fields that may.
    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        match value {
            ConfigValue::String(value) => Ok(value),
            other => Err(ValidationError::type_mismatch("string", &other)),
        }
    }

    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::String(self.clone())
    }
}

impl ConfigField for StringSource {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::StringSource)
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        match value {
            ConfigValue::String(value) => Ok(StringSource::Value(value)),
            ConfigValue::EnvVar(var) => Ok(StringSource::Env(var)),
            ConfigValue::Map(map) => match env_name_from_map(&map) {
                Some(name) => Ok(StringSource::env(name)),
                None => Err(ValidationError::type_mismatch(
                    "string or {\"env\": <name>}",
                    &ConfigValue::Map(map),
                )),
            },
            other => Err(ValidationError::type_mismatch(
                "string or {\"env\": <name>}",
                &other,
            )),
        }
    }

    fn to_config_value(&self) -> ConfigValue {
        match self {
            StringSource::Value(value) => ConfigValue::String(value.clone()),
            StringSource::Env(var) => ConfigValue::EnvVar(var.clone()),
        }
    }

    fn restore_markers(&mut self, raw: &ConfigValue) {
        if let ConfigValue::EnvVar(var) = raw {
            *self = StringSource::Env(var.clone());
        }
    }
}

impl ConfigField for IntSource {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::IntSource)
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        match value {
            ConfigValue::Int(value) => Ok(IntSource::Value(value)),
            ConfigValue::IntEnvVar(var) => Ok(IntSource::Env(var)),
            ConfigValue::Map(map) => match env_name_from_map(&map) {
                Some(name) => Ok(IntSource::env(name)),
                None => Err(ValidationError::type_mismatch(
                    "int or {\"env\": <name>}",
                    &ConfigValue::Map(map),
                )),
            },
            other => Err(ValidationError::type_mismatch(
                "int or {\"env\": <name>}",
                &other,
            )),
        }
    }

    fn to_config_value(&self) -> ConfigValue {
        match self {
            IntSource::Value(value) => ConfigValue::Int(*value),
            IntSource::Env(var) => ConfigValue::IntEnvVar(var.clone()),
        }
    }

    fn restore_markers(&mut self, raw: &ConfigValue) {
        if let ConfigValue::IntEnvVar(var) = raw {
            *self = IntSource::Env(var.clone());
        }
    }
}

/// Untyped passthrough.
impl ConfigField for ConfigValue {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::Scalar(ScalarKind::Any))
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        Ok(value)
    }

    fn to_config_value(&self) -> ConfigValue {
        self.clone()
    }

    fn restore_markers(&mut self, raw: &ConfigValue) {
        if raw.contains_marker() {
            *self = raw.clone();
        }
    }
}

impl<T: ConfigField> ConfigField for Option<T> {
    const OPTIONAL: bool = true;
    const DISCRIMINATOR: Option<&'static str> = T::DISCRIMINATOR;
    const IS_RESOURCE: bool = T::IS_RESOURCE;

    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::Noneable(Box::new(T::config_type()?)))
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        match value {
            ConfigValue::Null => Ok(None),
            value => T::from_config_value(value).map(Some),
        }
    }

    fn to_config_value(&self) -> ConfigValue {
        match self {
            Some(value) => value.to_config_value(),
            None => ConfigValue::Null,
        }
    }

    fn restore_markers(&mut self, raw: &ConfigValue) {
        if let Some(inner) = self
            && !raw.is_null()
        {
            inner.restore_markers(raw);
        }
    }
}

impl<T: ConfigField> ConfigField for Box<T> {
    const OPTIONAL: bool = T::OPTIONAL;
    const DISCRIMINATOR: Option<&'static str> = T::DISCRIMINATOR;
    const IS_RESOURCE: bool = T::IS_RESOURCE;

    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        T::config_type()
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        T::from_config_value(value).map(Box::new)
    }

    fn to_config_value(&self) -> ConfigValue {
        self.as_ref().to_config_value()
    }

    fn restore_markers(&mut self, raw: &ConfigValue) {
        self.as_mut().restore_markers(raw);
    }
}

impl<T: ConfigField> ConfigField for Arc<T> {
    const OPTIONAL: bool = T::OPTIONAL;
    const DISCRIMINATOR: Option<&'static str> = T::DISCRIMINATOR;
    const IS_RESOURCE: bool = T::IS_RESOURCE;

    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        T::config_type()
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        T::from_config_value(value).map(Arc::new)
    }

    fn to_config_value(&self) -> ConfigValue {
        self.as_ref().to_config_value()
    }

    // Only freshly built values are unshared; shared ones are left alone.
    fn restore_markers(&mut self, raw: &ConfigValue) {
        if let Some(inner) = Arc::get_mut(self) {
            inner.restore_markers(raw);
        }
    }
}

impl<T: ConfigField> ConfigField for Vec<T> {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        Ok(ConfigTypeNode::Array(Box::new(T::config_type()?)))
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        match value {
            ConfigValue::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(idx, item)| {
                    T::from_config_value(item).map_err(|err| err.with_path_prefix(idx.to_string()))
                })
                .collect(),
            other => Err(ValidationError::type_mismatch("list", &other)),
        }
    }

    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::List(self.iter().map(ConfigField::to_config_value).collect())
    }

    fn restore_markers(&mut self, raw: &ConfigValue) {
        if let ConfigValue::List(raw_items) = raw {
            for (item, raw_item) in self.iter_mut().zip(raw_items) {
                item.restore_markers(raw_item);
            }
        }
    }
}

fn map_entries<T: ConfigField>(
    value: ConfigValue,
) -> Result<impl Iterator<Item = Result<(String, T), ValidationError>>, ValidationError> {
    match value {
        ConfigValue::Map(map) => Ok(map.into_iter().map(|(key, item)| {
            T::from_config_value(item)
                .map(|item| (key.clone(), item))
                .map_err(|err| err.with_path_prefix(key))
        })),
        other => Err(ValidationError::type_mismatch("map", &other)),
    }
}

fn restore_entries<'a, T: ConfigField + 'a>(
    entries: impl Iterator<Item = (&'a String, &'a mut T)>,
    raw: &ConfigValue,
) {
    if let ConfigValue::Map(raw_map) = raw {
        for (key, item) in entries {
            if let Some(raw_item) = raw_map.get(key) {
                item.restore_markers(raw_item);
            }
        }
    }
}

fn string_keyed_map_type<T: ConfigField>() -> Result<ConfigTypeNode, SchemaError> {
    Ok(ConfigTypeNode::Map {
        key: ScalarKind::String,
        value: Box::new(T::config_type()?),
    })
}

impl<T: ConfigField, S: BuildHasher + Default> ConfigField for IndexMap<String, T, S> {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        string_keyed_map_type::<T>()
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        map_entries(value)?.collect()
    }

    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Map(
            self.iter()
                .map(|(key, item)| (key.clone(), item.to_config_value()))
                .collect::<ConfigMap>(),
        )
    }

    fn restore_markers(&mut self, raw: &ConfigValue) {
        restore_entries(self.iter_mut(), raw);
    }
}

impl<T: ConfigField> ConfigField for BTreeMap<String, T> {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        string_keyed_map_type::<T>()
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        map_entries(value)?.collect()
    }

    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Map(
            self.iter()
                .map(|(key, item)| (key.clone(), item.to_config_value()))
                .collect(),
        )
    }

    fn restore_markers(&mut self, raw: &ConfigValue) {
        restore_entries(self.iter_mut(), raw);
    }
}

impl<T: ConfigField, S: BuildHasher + Default> ConfigField for HashMap<String, T, S> {
    fn config_type() -> Result<ConfigTypeNode, SchemaError> {
        string_keyed_map_type::<T>()
    }

    fn from_config_value(value: ConfigValue) -> Result<Self, ValidationError> {
        map_entries(value)?.collect()
    }

    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Map(
            self.iter()
                .map(|(key, item)| (key.clone(), item.to_config_value()))
                .collect(),
        )
    }

    fn restore_markers(&mut self, raw: &ConfigValue) {
        restore_entries(self.iter_mut(), raw);
    }
}
