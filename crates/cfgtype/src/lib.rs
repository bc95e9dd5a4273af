//! Typed configuration with inferred schemas.
//!
//! `#[derive(Config)]` on a struct produces a static field-descriptor table
//! and the conversions between typed instances and raw [`ConfigValue`] maps.
//! From the descriptors the crate infers a [`SchemaField`] describing the legal
//! raw shape, constructs frozen instances from raw config, and flattens
//! instances back to raw config.
//!
//! ```ignore
//! use cfgtype::{Config, ConfigTypeExt, StringSource};
//!
//! /// Connection settings.
//! #[derive(Debug, Clone, PartialEq, Config)]
//! struct Database {
//!     host: String,
//!     #[config(default = 5432)]
//!     port: i64,
//!     password: StringSource,
//! }
//!
//! let db = Database::from_config_dict(raw)?;
//! let schema = Database::config_schema()?;
//! ```

extern crate self as cfgtype;

pub mod construct;
pub mod descriptor;
pub mod env;
pub mod error;
pub mod field;
pub mod flatten;
pub mod frozen;
pub mod infer;
pub mod schema;
pub mod schema_cache;
pub mod telemetry;
pub mod union;
pub mod value;

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;

pub use construct::{ConfigArg, ConfigArgs};
pub use descriptor::{
    CACHED_METHOD_FIELD_SUFFIX, ConfigKind, FieldDefault, FieldDescriptor, INTERNAL_MARKER,
    IntoFieldDefault, TypeInfo,
};
pub use env::{EnvVar, IntEnvVar, IntSource, StringSource};
pub use error::{ConfigError, SchemaError, ValidationError, ValidationErrorKind};
pub use field::ConfigField;
pub use frozen::{AttributeWriteError, Frozen};
pub use infer::InferOptions;
pub use schema::{ConfigTypeNode, ScalarKind, SchemaField, Selector, Shape};
pub use schema_cache::SchemaCache;
pub use telemetry::init_tracing;
pub use union::UnionCodecError;
pub use value::{ConfigMap, ConfigValue, config_map_from_json};

#[cfg(feature = "derive")]
pub use cfgtype_derive::Config;

/// A structured config type. Implemented by `#[derive(Config)]` on named
/// structs.
pub trait ConfigType: ConfigField + Send + Sync + 'static {
    fn type_info() -> &'static TypeInfo;

    /// Declared fields, in declaration order. Skipped and internal fields are
    /// not listed.
    fn fields() -> &'static [FieldDescriptor];

    /// The validation primitive: build `Self` from a normalized raw map.
    ///
    /// Union fields arrive in flat form and required fields are present,
    /// possibly as null. See [`construct::prepare`].
    fn from_config_map(map: ConfigMap) -> Result<Self, ValidationError>;

    /// Every listed field converted with [`ConfigField::to_config_value`],
    /// keyed by external name. Null values are included.
    fn field_values(&self) -> ConfigMap;

    /// Undeclared keys carried by a permissive type.
    fn extra_values(&self) -> Option<&ConfigMap> {
        None
    }
}

/// Entry points for every [`ConfigType`].
pub trait ConfigTypeExt: ConfigType {
    fn construct(args: impl Into<ConfigArgs>) -> Result<Frozen<Self>, ConfigError> {
        construct::construct(args.into())
    }

    fn from_config_dict(map: ConfigMap) -> Result<Frozen<Self>, ConfigError> {
        construct::construct(ConfigArgs::from(map))
    }

    /// The inferred schema, memoized in [`SchemaCache::global`].
    fn config_schema() -> Result<Arc<SchemaField>, ConfigError> {
        SchemaCache::global().get_or_infer::<Self>(&BTreeSet::new())
    }

    /// The inferred schema without memoization, with options applied.
    fn config_schema_with(options: &InferOptions) -> Result<SchemaField, ConfigError> {
        infer::infer_schema::<Self>(options)
    }

    fn to_fields_dict() -> Result<IndexMap<String, SchemaField>, ConfigError> {
        infer::to_fields_dict::<Self>()
    }

    fn to_config_dict(&self) -> ConfigMap {
        flatten::to_config_dict(self)
    }
}

impl<T: ConfigType> ConfigTypeExt for T {}

/// Support code for `#[derive(Config)]` expansions.
#[doc(hidden)]
pub mod __private {
    use std::collections::BTreeSet;

    pub use indexmap::IndexMap;

    use crate::construct::{ConfigArgs, prepare};
    use crate::descriptor::{FieldDefault, FieldDescriptor};
    use crate::error::{SchemaError, ValidationError};
    use crate::field::ConfigField;
    use crate::schema::ConfigTypeNode;
    use crate::union::{from_selector, is_selector};
    use crate::value::{ConfigMap, ConfigValue};
    use crate::{ConfigType, SchemaCache, infer};

    /// Remove and convert one field from a normalized map.
    pub fn take_field<F: ConfigField>(
        map: &mut ConfigMap,
        field: &FieldDescriptor,
    ) -> Result<F, ValidationError> {
        let raw = match map.shift_remove(field.key()) {
            Some(value) => Some(value),
            None if field.alias.is_some() => map.shift_remove(field.name),
            None => None,
        };

        let value = match raw {
            Some(value) if !value.is_null() || F::OPTIONAL => value,
            _ => missing_value::<F>(field)?,
        };
        F::from_config_value(value).map_err(|err| err.with_path_prefix(field.key()))
    }

    fn missing_value<F: ConfigField>(field: &FieldDescriptor) -> Result<ConfigValue, ValidationError> {
        match field.default_value() {
            Some(FieldDefault::Value(value)) => Ok(value),
            Some(FieldDefault::Legacy(_)) => Err(ValidationError::new(
                crate::ValidationErrorKind::LegacyDefault,
            )
            .with_path_prefix(field.key())),
            None if F::OPTIONAL => Ok(ConfigValue::Null),
            None => Err(ValidationError::missing_field().with_path_prefix(field.key())),
        }
    }

    /// Reject the first key left over after every declared field was taken.
    pub fn deny_unknown(map: ConfigMap) -> Result<(), ValidationError> {
        match map.into_keys().next() {
            Some(key) => Err(ValidationError::unknown_field(key)),
            None => Ok(()),
        }
    }

    /// Re-install markers on one field from its raw value.
    pub fn restore_field<F: ConfigField>(target: &mut F, raw: &ConfigValue, field: &FieldDescriptor) {
        let Some(raw_map) = raw.as_map() else {
            return;
        };
        let Some(raw_value) = raw_map
            .get(field.key())
            .or_else(|| raw_map.get(field.name))
        else {
            return;
        };

        if let Some(discriminator) = F::DISCRIMINATOR
            && is_selector(discriminator, raw_value)
            && let Some(selector) = raw_value.as_map()
            && let Ok(flat) = from_selector(discriminator, selector)
        {
            target.restore_markers(&ConfigValue::Map(flat));
            return;
        }
        target.restore_markers(raw_value);
    }

    /// Schema node of a nested config type, through the global cache.
    pub fn nested_config_type<T: ConfigType>() -> Result<ConfigTypeNode, SchemaError> {
        nested_config_type_omitting::<T>(&[])
    }

    pub fn nested_config_type_omitting<T: ConfigType>(
        omit: &[&str],
    ) -> Result<ConfigTypeNode, SchemaError> {
        if infer::is_inferring::<T>() {
            return Err(SchemaError::unsupported(
                T::type_info().name,
                "refers to itself; recursive config types have no schema",
            ));
        }
        let omit = omit.iter().map(|name| name.to_string()).collect::<BTreeSet<_>>();
        SchemaCache::global()
            .get_or_infer::<T>(&omit)
            .map(|schema| schema.config_type.clone())
            .map_err(|err| SchemaError::Definition(Box::new(err)))
    }

    /// Nested construction: same normalization as the top level.
    pub fn nested_from_config_value<T: ConfigType>(value: ConfigValue) -> Result<T, ValidationError> {
        let ConfigValue::Map(map) = value else {
            return Err(ValidationError::type_mismatch("map", &value));
        };
        let processed = prepare::<T>(ConfigArgs::from(map)).map_err(ValidationError::nested)?;
        T::from_config_map(processed)
    }

    /// Raw form of a nested config value: unions as selectors, markers kept.
    pub fn nested_to_config_value<T: ConfigType>(value: &T) -> ConfigValue {
        ConfigValue::Map(crate::flatten::config_value_map(value))
    }

    /// Read the discriminator of a flat union value.
    pub fn union_variant(value: &ConfigValue, discriminator: &str) -> Result<String, ValidationError> {
        let ConfigValue::Map(map) = value else {
            return Err(ValidationError::type_mismatch("map", value));
        };
        match map.get(discriminator) {
            Some(ConfigValue::String(variant)) => Ok(variant.clone()),
            Some(other) => Err(ValidationError::type_mismatch("string", other)
                .with_path_prefix(discriminator)),
            None => Err(ValidationError::missing_field().with_path_prefix(discriminator)),
        }
    }

    /// Body of a flat union value for variant type `T`. The discriminator is
    /// kept only when `T` declares it as a field.
    pub fn union_body<T: ConfigType>(value: ConfigValue, discriminator: &str) -> Result<T, ValidationError> {
        let ConfigValue::Map(mut map) = value else {
            return Err(ValidationError::type_mismatch("map", &value));
        };
        if crate::descriptor::find_field(T::fields(), discriminator).is_none() {
            map.shift_remove(discriminator);
        }
        nested_from_config_value::<T>(ConfigValue::Map(map))
    }

    /// Flat form of a union value for variant type `T`.
    pub fn union_flat<T: ConfigType>(value: &T, discriminator: &str, variant: &str) -> ConfigValue {
        let mut map = crate::flatten::config_value_map(value);
        map.insert(discriminator.to_string(), ConfigValue::String(variant.to_string()));
        ConfigValue::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A pool.
    #[derive(Debug, Clone, PartialEq, Config)]
    struct Pool {
        #[config(default = 4)]
        size: u32,
        label: Option<String>,
    }

    #[test]
    fn derive_resolves_crate_paths_inside_the_runtime() {
        let pool = Pool::from_config_dict(ConfigMap::new()).unwrap();
        assert_eq!(pool.size, 4);
        assert_eq!(pool.label, None);
        assert_eq!(Pool::type_info().description, Some("A pool."));
    }
}
