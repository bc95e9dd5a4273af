//! Instance construction from raw config.
//!
//! Raw input is normalized before the type's validation primitive sees it:
//! nulls for optional fields are dropped, union selectors are decoded back to
//! their flat form, and absent required fields become explicit nulls. After
//! validation, indirection markers from the input are re-installed on the
//! built value.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::descriptor::{FieldDescriptor, find_field};
use crate::error::{ConfigError, ValidationError, ValidationErrorKind};
use crate::field::ConfigField;
use crate::frozen::Frozen;
use crate::union::{UnionCodecError, from_selector, to_selector};
use crate::value::{ConfigMap, ConfigValue};
use crate::ConfigType;

/// One construction argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigArg {
    /// Raw config, exactly as it would appear in a config document.
    Raw(ConfigValue),
    /// A typed value already converted with [`ConfigField::to_config_value`].
    Instance(ConfigValue),
}

impl ConfigArg {
    fn into_value(self) -> (ConfigValue, bool) {
        match self {
            ConfigArg::Raw(value) => (value, false),
            ConfigArg::Instance(value) => (value, true),
        }
    }
}

/// Keyword-style construction input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigArgs {
    entries: IndexMap<String, ConfigArg>,
}

impl ConfigArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.entries
            .insert(key.into(), ConfigArg::Raw(value.into()));
        self
    }

    pub fn instance<V: ConfigField>(mut self, key: impl Into<String>, value: &V) -> Self {
        self.entries
            .insert(key.into(), ConfigArg::Instance(value.to_config_value()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<ConfigMap> for ConfigArgs {
    fn from(map: ConfigMap) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(key, value)| (key, ConfigArg::Raw(value)))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for ConfigArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ConfigArgs::new(), |args, (key, value)| args.set(key, value))
    }
}

/// Construct a frozen `T` from keyword-style arguments.
#[tracing::instrument(
    name = "cfgtype.construct",
    level = "debug",
    skip(args),
    fields(class = T::type_info().name, args = args.len())
)]
pub fn construct<T: ConfigType>(args: ConfigArgs) -> Result<Frozen<T>, ConfigError> {
    let processed = prepare::<T>(args)?;
    let class = T::type_info().name;

    let mut value = T::from_config_map(processed.clone()).map_err(|err| match err {
        ValidationError {
            path,
            kind: ValidationErrorKind::UnknownField { field },
        } if path.is_empty() => ConfigError::UndeclaredField {
            class,
            field,
            kind: T::type_info().kind,
        },
        source => ConfigError::Validation { class, source },
    })?;

    let processed = ConfigValue::Map(processed);
    if processed.contains_marker() {
        trace!("re-installing indirection markers");
    }
    value.restore_markers(&processed);

    debug!("config constructed");
    Ok(Frozen::new(value))
}

/// Normalize raw arguments for `T`'s validation primitive.
///
/// Unknown keys pass through untouched; the primitive decides whether they
/// are legal. A field given under both its name and its alias is rejected.
pub fn prepare<T: ConfigType>(args: ConfigArgs) -> Result<ConfigMap, ConfigError> {
    let class = T::type_info().name;
    let fields = T::fields();
    let mut out = ConfigMap::with_capacity(args.len());
    let mut given = HashMap::with_capacity(args.len());

    for (key, arg) in args.entries {
        let (value, is_instance) = arg.into_value();
        let Some(field) = find_field(fields, &key) else {
            out.insert(key, value);
            continue;
        };
        if let Some(first) = given.insert(field.name, key.clone()) {
            return Err(ConfigError::Validation {
                class,
                source: ValidationError::duplicate_field(first, key),
            });
        }

        if !field.required && value.is_null() {
            continue;
        }

        let value = match field.discriminator {
            Some(discriminator) if !value.is_null() => {
                decode_union_value(class, field, discriminator, value, is_instance)?
            }
            _ => value,
        };
        out.insert(field.key().to_string(), value);
    }

    for field in fields {
        if field.required && !field.is_internal() && !out.contains_key(field.key()) {
            out.insert(field.key().to_string(), ConfigValue::Null);
        }
    }

    Ok(out)
}

fn decode_union_value(
    class: &'static str,
    field: &FieldDescriptor,
    discriminator: &str,
    value: ConfigValue,
    is_instance: bool,
) -> Result<ConfigValue, ConfigError> {
    let malformed = |got: &ConfigValue| ConfigError::MalformedUnionValue {
        class,
        field: field.name.to_string(),
        discriminator: discriminator.to_string(),
        got: got.describe(),
    };

    let selector = match &value {
        ConfigValue::Map(flat) if is_instance => {
            to_selector(discriminator, flat).map_err(|_| malformed(&value))?
        }
        ConfigValue::Map(selector) if selector.len() > 1 => {
            return Err(ConfigError::DuplicateUnionKey {
                class,
                field: field.name.to_string(),
                discriminator: discriminator.to_string(),
                keys: selector.keys().cloned().collect(),
            });
        }
        ConfigValue::Map(selector) if selector.len() == 1 => selector.clone(),
        other => return Err(malformed(other)),
    };

    match from_selector(discriminator, &selector) {
        Ok(flat) => Ok(ConfigValue::Map(flat)),
        Err(UnionCodecError::NotSingleKey { keys }) => Err(ConfigError::DuplicateUnionKey {
            class,
            field: field.name.to_string(),
            discriminator: discriminator.to_string(),
            keys,
        }),
        Err(_) => Err(malformed(&value)),
    }
}
