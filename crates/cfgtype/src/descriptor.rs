//! Static per-type and per-field metadata generated by `#[derive(Config)]`.

use crate::error::SchemaError;
use crate::field::ConfigField;
use crate::schema::{ConfigTypeNode, SchemaField};
use crate::value::ConfigValue;

/// Suffix reserved for internal, non-schema attributes.
pub const INTERNAL_MARKER: &str = "__internal__";

/// Suffix used for memoized method results; ends with [`INTERNAL_MARKER`].
pub const CACHED_METHOD_FIELD_SUFFIX: &str = "_cached__internal__";

const _: () = assert!(str_ends_with(CACHED_METHOD_FIELD_SUFFIX, INTERNAL_MARKER));

const fn str_ends_with(value: &str, suffix: &str) -> bool {
    let value = value.as_bytes();
    let suffix = suffix.as_bytes();
    if suffix.len() > value.len() {
        return false;
    }
    let offset = value.len() - suffix.len();
    let mut i = 0;
    while i < suffix.len() {
        if value[offset + i] != suffix[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// Whether `name` addresses an internal attribute.
pub fn is_internal_name(name: &str) -> bool {
    name.ends_with(INTERNAL_MARKER)
}

/// Whether a config type is plain configuration or a long-lived resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Config,
    Resource,
}

/// Type-level metadata.
#[derive(Debug)]
pub struct TypeInfo {
    pub name: &'static str,
    /// Doc comment or `#[config(description = ...)]`.
    pub description: Option<&'static str>,
    /// Undeclared keys are accepted and carried through verbatim.
    pub permissive: bool,
    pub kind: ConfigKind,
}

/// A field default as declared on the type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    Value(ConfigValue),
    /// A schema field object used where a value belongs. Always a definition error.
    Legacy(Box<SchemaField>),
}

/// Conversion for `#[config(default = expr)]` expressions.
pub trait IntoFieldDefault {
    fn into_field_default(self) -> FieldDefault;
}

impl<T: ConfigField> IntoFieldDefault for T {
    fn into_field_default(self) -> FieldDefault {
        FieldDefault::Value(self.to_config_value())
    }
}

impl IntoFieldDefault for &str {
    fn into_field_default(self) -> FieldDefault {
        FieldDefault::Value(ConfigValue::String(self.to_string()))
    }
}

impl IntoFieldDefault for SchemaField {
    fn into_field_default(self) -> FieldDefault {
        FieldDefault::Legacy(Box::new(self))
    }
}

/// Static metadata for one declared field.
#[derive(Debug)]
pub struct FieldDescriptor {
    /// Rust field name.
    pub name: &'static str,
    /// External name, if different from `name`.
    pub alias: Option<&'static str>,
    /// Declared type as written in source.
    pub type_name: &'static str,
    /// No default and the type does not accept absence.
    pub required: bool,
    pub default: Option<fn() -> FieldDefault>,
    /// Discriminator key, for union-typed fields only.
    pub discriminator: Option<&'static str>,
    pub description: Option<&'static str>,
    /// Wired at another layer; never part of the config schema.
    pub is_resource: bool,
    pub config_type: fn() -> Result<ConfigTypeNode, SchemaError>,
    pub meta: &'static [(&'static str, &'static str)],
}

impl FieldDescriptor {
    /// The name used in raw config and in schemas.
    pub fn key(&self) -> &'static str {
        self.alias.unwrap_or(self.name)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.alias == Some(name)
    }

    pub fn is_internal(&self) -> bool {
        is_internal_name(self.name)
    }

    pub fn default_value(&self) -> Option<FieldDefault> {
        self.default.map(|default| default())
    }

    pub fn meta(&self, key: &str) -> Option<&'static str> {
        self.meta
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, value)| *value)
    }
}

/// Find a descriptor by external key or Rust name.
pub fn find_field<'a>(
    fields: &'a [FieldDescriptor],
    name: &str,
) -> Option<&'a FieldDescriptor> {
    fields
        .iter()
        .find(|field| field.key() == name)
        .or_else(|| fields.iter().find(|field| field.matches(name)))
}
