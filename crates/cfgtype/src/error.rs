//! Error types.
//!
//! [`ConfigError`] is what callers see. [`ValidationError`] is the structured
//! failure of the per-type validation primitive and carries the path to the
//! offending value. [`SchemaError`] is returned by schema-field conversion.

use crate::descriptor::ConfigKind;

/// Failure surfaced by construction, attribute writes and schema inference.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A declared field was written after construction.
    #[error("{}", immutable_write_message(.class, .kind))]
    ImmutableWrite { class: &'static str, kind: ConfigKind },

    /// A write or construction referenced a name with no field descriptor.
    #[error("{}", undeclared_field_message(.class, .field, .kind))]
    UndeclaredField {
        class: &'static str,
        field: String,
        kind: ConfigKind,
    },

    /// A discriminated-union payload is not a single-key selector mapping.
    #[error(
        "'{class}.{field}' is a discriminated union and must be a mapping with exactly one key, \
         the value of discriminator '{discriminator}'; got {got}. Check the discriminator key."
    )]
    MalformedUnionValue {
        class: &'static str,
        field: String,
        discriminator: String,
        got: String,
    },

    /// A discriminated-union payload has more than one top-level key.
    #[error(
        "'{class}.{field}' is a discriminated union and must have exactly one key, \
         the value of discriminator '{discriminator}'; got keys {keys:?}. Check the discriminator key."
    )]
    DuplicateUnionKey {
        class: &'static str,
        field: String,
        discriminator: String,
        keys: Vec<String>,
    },

    /// A schema-field object was used as a field default.
    #[error(
        "'{class}.{field}' uses a schema field object as its default. Schema field objects \
         belong to hand-written config schemas; declare the default with #[config(default = ...)] instead."
    )]
    LegacyFieldMisuse { class: &'static str, field: String },

    /// A field type cannot be translated to a schema node.
    #[error("{}", schema_definition_message(.class, .field, .invalid_type, .reason, .is_resource))]
    SchemaDefinition {
        class: &'static str,
        field: String,
        invalid_type: String,
        reason: String,
        is_resource: bool,
    },

    /// The validation primitive rejected the processed input.
    #[error("invalid value for '{class}': {source}")]
    Validation {
        class: &'static str,
        #[source]
        source: ValidationError,
    },
}

fn immutable_write_message(class: &str, kind: &ConfigKind) -> String {
    match kind {
        ConfigKind::Resource => format!(
            "'{class}' is a resource and does not support item assignment, as its instances are \
             frozen. If trying to maintain state on this resource, consider building a separate, \
             stateful client type, and provide a method on the resource to construct and return \
             the stateful client."
        ),
        ConfigKind::Config => format!(
            "'{class}' is a config type and does not support item assignment, as its instances \
             are frozen."
        ),
    }
}

fn undeclared_field_message(class: &str, field: &str, kind: &ConfigKind) -> String {
    match kind {
        ConfigKind::Resource => format!(
            "'{class}' is a resource and does not support manipulating undeclared attribute \
             '{field}', as it does not accept extra fields. If trying to maintain state on this \
             resource, consider building a separate, stateful client type, and provide a method \
             on the resource to construct and return the stateful client."
        ),
        ConfigKind::Config => format!(
            "'{class}' is a config type and does not support manipulating undeclared attribute \
             '{field}', as it does not accept extra fields."
        ),
    }
}

fn schema_definition_message(
    class: &str,
    field: &str,
    invalid_type: &str,
    reason: &str,
    is_resource: &bool,
) -> String {
    let noun = if *is_resource { "resource" } else { "config type" };
    format!(
        "Error defining {noun} '{class}': field '{field}' has type '{invalid_type}', which cannot \
         be used in a config schema ({reason}). Use a scalar, Option, Vec, string-keyed map, \
         enum, or another #[derive(Config)] type."
    )
}

/// Structured failure of the validation primitive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} at {}", .kind, render_path(.path))]
pub struct ValidationError {
    /// Field path from the root, outermost first.
    pub path: Vec<String>,
    pub kind: ValidationErrorKind,
}

/// Tag identifying what the validation primitive rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationErrorKind {
    #[error("field required")]
    MissingField,

    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("field given more than once, as {names:?}")]
    DuplicateField { names: Vec<String> },

    #[error("expected {expected}, got {got}")]
    TypeMismatch { expected: &'static str, got: String },

    #[error("unknown variant '{got}', expected one of {expected:?}")]
    UnknownVariant { got: String, expected: Vec<String> },

    #[error("{got} is out of range for {expected}")]
    OutOfRange { expected: &'static str, got: String },

    #[error("default is a schema field object, not a value")]
    LegacyDefault,

    #[error("{0}")]
    Nested(Box<ConfigError>),
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind) -> Self {
        Self {
            path: Vec::new(),
            kind,
        }
    }

    pub fn missing_field() -> Self {
        Self::new(ValidationErrorKind::MissingField)
    }

    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::UnknownField {
            field: field.into(),
        })
    }

    pub fn duplicate_field(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::DuplicateField {
            names: vec![first.into(), second.into()],
        })
    }

    pub fn type_mismatch(expected: &'static str, got: &crate::ConfigValue) -> Self {
        Self::new(ValidationErrorKind::TypeMismatch {
            expected,
            got: got.describe(),
        })
    }

    pub fn unknown_variant(got: impl Into<String>, expected: &[&str]) -> Self {
        Self::new(ValidationErrorKind::UnknownVariant {
            got: got.into(),
            expected: expected.iter().map(|v| v.to_string()).collect(),
        })
    }

    pub fn out_of_range(expected: &'static str, got: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::OutOfRange {
            expected,
            got: got.into(),
        })
    }

    pub fn nested(error: ConfigError) -> Self {
        Self::new(ValidationErrorKind::Nested(Box::new(error)))
    }

    /// Prepend a path segment; errors are built innermost first.
    pub fn with_path_prefix(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    pub fn path_string(&self) -> String {
        render_path(&self.path)
    }
}

fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(".")
    }
}

/// Failure converting a field type into a schema node.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// The type has no config schema representation.
    #[error("unsupported type '{type_name}': {reason}")]
    UnsupportedType {
        type_name: &'static str,
        reason: &'static str,
    },

    /// A nested config type failed to define its own schema.
    #[error(transparent)]
    Definition(Box<ConfigError>),
}

impl SchemaError {
    pub fn unsupported(type_name: &'static str, reason: &'static str) -> Self {
        SchemaError::UnsupportedType { type_name, reason }
    }
}
