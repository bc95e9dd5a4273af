//! Generic config schema nodes.
//!
//! The inferencer translates a `#[derive(Config)]` type into a tree of
//! [`ConfigTypeNode`]s wrapped in [`SchemaField`]s. The tree only describes the
//! legal shape of raw configuration; checking raw data against it is left to
//! consumers.

use std::fmt;

use indexmap::IndexMap;

use crate::descriptor::{FieldDefault, FieldDescriptor};
use crate::error::SchemaError;
use crate::union::to_selector;
use crate::value::ConfigValue;

/// Leaf scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Float,
    Bool,
    String,
    /// Any raw value; used for untyped passthrough fields.
    Any,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Int => "Int",
            ScalarKind::Float => "Float",
            ScalarKind::Bool => "Bool",
            ScalarKind::String => "String",
            ScalarKind::Any => "Any",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigTypeNode {
    Scalar(ScalarKind),
    /// A string, or an `{"env": <name>}` reference to one.
    StringSource,
    /// An int, or an `{"env": <name>}` reference to one.
    IntSource,
    /// One of a fixed set of symbolic names.
    Enum {
        name: &'static str,
        values: Vec<String>,
    },
    Array(Box<ConfigTypeNode>),
    Map {
        key: ScalarKind,
        value: Box<ConfigTypeNode>,
    },
    /// Accepts null in addition to the inner type.
    Noneable(Box<ConfigTypeNode>),
    Shape(Shape),
    Selector(Selector),
}

impl ConfigTypeNode {
    pub fn is_noneable(&self) -> bool {
        matches!(self, ConfigTypeNode::Noneable(_))
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            ConfigTypeNode::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_selector(&self) -> Option<&Selector> {
        match self {
            ConfigTypeNode::Selector(selector) => Some(selector),
            _ => None,
        }
    }
}

/// A record of named fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub fields: IndexMap<String, SchemaField>,
    /// Keys outside `fields` are accepted.
    pub permissive: bool,
    pub description: Option<String>,
}

/// A mapping that must contain exactly one of `fields`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    pub fields: IndexMap<String, SchemaField>,
    pub description: Option<String>,
}

/// A schema node plus its requiredness, default and description.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub config_type: ConfigTypeNode,
    pub is_required: bool,
    pub default_value: Option<ConfigValue>,
    pub description: Option<String>,
}

impl SchemaField {
    /// A required field with no default.
    pub fn new(config_type: ConfigTypeNode) -> Self {
        Self {
            config_type,
            is_required: true,
            default_value: None,
            description: None,
        }
    }

    pub fn optional(config_type: ConfigTypeNode) -> Self {
        Self {
            is_required: false,
            ..Self::new(config_type)
        }
    }

    /// A field with a default is never required.
    pub fn with_default(mut self, default: ConfigValue) -> Self {
        self.is_required = false;
        self.default_value = Some(default);
        self
    }

    pub fn with_description(mut self, description: Option<impl Into<String>>) -> Self {
        self.description = description.map(Into::into);
        self
    }
}

/// Convert one field descriptor into a schema field.
///
/// Requiredness: a declared default makes the field optional with that
/// default; a noneable type makes it optional without one.
pub fn convert_field(field: &FieldDescriptor) -> Result<SchemaField, SchemaError> {
    let config_type = (field.config_type)()?;
    let default = match field.default_value() {
        Some(FieldDefault::Value(value)) => Some(selector_default(field, value)),
        Some(FieldDefault::Legacy(_)) | None => None,
    };
    let description = field.description.map(|d| d.trim().to_string());

    let schema_field = match default {
        Some(value) => SchemaField::new(config_type).with_default(value.render_markers()),
        None if config_type.is_noneable() || !field.required => SchemaField::optional(config_type),
        None => SchemaField::new(config_type),
    };
    Ok(schema_field.with_description(description))
}

/// Union defaults are stored flat; the schema shows them in selector form.
fn selector_default(field: &FieldDescriptor, value: ConfigValue) -> ConfigValue {
    let selector = match (field.discriminator, &value) {
        (Some(discriminator), ConfigValue::Map(flat)) => to_selector(discriminator, flat).ok(),
        _ => None,
    };
    selector.map(ConfigValue::Map).unwrap_or(value)
}

impl fmt::Display for ConfigTypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}

impl fmt::Display for SchemaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, &self.config_type, 0)
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &ConfigTypeNode, depth: usize) -> fmt::Result {
    match node {
        ConfigTypeNode::Scalar(kind) => f.write_str(kind.name()),
        ConfigTypeNode::StringSource => f.write_str("StringSource"),
        ConfigTypeNode::IntSource => f.write_str("IntSource"),
        ConfigTypeNode::Enum { name, values } => write!(f, "Enum {name}[{}]", values.join(", ")),
        ConfigTypeNode::Array(inner) => {
            f.write_str("[")?;
            write_node(f, inner, depth)?;
            f.write_str("]")
        }
        ConfigTypeNode::Map { key, value } => {
            write!(f, "{{{}: ", key.name())?;
            write_node(f, value, depth)?;
            f.write_str("}")
        }
        ConfigTypeNode::Noneable(inner) => {
            f.write_str("Noneable(")?;
            write_node(f, inner, depth)?;
            f.write_str(")")
        }
        ConfigTypeNode::Shape(shape) => {
            let label = if shape.permissive {
                "PermissiveShape"
            } else {
                "Shape"
            };
            write_fields(f, label, &shape.fields, depth)
        }
        ConfigTypeNode::Selector(selector) => write_fields(f, "Selector", &selector.fields, depth),
    }
}

fn write_fields(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    fields: &IndexMap<String, SchemaField>,
    depth: usize,
) -> fmt::Result {
    writeln!(f, "{label} {{")?;
    let indent = "  ".repeat(depth + 1);
    for (name, field) in fields {
        let marker = if field.is_required { "" } else { "?" };
        write!(f, "{indent}{name}{marker}: ")?;
        write_node(f, &field.config_type, depth + 1)?;
        if let Some(default) = &field.default_value {
            write!(f, " = {}", default.describe())?;
        }
        writeln!(f)?;
    }
    write!(f, "{}}}", "  ".repeat(depth))
}
