//! Schema inference from field descriptors.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::BTreeSet;

use bon::Builder;
use indexmap::IndexMap;
use tracing::debug;

use crate::descriptor::{ConfigKind, FieldDefault, FieldDescriptor};
use crate::error::{ConfigError, SchemaError};
use crate::schema::{ConfigTypeNode, SchemaField, Shape, convert_field};
use crate::ConfigType;

#[derive(Debug, Clone, Default, Builder)]
pub struct InferOptions {
    /// Replaces the type's doc comment as the schema description.
    #[builder(into)]
    pub description: Option<String>,
    /// Field names (or aliases) left out of the schema.
    #[builder(default)]
    pub fields_to_omit: BTreeSet<String>,
}

thread_local! {
    static INFERRING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

struct InferringGuard;

impl InferringGuard {
    fn enter<T: 'static>() -> Self {
        INFERRING.with(|stack| stack.borrow_mut().push(TypeId::of::<T>()));
        InferringGuard
    }
}

impl Drop for InferringGuard {
    fn drop(&mut self) {
        INFERRING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Whether inference of `T` is in progress on this thread.
pub(crate) fn is_inferring<T: 'static>() -> bool {
    INFERRING.with(|stack| stack.borrow().contains(&TypeId::of::<T>()))
}

/// Build the schema field for config type `T`.
///
/// Resource fields and fields named in `fields_to_omit` are skipped. The
/// result is required iff at least one remaining field is required.
#[tracing::instrument(
    name = "cfgtype.infer_schema",
    level = "debug",
    skip(options),
    fields(class = T::type_info().name)
)]
pub fn infer_schema<T: ConfigType>(options: &InferOptions) -> Result<SchemaField, ConfigError> {
    let _guard = InferringGuard::enter::<T>();
    let info = T::type_info();

    let mut fields = IndexMap::new();
    for field in T::fields() {
        if field.is_internal() || field.is_resource || is_omitted(field, &options.fields_to_omit) {
            continue;
        }

        if let Some(FieldDefault::Legacy(_)) = field.default_value() {
            return Err(ConfigError::LegacyFieldMisuse {
                class: info.name,
                field: field.name.to_string(),
            });
        }

        let schema_field = convert_field(field).map_err(|err| match err {
            SchemaError::UnsupportedType { type_name, reason } => ConfigError::SchemaDefinition {
                class: info.name,
                field: field.name.to_string(),
                invalid_type: field.type_name.to_string(),
                reason: if type_name == field.type_name {
                    reason.to_string()
                } else {
                    format!("{type_name} {reason}")
                },
                is_resource: info.kind == ConfigKind::Resource,
            },
            SchemaError::Definition(inner) => *inner,
        })?;
        fields.insert(field.key().to_string(), schema_field);
    }

    let is_required = fields.values().any(|field| field.is_required);
    let description = options
        .description
        .clone()
        .or_else(|| info.description.map(|doc| doc.trim().to_string()))
        .filter(|doc| !doc.is_empty());
    debug!(
        fields = fields.len(),
        is_required,
        permissive = info.permissive,
        "schema inferred"
    );

    Ok(SchemaField {
        config_type: ConfigTypeNode::Shape(Shape {
            fields,
            permissive: info.permissive,
            description: description.clone(),
        }),
        is_required,
        default_value: None,
        description,
    })
}

fn is_omitted(field: &FieldDescriptor, fields_to_omit: &BTreeSet<String>) -> bool {
    fields_to_omit.contains(field.name) || fields_to_omit.contains(field.key())
}

/// The shape fields of `T`'s default schema, through the global cache.
pub fn to_fields_dict<T: ConfigType>() -> Result<IndexMap<String, SchemaField>, ConfigError> {
    let schema = crate::SchemaCache::global().get_or_infer::<T>(&BTreeSet::new())?;
    Ok(match &schema.config_type {
        ConfigTypeNode::Shape(shape) => shape.fields.clone(),
        _ => IndexMap::new(),
    })
}
