//! Instance to raw config conversion.

use tracing::warn;

use crate::descriptor::is_internal_name;
use crate::union::to_selector;
use crate::value::{ConfigMap, ConfigValue};
use crate::ConfigType;

/// Public field values keyed by external name. Null fields are omitted;
/// markers stay markers and union values stay flat.
pub fn public_field_values<T: ConfigType>(value: &T) -> ConfigMap {
    let fields = T::fields();
    value
        .field_values()
        .into_iter()
        .filter(|(key, field_value)| {
            !field_value.is_null()
                && fields
                    .iter()
                    .any(|field| field.key() == key.as_str() && !field.is_internal())
        })
        .collect()
}

/// Raw config for `value` with markers kept in place.
///
/// Union fields are re-encoded in selector form and permissive extras are
/// appended after the declared fields. Null and internal extras are dropped.
pub fn config_value_map<T: ConfigType>(value: &T) -> ConfigMap {
    let mut out = public_field_values(value);

    for field in T::fields() {
        let Some(discriminator) = field.discriminator else {
            continue;
        };
        let Some(ConfigValue::Map(flat)) = out.get(field.key()) else {
            continue;
        };
        match to_selector(discriminator, flat) {
            Ok(selector) => {
                out.insert(field.key().to_string(), ConfigValue::Map(selector));
            }
            Err(err) => {
                warn!(
                    class = T::type_info().name,
                    field = field.name,
                    error = %err,
                    "union value kept in flat form"
                );
            }
        }
    }

    if let Some(extras) = value.extra_values() {
        for (key, extra) in extras {
            if extra.is_null() || is_internal_name(key) {
                continue;
            }
            out.entry(key.clone()).or_insert_with(|| extra.clone());
        }
    }

    out
}

/// Raw config for `value`, with markers rendered as `{"env": <name>}`.
pub fn to_config_dict<T: ConfigType>(value: &T) -> ConfigMap {
    config_value_map(value)
        .into_iter()
        .map(|(key, field_value)| (key, field_value.render_markers()))
        .collect()
}
