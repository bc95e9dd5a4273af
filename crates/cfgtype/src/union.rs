//! Discriminated-union encoding.
//!
//! A union value is a flat map carrying a discriminator key. In raw config the
//! same value is a single-key selector map `{<discriminator value>: <rest>}`.
//! [`to_selector`] and [`from_selector`] convert between the two and are
//! mutual inverses.

use crate::value::{ConfigMap, ConfigValue};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnionCodecError {
    #[error("discriminator '{key}' is missing")]
    MissingDiscriminator { key: String },

    #[error("discriminator '{key}' must be a string, got {got}")]
    NonStringDiscriminator { key: String, got: String },

    #[error("selector must have exactly one key, got {keys:?}")]
    NotSingleKey { keys: Vec<String> },

    #[error("selector body for '{variant}' must be a mapping, got {got}")]
    BodyNotMapping { variant: String, got: String },
}

/// Flat union map to selector form.
pub fn to_selector(discriminator_key: &str, flat: &ConfigMap) -> Result<ConfigMap, UnionCodecError> {
    let mut rest = flat.clone();
    let variant = match rest.shift_remove(discriminator_key) {
        Some(ConfigValue::String(variant)) => variant,
        Some(other) => {
            return Err(UnionCodecError::NonStringDiscriminator {
                key: discriminator_key.to_string(),
                got: other.describe(),
            });
        }
        None => {
            return Err(UnionCodecError::MissingDiscriminator {
                key: discriminator_key.to_string(),
            });
        }
    };

    let mut selector = ConfigMap::with_capacity(1);
    selector.insert(variant, ConfigValue::Map(rest));
    Ok(selector)
}

/// Selector form back to a flat union map.
pub fn from_selector(
    discriminator_key: &str,
    selector: &ConfigMap,
) -> Result<ConfigMap, UnionCodecError> {
    let mut entries = selector.iter();
    let (variant, body) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(UnionCodecError::NotSingleKey {
                keys: selector.keys().cloned().collect(),
            });
        }
    };

    let ConfigValue::Map(body) = body else {
        return Err(UnionCodecError::BodyNotMapping {
            variant: variant.clone(),
            got: body.describe(),
        });
    };

    let mut flat = body.clone();
    flat.insert(
        discriminator_key.to_string(),
        ConfigValue::String(variant.clone()),
    );
    Ok(flat)
}

/// Whether `value` already has selector form for `discriminator_key`.
pub fn is_selector(discriminator_key: &str, value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Map(map) => {
            map.len() == 1
                && !map.contains_key(discriminator_key)
                && map.values().all(|body| matches!(body, ConfigValue::Map(_)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::config_map_from_json;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn encodes_and_decodes() {
        let flat = config_map_from_json(json!({"pet_type": "cat", "meows": 2}));
        let selector = to_selector("pet_type", &flat).unwrap();
        assert_eq!(selector, config_map_from_json(json!({"cat": {"meows": 2}})));
        assert_eq!(from_selector("pet_type", &selector).unwrap(), flat);
    }

    #[test]
    fn rejects_missing_discriminator() {
        let flat = config_map_from_json(json!({"meows": 2}));
        assert_eq!(
            to_selector("pet_type", &flat),
            Err(UnionCodecError::MissingDiscriminator {
                key: "pet_type".into()
            })
        );
    }

    #[test]
    fn rejects_multi_key_selector() {
        let selector = config_map_from_json(json!({"cat": {}, "dog": {}}));
        assert!(matches!(
            from_selector("pet_type", &selector),
            Err(UnionCodecError::NotSingleKey { keys }) if keys == ["cat", "dog"]
        ));
    }

    #[test]
    fn rejects_scalar_body() {
        let selector = config_map_from_json(json!({"cat": 3}));
        assert!(matches!(
            from_selector("pet_type", &selector),
            Err(UnionCodecError::BodyNotMapping { .. })
        ));
    }

    proptest! {
        #[test]
        fn selector_round_trip(
            variant in "[a-z]{1,8}",
            fields in proptest::collection::btree_map("[a-z]{1,6}", any::<i64>(), 0..6),
        ) {
            let mut flat = ConfigMap::new();
            for (key, value) in fields {
                if key != "kind" {
                    flat.insert(key, ConfigValue::Int(value));
                }
            }
            flat.insert("kind".into(), ConfigValue::String(variant.clone()));

            let selector = to_selector("kind", &flat).unwrap();
            prop_assert_eq!(selector.len(), 1);
            prop_assert!(selector.contains_key(&variant));
            prop_assert_eq!(from_selector("kind", &selector).unwrap(), flat);
        }
    }
}
