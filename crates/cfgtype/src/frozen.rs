//! Immutable config instances.
//!
//! A [`Frozen`] value only hands out shared references to its config. Public
//! attributes can never be reassigned; names ending in `__internal__` go to a
//! side-table owned by the instance and shared by its clones.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::construct::{ConfigArgs, construct};
use crate::descriptor::{CACHED_METHOD_FIELD_SUFFIX, find_field, is_internal_name};
use crate::error::ConfigError;
use crate::flatten::{config_value_map, to_config_dict};
use crate::value::{ConfigMap, ConfigValue};
use crate::ConfigType;

type InternalSlots = RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>;

/// Why a public attribute write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeWriteError {
    /// The attribute exists but the instance is frozen.
    Frozen,
    /// The type declares no such attribute and accepts no extras.
    UnknownField,
}

/// Classify a write of `name` on a frozen `T`.
pub fn attempt_write<T: ConfigType>(name: &str) -> AttributeWriteError {
    if find_field(T::fields(), name).is_some() || T::type_info().permissive {
        AttributeWriteError::Frozen
    } else {
        AttributeWriteError::UnknownField
    }
}

pub struct Frozen<T> {
    inner: Arc<T>,
    internal: Arc<InternalSlots>,
}

impl<T: ConfigType> Frozen<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            internal: Arc::default(),
        }
    }

    pub fn get(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }

    /// Attribute assignment. Only internal names are writable.
    pub fn set_attr(&self, name: &str, value: ConfigValue) -> Result<(), ConfigError> {
        self.set_internal(name, value)
    }

    /// Store an arbitrary value under an internal name.
    pub fn set_internal<V: Any + Send + Sync>(&self, name: &str, value: V) -> Result<(), ConfigError> {
        if !is_internal_name(name) {
            return Err(self.rejected_write(name));
        }
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::new(value));
        Ok(())
    }

    pub fn internal<V: Any + Send + Sync>(&self, name: &str) -> Option<Arc<V>> {
        let slot = self
            .internal
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()?;
        slot.downcast::<V>().ok()
    }

    /// Memoize `init` under `<method>_cached__internal__`.
    pub fn cached<V, F>(&self, method: &str, init: F) -> Arc<V>
    where
        V: Any + Send + Sync,
        F: FnOnce(&T) -> V,
    {
        let key = format!("{method}{CACHED_METHOD_FIELD_SUFFIX}");
        if let Some(hit) = self.internal::<V>(&key) {
            return hit;
        }

        let fresh = Arc::new(init(&self.inner));
        let mut slots = self.internal.write().unwrap_or_else(PoisonError::into_inner);
        let stored = slots
            .entry(key)
            .or_insert_with(|| Arc::clone(&fresh) as Arc<dyn Any + Send + Sync>);
        Arc::clone(stored).downcast::<V>().unwrap_or(fresh)
    }

    /// A new instance with `name` replaced by `value`, built through the
    /// regular construction path.
    pub fn with_field(
        &self,
        name: &str,
        value: impl Into<ConfigValue>,
    ) -> Result<Frozen<T>, ConfigError> {
        let mut raw = config_value_map(self.get());
        let key = match find_field(T::fields(), name) {
            Some(field) => {
                raw.shift_remove(field.name);
                field.key()
            }
            None if T::type_info().permissive => name,
            None => {
                return Err(ConfigError::UndeclaredField {
                    class: T::type_info().name,
                    field: name.to_string(),
                    kind: T::type_info().kind,
                });
            }
        };
        raw.insert(key.to_string(), value.into());
        construct(ConfigArgs::from(raw))
    }

    pub fn to_config_dict(&self) -> ConfigMap {
        to_config_dict(self.get())
    }

    fn rejected_write(&self, name: &str) -> ConfigError {
        let info = T::type_info();
        let error = match attempt_write::<T>(name) {
            AttributeWriteError::Frozen => ConfigError::ImmutableWrite {
                class: info.name,
                kind: info.kind,
            },
            AttributeWriteError::UnknownField => ConfigError::UndeclaredField {
                class: info.name,
                field: name.to_string(),
                kind: info.kind,
            },
        };
        debug!(class = info.name, attribute = name, "attribute write rejected");
        error
    }
}

impl<T> Deref for Frozen<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> Clone for Frozen<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            internal: Arc::clone(&self.internal),
        }
    }
}

impl<T: PartialEq> PartialEq for Frozen<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Frozen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}
