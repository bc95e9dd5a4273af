//! Memoized schema inference.
//!
//! Entries are keyed by the config type and the set of omitted field names.
//! Each entry is computed at most once; concurrent requests for the same key
//! block on the first computation. The cache is unbounded and only shrinks on
//! [`SchemaCache::clear`].

use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock, OnceLock, PoisonError, RwLock};

use tracing::trace;

use crate::error::ConfigError;
use crate::infer::{InferOptions, infer_schema};
use crate::schema::SchemaField;
use crate::ConfigType;

type CacheKey = (TypeId, BTreeSet<String>);
type CachedSchema = Result<Arc<SchemaField>, ConfigError>;
type CacheSlot = Arc<OnceLock<CachedSchema>>;

static GLOBAL: LazyLock<SchemaCache> = LazyLock::new(SchemaCache::new);

#[derive(Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<CacheKey, CacheSlot>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache behind [`ConfigTypeExt::config_schema`](crate::ConfigTypeExt::config_schema).
    pub fn global() -> &'static SchemaCache {
        &GLOBAL
    }

    #[tracing::instrument(
        name = "cfgtype.schema_cache.get_or_infer",
        level = "debug",
        skip(self, fields_to_omit),
        fields(class = T::type_info().name, omitted = fields_to_omit.len())
    )]
    pub fn get_or_infer<T: ConfigType>(&self, fields_to_omit: &BTreeSet<String>) -> CachedSchema {
        let key = (TypeId::of::<T>(), fields_to_omit.clone());
        let slot = self.slot(key);
        let mut computed = false;
        let result = slot.get_or_init(|| {
            computed = true;
            let options = InferOptions::builder()
                .fields_to_omit(fields_to_omit.clone())
                .build();
            infer_schema::<T>(&options).map(Arc::new)
        });
        trace!(hit = !computed, "schema cache lookup complete");
        result.clone()
    }

    /// Whether an entry exists for `T` with exactly `fields_to_omit`.
    pub fn contains<T: ConfigType>(&self, fields_to_omit: &BTreeSet<String>) -> bool {
        let key = (TypeId::of::<T>(), fields_to_omit.clone());
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .is_some_and(|slot| slot.get().is_some())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn slot(&self, key: CacheKey) -> CacheSlot {
        if let Some(slot) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(slot);
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(entries.entry(key).or_default())
    }
}
