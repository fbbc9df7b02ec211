//! Canonical-name to table-descriptor resolution.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use super::types::TableDescriptor;
use crate::config::StoreConfig;
use crate::entity::Canon;

/// Descriptors the resolver keeps around. Descriptors are immutable and a
/// given canonical name always resolves to the same value, so the bound
/// only limits memory, never correctness.
const CACHE_CAPACITY: usize = 256;

/// Maps canonical entity names to physical table descriptors.
///
/// Explicit configuration is looked up over the canon's candidate keys in
/// priority order (full key first, degrading to the bare kind name); with
/// no configured hit the descriptor is derived from the canonical name.
/// Results are memoized by the full canonical key; the first resolution
/// wins for the process lifetime.
pub struct TableResolver {
    config: Arc<StoreConfig>,
    cache: Mutex<LruCache<String, Arc<TableDescriptor>>>,
}

impl TableResolver {
    pub fn new(config: Arc<StoreConfig>) -> Self {
        Self {
            config,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("non-zero cache capacity"),
            )),
        }
    }

    /// Resolves the table layout for an entity kind.
    pub fn resolve(&self, canon: &Canon) -> Arc<TableDescriptor> {
        let cache_key = canon.key();

        let mut cache = self.cache.lock().expect("table cache poisoned");
        if let Some(table) = cache.get(&cache_key) {
            return Arc::clone(table);
        }

        let table = Arc::new(self.build(canon));
        cache.put(cache_key, Arc::clone(&table));
        table
    }

    fn build(&self, canon: &Canon) -> TableDescriptor {
        for candidate in canon.candidates() {
            if let Some(entity) = self.config.entity.get(&candidate) {
                if let Some(table) = &entity.table {
                    return TableDescriptor::from_config(canon, table);
                }
            }
        }
        TableDescriptor::derived(canon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityConfig, KeyConfig, TableConfig};

    fn resolver(config: StoreConfig) -> TableResolver {
        TableResolver::new(Arc::new(config))
    }

    #[test]
    fn test_exact_candidate_wins() {
        let config = StoreConfig::new()
            .with_entity(
                "z/test/foo",
                EntityConfig::new().with_table(TableConfig::new().with_name("zoned")),
            )
            .with_entity(
                "test/foo",
                EntityConfig::new().with_table(TableConfig::new().with_name("based")),
            );

        let resolver = resolver(config);
        let canon = Canon::new("foo").with_base("test").with_zone("z");
        assert_eq!(resolver.resolve(&canon).name, "zoned");
    }

    #[test]
    fn test_degrades_to_shorter_key() {
        let config = StoreConfig::new().with_entity(
            "foo",
            EntityConfig::new().with_table(
                TableConfig::new()
                    .with_name("shared_foo")
                    .with_key(KeyConfig::partition("pk")),
            ),
        );

        let resolver = resolver(config);
        let canon = Canon::new("foo").with_base("test").with_zone("z");
        let table = resolver.resolve(&canon);
        assert_eq!(table.name, "shared_foo");
        assert_eq!(table.partition_key, "pk");
    }

    #[test]
    fn test_derives_without_config() {
        let resolver = resolver(StoreConfig::new());
        let table = resolver.resolve(&Canon::new("bar").with_base("moon"));
        assert_eq!(table.name, "moon_bar");
        assert_eq!(table.partition_key, "id");
    }

    #[test]
    fn test_cached_per_full_key() {
        let resolver = resolver(StoreConfig::new());
        let canon = Canon::new("bar");
        let first = resolver.resolve(&canon);
        let second = resolver.resolve(&canon);
        assert!(Arc::ptr_eq(&first, &second), "second hit comes from cache");

        // A differently qualified canon caches independently.
        let other = resolver.resolve(&Canon::new("bar").with_base("moon"));
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
