//! Table routing descriptors (pure data).

use crate::config::TableConfig;
use crate::entity::Canon;

/// Partition key attribute name used when no explicit key is configured.
pub const DEFAULT_PARTITION_KEY: &str = "id";

/// Resolved physical layout of one entity kind's table.
///
/// Immutable once built; shared process-wide through the resolver cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
    pub indexes: Vec<IndexDescriptor>,
}

/// One secondary index. The list order on [`TableDescriptor`] is the
/// declaration order, and the planner picks the first match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
}

impl TableDescriptor {
    /// Builds a descriptor from explicit configuration, falling back to
    /// derived defaults for anything the configuration leaves out.
    pub fn from_config(canon: &Canon, config: &TableConfig) -> Self {
        let key = config.key.clone().unwrap_or_default();
        Self {
            name: config
                .name
                .clone()
                .unwrap_or_else(|| canon.default_table_name()),
            partition_key: key
                .partition
                .unwrap_or_else(|| DEFAULT_PARTITION_KEY.to_string()),
            sort_key: key.sort,
            indexes: config
                .index
                .iter()
                .map(|index| IndexDescriptor {
                    name: index.name.clone(),
                    partition_key: index
                        .key
                        .partition
                        .clone()
                        .unwrap_or_else(|| DEFAULT_PARTITION_KEY.to_string()),
                    sort_key: index.key.sort.clone(),
                })
                .collect(),
        }
    }

    /// The descriptor for a kind with no explicit configuration.
    pub fn derived(canon: &Canon) -> Self {
        Self {
            name: canon.default_table_name(),
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
            sort_key: None,
            indexes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IndexConfig, KeyConfig};

    #[test]
    fn test_derived_defaults() {
        let canon = Canon::new("bar").with_base("moon");
        let table = TableDescriptor::derived(&canon);
        assert_eq!(table.name, "moon_bar");
        assert_eq!(table.partition_key, "id");
        assert_eq!(table.sort_key, None);
        assert!(table.indexes.is_empty());
    }

    #[test]
    fn test_from_config_partial() {
        let canon = Canon::new("foo").with_base("test");
        let config = TableConfig::new().with_index(IndexConfig::new(
            "gsi_owner",
            KeyConfig::partition("owner").with_sort("created"),
        ));

        let table = TableDescriptor::from_config(&canon, &config);
        assert_eq!(table.name, "test_foo", "name falls back to derived");
        assert_eq!(table.partition_key, "id");
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(table.indexes[0].partition_key, "owner");
        assert_eq!(table.indexes[0].sort_key.as_deref(), Some("created"));
    }

    #[test]
    fn test_from_config_explicit_keys() {
        let canon = Canon::new("foo");
        let config = TableConfig::new()
            .with_name("foo_custom")
            .with_key(KeyConfig::partition("pk").with_sort("sk"));

        let table = TableDescriptor::from_config(&canon, &config);
        assert_eq!(table.name, "foo_custom");
        assert_eq!(table.partition_key, "pk");
        assert_eq!(table.sort_key.as_deref(), Some("sk"));
    }
}
