//! Table schema derivation (Functional Core - pure data).
//!
//! Schemas come from the same store configuration the adapter consumes:
//! every configured entity contributes its resolved table layout, and
//! entities sharing a physical table collapse into one schema. All key
//! attributes are string-typed.

use dynastore_core::config::StoreConfig;
use dynastore_core::{Canon, TableDescriptor};

/// Desired schema for one physical table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
    pub gsis: Vec<GsiSchema>,
}

/// Desired schema for one Global Secondary Index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
}

impl From<&TableDescriptor> for TableSchema {
    fn from(table: &TableDescriptor) -> Self {
        Self {
            name: table.name.clone(),
            partition_key: table.partition_key.clone(),
            sort_key: table.sort_key.clone(),
            gsis: table
                .indexes
                .iter()
                .map(|index| GsiSchema {
                    name: index.name.clone(),
                    partition_key: index.partition_key.clone(),
                    sort_key: index.sort_key.clone(),
                })
                .collect(),
        }
    }
}

/// Derives the table schemas a store configuration needs.
///
/// Entities are processed in sorted canonical-name order so the output is
/// deterministic; the first entity mapping to a table name defines its
/// schema.
pub fn from_store_config(store: &StoreConfig) -> Vec<TableSchema> {
    let mut keys: Vec<&String> = store.entity.keys().collect();
    keys.sort();

    let mut schemas: Vec<TableSchema> = Vec::new();
    for key in keys {
        let canon = Canon::parse(key);
        let descriptor = match &store.entity[key].table {
            Some(table) => TableDescriptor::from_config(&canon, table),
            None => TableDescriptor::derived(&canon),
        };

        let schema = TableSchema::from(&descriptor);
        if !schemas.iter().any(|existing| existing.name == schema.name) {
            schemas.push(schema);
        }
    }

    schemas
}

/// The fixed tables the integration suite expects.
pub fn test_schemas() -> Vec<TableSchema> {
    ["foo", "moon_bar", "test_foo"]
        .into_iter()
        .map(|name| TableSchema {
            name: name.to_string(),
            partition_key: "id".to_string(),
            sort_key: None,
            gsis: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynastore_core::config::{EntityConfig, IndexConfig, KeyConfig, TableConfig};

    #[test]
    fn test_derives_schema_per_entity() {
        let store = StoreConfig::new()
            .with_entity("moon/bar", EntityConfig::new())
            .with_entity(
                "test/foo",
                EntityConfig::new().with_table(
                    TableConfig::new().with_index(IndexConfig::new(
                        "gsi_owner",
                        KeyConfig::partition("owner").with_sort("created"),
                    )),
                ),
            );

        let schemas = from_store_config(&store);
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0].name, "moon_bar");
        assert!(schemas[0].gsis.is_empty());
        assert_eq!(schemas[1].name, "test_foo");
        assert_eq!(schemas[1].gsis[0].name, "gsi_owner");
        assert_eq!(schemas[1].gsis[0].sort_key.as_deref(), Some("created"));
    }

    #[test]
    fn test_entities_sharing_a_table_collapse() {
        let shared = EntityConfig::new().with_table(TableConfig::new().with_name("shared"));
        let store = StoreConfig::new()
            .with_entity("a/one", shared.clone())
            .with_entity("a/two", shared);

        let schemas = from_store_config(&store);
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].name, "shared");
    }
}
