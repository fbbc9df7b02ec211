//! Per-entity static configuration.
//!
//! The configuration contract mirrors the external shape consumed by the
//! store plugin:
//!
//! ```json
//! {
//!   "merge": true,
//!   "entity": {
//!     "moon/bar": {
//!       "table": {
//!         "name": "moon_bar",
//!         "key": { "partition": "id", "sort": null },
//!         "index": [
//!           { "name": "gsi_owner", "key": { "partition": "owner", "sort": "created" } }
//!         ]
//!       },
//!       "fields": { "wen": { "type": "date" } }
//!     }
//!   }
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Top-level store configuration, keyed by canonical entity name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Default save semantics: attribute-level update (`true`) or full
    /// overwrite (`false`). A per-call `merge$` directive has precedence.
    #[serde(default = "default_merge")]
    pub merge: bool,

    /// Entity metadata by canonical name (`zone/base/name`, `base/name`,
    /// or bare `name`).
    #[serde(default)]
    pub entity: HashMap<String, EntityConfig>,
}

fn default_merge() -> bool {
    true
}

impl StoreConfig {
    pub fn new() -> Self {
        Self {
            merge: true,
            entity: HashMap::new(),
        }
    }

    /// Registers entity metadata under a canonical name.
    pub fn with_entity(mut self, canon_key: impl Into<String>, entity: EntityConfig) -> Self {
        self.entity.insert(canon_key.into(), entity);
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }
}

/// Metadata for one entity kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Physical table layout; when absent the table name is derived from
    /// the canonical name and the partition key defaults to `id`.
    #[serde(default)]
    pub table: Option<TableConfig>,

    /// Field-level coercion metadata.
    #[serde(default)]
    pub fields: HashMap<String, FieldConfig>,
}

impl EntityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableConfig) -> Self {
        self.table = Some(table);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, field: FieldConfig) -> Self {
        self.fields.insert(name.into(), field);
        self
    }
}

/// Physical table layout for an entity kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub key: Option<KeyConfig>,

    #[serde(default)]
    pub index: Vec<IndexConfig>,
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_key(mut self, key: KeyConfig) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_index(mut self, index: IndexConfig) -> Self {
        self.index.push(index);
        self
    }
}

/// Partition/sort key attribute names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyConfig {
    #[serde(default)]
    pub partition: Option<String>,

    #[serde(default)]
    pub sort: Option<String>,
}

impl KeyConfig {
    pub fn partition(name: impl Into<String>) -> Self {
        Self {
            partition: Some(name.into()),
            sort: None,
        }
    }

    pub fn with_sort(mut self, name: impl Into<String>) -> Self {
        self.sort = Some(name.into());
        self
    }
}

/// One secondary index declaration. Declaration order matters: the query
/// planner selects the first index whose partition key matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub name: String,
    pub key: KeyConfig,
}

impl IndexConfig {
    pub fn new(name: impl Into<String>, key: KeyConfig) -> Self {
        Self {
            name: name.into(),
            key,
        }
    }
}

/// Field-level metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
}

impl FieldConfig {
    pub fn date() -> Self {
        Self {
            field_type: Some(FieldType::Date),
        }
    }
}

/// Semantic field types driving codec coercions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Stored as an ISO-8601 string, decoded back to a date/time value.
    Date,
    /// Unknown declarations are carried but ignored by the codec.
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_shape() {
        let config: StoreConfig = serde_json::from_value(serde_json::json!({
            "entity": {
                "moon/bar": {
                    "table": {
                        "name": "moon_bar",
                        "key": { "partition": "id", "sort": "rank" },
                        "index": [
                            { "name": "gsi_owner", "key": { "partition": "owner", "sort": "created" } }
                        ]
                    },
                    "fields": { "wen": { "type": "date" } }
                }
            }
        }))
        .unwrap();

        assert!(config.merge, "merge defaults to true");
        let entity = &config.entity["moon/bar"];
        let table = entity.table.as_ref().unwrap();
        assert_eq!(table.name.as_deref(), Some("moon_bar"));
        assert_eq!(table.index.len(), 1);
        assert_eq!(table.index[0].name, "gsi_owner");
        assert_eq!(
            entity.fields["wen"].field_type,
            Some(FieldType::Date)
        );
    }

    #[test]
    fn test_unknown_field_type_tolerated() {
        let config: FieldConfig =
            serde_json::from_value(serde_json::json!({ "type": "geo" })).unwrap();
        assert_eq!(config.field_type, Some(FieldType::Unknown));
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new().with_merge(false).with_entity(
            "test/foo",
            EntityConfig::new().with_field("d1", FieldConfig::date()),
        );
        assert!(!config.merge);
        assert!(config.entity.contains_key("test/foo"));
    }
}
