//! Entity records.

use std::collections::BTreeMap;

use super::Value;

/// A flat attribute map for one entity instance.
///
/// After a successful write the record always carries the table's
/// partition key attribute, plus the sort key attribute when the table
/// declares one. Keys absent from the map are treated as undefined and
/// are never sent to the store; `Value::Null` is a real, persisted value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    attributes: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }

    /// Builds a record from a JSON object; non-object input yields an
    /// empty record.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Object(entries) => Self {
                attributes: entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            },
            _ => Self::default(),
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_access() {
        let record = Record::new().with("m", "m0").with("i", 0i64).with("b", true);

        assert_eq!(record.len(), 3);
        assert_eq!(record.get("m"), Some(&Value::String("m0".to_string())));
        assert!(record.contains("b"));
        assert!(!record.contains("missing"));
    }

    #[test]
    fn test_from_json_keeps_null_drops_nothing() {
        let record = Record::from_json(serde_json::json!({ "s1": null, "m": "m0" }));
        assert_eq!(record.get("s1"), Some(&Value::Null));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_from_json_non_object() {
        assert!(Record::from_json(serde_json::json!("scalar")).is_empty());
    }
}
