//! JSON query parsing.
//!
//! The external query grammar arrives as a JSON object. Shape dispatch
//! happens exactly once, here: every field value becomes a tagged
//! [`QueryValue`] and invalid comparison operators are rejected before
//! any request is built.

use serde_json::Value as Json;

use super::types::{CmpOp, Query, QueryValue, SortDirection};
use crate::entity::Value;
use crate::storage::{Result, StoreError};

// Control directives reserved at the top level of a query object.
const SORT_KEY: &str = "sort$";
const FIELDS_KEY: &str = "fields$";
const ALL_KEY: &str = "all$";
const LOAD_KEY: &str = "load$";
const MERGE_KEY: &str = "merge$";
const UPSERT_KEY: &str = "upsert$";

impl Query {
    /// Parses a JSON query object.
    ///
    /// Non-object input is rejected; use the typed builder for
    /// programmatic construction.
    pub fn from_json(json: Json) -> Result<Self> {
        let Json::Object(entries) = json else {
            return Err(StoreError::InvalidQuery(
                "query must be a JSON object".to_string(),
            ));
        };

        let mut query = Query::new();

        for (key, value) in entries {
            match key.as_str() {
                SORT_KEY => query.sort = Some(parse_sort(value)?),
                FIELDS_KEY => query.fields = Some(parse_fields(value)?),
                ALL_KEY => query.all = value == Json::Bool(true),
                LOAD_KEY => query.load = value == Json::Bool(true),
                MERGE_KEY => query.merge = value.as_bool(),
                UPSERT_KEY => query.upsert = Some(parse_fields(value)?),
                _ => {
                    query.filters.insert(key, parse_query_value(value)?);
                }
            }
        }

        Ok(query)
    }
}

fn parse_query_value(json: Json) -> Result<QueryValue> {
    match json {
        Json::Array(items) => {
            let elements = items
                .into_iter()
                .map(parse_query_value)
                .collect::<Result<Vec<_>>>()?;
            Ok(QueryValue::OneOf(elements))
        }
        Json::Object(entries) => {
            let mut comparisons = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                match CmpOp::parse(&key) {
                    Some(op) => comparisons.push((op, Value::from(value))),
                    // The `$` marker reserves directive syntax: an
                    // unknown marked key is an error, an unknown plain
                    // key is tolerated for forward compatibility.
                    None if key.ends_with('$') => {
                        return Err(StoreError::InvalidOperator { op: key });
                    }
                    None => {}
                }
            }
            Ok(QueryValue::Comparisons(comparisons))
        }
        scalar => Ok(QueryValue::Scalar(Value::from(scalar))),
    }
}

fn parse_sort(json: Json) -> Result<(String, SortDirection)> {
    let Json::Object(entries) = json else {
        return Err(StoreError::InvalidQuery(
            "sort$ must be an object".to_string(),
        ));
    };
    if entries.len() != 1 {
        return Err(StoreError::InvalidQuery(
            "sort$ takes exactly one field".to_string(),
        ));
    }

    let (field, direction) = entries.into_iter().next().expect("one sort entry");
    let direction = match direction.as_i64() {
        Some(n) if n >= 0 => SortDirection::Ascending,
        Some(_) => SortDirection::Descending,
        None => {
            return Err(StoreError::InvalidQuery(
                "sort$ direction must be 1 or -1".to_string(),
            ))
        }
    };
    Ok((field, direction))
}

fn parse_fields(json: Json) -> Result<Vec<String>> {
    let Json::Array(items) = json else {
        return Err(StoreError::InvalidQuery(
            "field list must be an array of names".to_string(),
        ));
    };
    items
        .into_iter()
        .map(|item| match item {
            Json::String(name) => Ok(name),
            other => Err(StoreError::InvalidQuery(format!(
                "field name must be a string, got {other}"
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_is_equality() {
        let query = Query::from_json(json!({ "m": "m0", "i": 0 })).unwrap();
        assert_eq!(query.get("m"), Some(&QueryValue::Scalar(Value::from("m0"))));
        assert_eq!(
            query.get("i"),
            Some(&QueryValue::Scalar(Value::from(0i64)))
        );
    }

    #[test]
    fn test_operator_object() {
        let query = Query::from_json(json!({ "d": { "gt": 1, "lt": 5 } })).unwrap();
        let Some(QueryValue::Comparisons(cmps)) = query.get("d") else {
            panic!("expected comparisons");
        };
        assert_eq!(cmps.len(), 2);
        assert!(cmps.contains(&(CmpOp::Gt, Value::from(1i64))));
        assert!(cmps.contains(&(CmpOp::Lt, Value::from(5i64))));
    }

    #[test]
    fn test_marked_operator_names() {
        let query = Query::from_json(json!({ "d": { "gte$": 1 } })).unwrap();
        assert_eq!(
            query.get("d"),
            Some(&QueryValue::Comparisons(vec![(
                CmpOp::Gte,
                Value::from(1i64)
            )]))
        );
    }

    #[test]
    fn test_unknown_marked_operator_rejected() {
        let err = Query::from_json(json!({ "d": { "between$": [1, 5] } })).unwrap_err();
        assert_eq!(
            err,
            StoreError::InvalidOperator {
                op: "between$".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_plain_key_ignored() {
        let query = Query::from_json(json!({ "d": { "approx": 2, "gt": 1 } })).unwrap();
        assert_eq!(
            query.get("d"),
            Some(&QueryValue::Comparisons(vec![(
                CmpOp::Gt,
                Value::from(1i64)
            )]))
        );
    }

    #[test]
    fn test_array_or() {
        let query = Query::from_json(json!({ "x": [1, { "gte": 5 }] })).unwrap();
        let Some(QueryValue::OneOf(elements)) = query.get("x") else {
            panic!("expected OneOf");
        };
        assert_eq!(elements.len(), 2);
        assert!(elements[0].is_scalar());
        assert!(matches!(&elements[1], QueryValue::Comparisons(c) if c.len() == 1));
    }

    #[test]
    fn test_directives() {
        let query = Query::from_json(json!({
            "m": "m0",
            "sort$": { "i": -1 },
            "fields$": ["id", "m"],
            "all$": true,
            "load$": true,
            "merge$": false,
        }))
        .unwrap();

        assert_eq!(query.filters.len(), 1, "directives are not filters");
        assert_eq!(
            query.sort,
            Some(("i".to_string(), SortDirection::Descending))
        );
        assert_eq!(query.fields.as_ref().unwrap().len(), 2);
        assert!(query.all);
        assert!(query.load);
        assert_eq!(query.merge, Some(false));
    }

    #[test]
    fn test_sort_ascending_and_shape_errors() {
        let query = Query::from_json(json!({ "sort$": { "i": 1 } })).unwrap();
        assert_eq!(query.sort, Some(("i".to_string(), SortDirection::Ascending)));

        assert!(Query::from_json(json!({ "sort$": { "a": 1, "b": 1 } })).is_err());
        assert!(Query::from_json(json!({ "sort$": "i" })).is_err());
        assert!(Query::from_json(json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_upsert_parsed_but_reserved() {
        let query = Query::from_json(json!({ "upsert$": ["m"] })).unwrap();
        assert_eq!(query.upsert.as_ref().unwrap(), &["m".to_string()]);
    }
}
