//! Read planning: query → DynamoDB request shape.
//!
//! Given a cleaned query and a table descriptor, decides the access
//! strategy in strict priority order — direct key `Query`, first-matching
//! secondary-index `Query`, or full `Scan` — and builds the expression
//! strings and parameter maps for it.
//!
//! Attribute names and values only ever enter expression text through
//! `#nK`/`:vK` placeholders. Raw field names or values are never
//! concatenated into an expression; the maps carry them instead.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use dynastore_core::query::{build_clauses, clause_groups, Clause, CompareContext};
use dynastore_core::{Query, QueryValue, Result, SortDirection, TableDescriptor, Value};

use crate::codec;

/// How the planned read reaches the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// Key condition over the table's own partition (and sort) key.
    DirectKeyQuery,
    /// Key condition over a secondary index's keys.
    IndexQuery,
    /// Full-table read with post-hoc filtering.
    Scan,
}

/// A fully built read request, ready for the pagination driver.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPlan {
    pub table: String,
    pub mode: ReadMode,
    pub index_name: Option<String>,
    pub key_condition: Option<String>,
    pub filter_expression: Option<String>,
    pub projection_expression: Option<String>,
    pub expression_names: HashMap<String, String>,
    pub expression_values: HashMap<String, AttributeValue>,
    /// Forward/backward iteration for Query operations. `None` in scan
    /// mode: the Scan operation carries no ordering parameter, so a sort
    /// directive without a key condition is inherited, unresolved
    /// behavior rather than something the planner corrects.
    pub scan_forward: Option<bool>,
}

/// Placeholder allocator. Names are deduplicated per attribute so the
/// same field referenced by a key condition, filter, and projection maps
/// to one `#nK`; values are always fresh.
#[derive(Default)]
struct Placeholders {
    names: HashMap<String, String>,
    by_field: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
    next_name: usize,
    next_value: usize,
}

impl Placeholders {
    fn name(&mut self, field: &str) -> String {
        if let Some(existing) = self.by_field.get(field) {
            return existing.clone();
        }
        let placeholder = format!("#n{}", self.next_name);
        self.next_name += 1;
        self.names.insert(placeholder.clone(), field.to_string());
        self.by_field.insert(field.to_string(), placeholder.clone());
        placeholder
    }

    fn value(&mut self, value: &Value) -> String {
        let placeholder = format!(":v{}", self.next_value);
        self.next_value += 1;
        self.values
            .insert(placeholder.clone(), codec::encode_value(value));
        placeholder
    }

    fn clause(&mut self, clause: &Clause) -> String {
        format!(
            "{} {} {}",
            self.name(&clause.field),
            clause.op.symbol(),
            self.value(&clause.value)
        )
    }
}

/// Plans a read for a query against a table.
///
/// All validation errors (unknown operators were already rejected at
/// parse time; multiple conditions on a sort key surface here) are
/// returned before anything touches the network.
pub fn plan_read(table: &TableDescriptor, query: &Query) -> Result<ReadPlan> {
    let mut remaining = query.filters.clone();
    let mut ph = Placeholders::default();

    let mut mode = ReadMode::Scan;
    let mut index_name = None;
    let mut key_condition = None;

    // 1. Direct key query: partition key (and sort key, when the table
    //    has one) present as plain equality values.
    let pk_scalar = is_scalar(remaining.get(&table.partition_key));
    let sk_scalar = match &table.sort_key {
        Some(sk) => is_scalar(remaining.get(sk)),
        None => true,
    };

    if pk_scalar && sk_scalar {
        mode = ReadMode::DirectKeyQuery;
        let mut parts = vec![key_equality(&mut ph, &mut remaining, &table.partition_key)];
        if let Some(sk) = &table.sort_key {
            parts.push(key_equality(&mut ph, &mut remaining, sk));
        }
        key_condition = Some(parts.join(" AND "));
    } else {
        // 2. Secondary index query: first declared index whose partition
        //    key appears as a plain equality wins. Declaration order,
        //    never cost-based.
        for index in &table.indexes {
            if !is_scalar(remaining.get(&index.partition_key)) {
                continue;
            }

            mode = ReadMode::IndexQuery;
            index_name = Some(index.name.clone());
            let mut condition = key_equality(&mut ph, &mut remaining, &index.partition_key);

            if let Some(sk) = &index.sort_key {
                if let Some(value) = remaining.remove(sk) {
                    // At most one condition on a key-condition sort key.
                    let clauses = build_clauses(sk, &value, CompareContext::Sort)?;
                    if let Some(clause) = clauses.first() {
                        condition.push_str(" AND ");
                        condition.push_str(&ph.clause(clause));
                    }
                }
            }

            key_condition = Some(condition);
            break;
        }
    }

    // 3. Everything left over becomes the filter expression: OR within a
    //    field's array groups, AND across fields.
    let mut field_expressions = Vec::with_capacity(remaining.len());
    for (field, value) in &remaining {
        let groups = clause_groups(field, value)?;
        let rendered: Vec<(String, bool)> = groups
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| {
                let terms: Vec<String> = group.iter().map(|clause| ph.clause(clause)).collect();
                (terms.join(" AND "), terms.len() > 1)
            })
            .collect();

        match rendered.len() {
            0 => {}
            1 => {
                let (group, _) = rendered.into_iter().next().expect("one group");
                field_expressions.push(group);
            }
            _ => {
                let alternatives: Vec<String> = rendered
                    .into_iter()
                    .map(|(group, multi)| if multi { format!("({group})") } else { group })
                    .collect();
                field_expressions.push(format!("({})", alternatives.join(" OR ")));
            }
        }
    }
    let filter_expression = if field_expressions.is_empty() {
        None
    } else {
        Some(field_expressions.join(" AND "))
    };

    let projection_expression = query.fields.as_ref().map(|fields| {
        let names: Vec<String> = fields.iter().map(|field| ph.name(field)).collect();
        names.join(", ")
    });

    let scan_forward = match mode {
        ReadMode::Scan => None,
        _ => query
            .sort
            .as_ref()
            .map(|(_, direction)| *direction == SortDirection::Ascending),
    };

    Ok(ReadPlan {
        table: table.name.clone(),
        mode,
        index_name,
        key_condition,
        filter_expression,
        projection_expression,
        expression_names: ph.names,
        expression_values: ph.values,
        scan_forward,
    })
}

fn is_scalar(value: Option<&QueryValue>) -> bool {
    matches!(value, Some(QueryValue::Scalar(_)))
}

fn key_equality(
    ph: &mut Placeholders,
    remaining: &mut std::collections::BTreeMap<String, QueryValue>,
    field: &str,
) -> String {
    let Some(QueryValue::Scalar(value)) = remaining.remove(field) else {
        unreachable!("key fields are checked for scalar shape before removal");
    };
    format!("{} = {}", ph.name(field), ph.value(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynastore_core::{CmpOp, IndexDescriptor};

    /// Partition key `id`, sort key `sk`, one index on `(ip, is)`.
    fn keyed_table() -> TableDescriptor {
        TableDescriptor {
            name: "test_foo".to_string(),
            partition_key: "id".to_string(),
            sort_key: Some("sk".to_string()),
            indexes: vec![IndexDescriptor {
                name: "gsi_ip".to_string(),
                partition_key: "ip".to_string(),
                sort_key: Some("is".to_string()),
            }],
        }
    }

    fn simple_table() -> TableDescriptor {
        TableDescriptor {
            name: "moon_bar".to_string(),
            partition_key: "id".to_string(),
            sort_key: None,
            indexes: vec![],
        }
    }

    #[test]
    fn test_direct_key_query() {
        let query = Query::new().filter("id", "a").filter("sk", "x");
        let plan = plan_read(&keyed_table(), &query).unwrap();

        assert_eq!(plan.mode, ReadMode::DirectKeyQuery);
        assert_eq!(plan.index_name, None);
        assert_eq!(
            plan.key_condition.as_deref(),
            Some("#n0 = :v0 AND #n1 = :v1")
        );
        assert_eq!(plan.filter_expression, None);
        assert_eq!(plan.expression_names["#n0"], "id");
        assert_eq!(plan.expression_names["#n1"], "sk");
        assert_eq!(
            plan.expression_values[":v0"],
            AttributeValue::S("a".to_string())
        );
    }

    #[test]
    fn test_partition_without_sort_key_falls_through() {
        // Table has a sort key, query only has the partition key: not a
        // direct key query, and no index matches `id`.
        let query = Query::new().filter("id", "a");
        let plan = plan_read(&keyed_table(), &query).unwrap();
        assert_eq!(plan.mode, ReadMode::Scan);
        assert_eq!(plan.filter_expression.as_deref(), Some("#n0 = :v0"));
    }

    #[test]
    fn test_index_query() {
        let query = Query::new().filter("ip", "A");
        let plan = plan_read(&keyed_table(), &query).unwrap();

        assert_eq!(plan.mode, ReadMode::IndexQuery);
        assert_eq!(plan.index_name.as_deref(), Some("gsi_ip"));
        assert_eq!(plan.key_condition.as_deref(), Some("#n0 = :v0"));
        assert_eq!(plan.expression_names["#n0"], "ip");
    }

    #[test]
    fn test_index_query_with_sort_condition() {
        let query = Query::new()
            .filter("ip", "A")
            .compare("is", CmpOp::Gt, 1i64);
        let plan = plan_read(&keyed_table(), &query).unwrap();

        assert_eq!(plan.mode, ReadMode::IndexQuery);
        assert_eq!(
            plan.key_condition.as_deref(),
            Some("#n0 = :v0 AND #n1 > :v1")
        );
        assert_eq!(plan.filter_expression, None, "sort key consumed");
    }

    #[test]
    fn test_index_sort_key_single_condition_only() {
        let query = Query::new().filter("ip", "A").filter(
            "is",
            QueryValue::Comparisons(vec![
                (CmpOp::Gt, Value::from(1i64)),
                (CmpOp::Lt, Value::from(5i64)),
            ]),
        );
        let err = plan_read(&keyed_table(), &query).unwrap_err();
        assert_eq!(
            err,
            dynastore_core::StoreError::SortKeyConditions {
                field: "is".to_string()
            }
        );
    }

    #[test]
    fn test_range_on_non_key_field_allowed() {
        let query = Query::new().filter(
            "d",
            QueryValue::Comparisons(vec![
                (CmpOp::Gt, Value::from(1i64)),
                (CmpOp::Lt, Value::from(5i64)),
            ]),
        );
        let plan = plan_read(&keyed_table(), &query).unwrap();
        assert_eq!(plan.mode, ReadMode::Scan);
        assert_eq!(
            plan.filter_expression.as_deref(),
            Some("#n0 > :v0 AND #n0 < :v1")
        );
    }

    #[test]
    fn test_comparison_on_index_partition_key_does_not_select_index() {
        let query = Query::new().compare("ip", CmpOp::Gt, 0i64);
        let plan = plan_read(&keyed_table(), &query).unwrap();
        assert_eq!(plan.mode, ReadMode::Scan);
        assert_eq!(plan.index_name, None);
    }

    #[test]
    fn test_scan_mode_for_plain_fields() {
        let query = Query::new().filter("other", 1i64);
        let plan = plan_read(&keyed_table(), &query).unwrap();
        assert_eq!(plan.mode, ReadMode::Scan);
        assert_eq!(plan.key_condition, None);
        assert_eq!(plan.filter_expression.as_deref(), Some("#n0 = :v0"));
    }

    #[test]
    fn test_first_declared_index_wins() {
        let mut table = keyed_table();
        table.indexes.push(IndexDescriptor {
            name: "gsi_better".to_string(),
            partition_key: "ip".to_string(),
            sort_key: None,
        });

        let query = Query::new().filter("ip", "A");
        let plan = plan_read(&table, &query).unwrap();
        assert_eq!(plan.index_name.as_deref(), Some("gsi_ip"));
    }

    #[test]
    fn test_array_or_grouping() {
        let query = Query::new().one_of("x", [1i64, 2i64]);
        let plan = plan_read(&simple_table(), &query).unwrap();
        assert_eq!(
            plan.filter_expression.as_deref(),
            Some("(#n0 = :v0 OR #n0 = :v1)")
        );
    }

    #[test]
    fn test_mixed_or_and_groups() {
        let query = Query::new()
            .filter(
                "x",
                QueryValue::OneOf(vec![
                    QueryValue::from(1i64),
                    QueryValue::Comparisons(vec![
                        (CmpOp::Gte, Value::from(5i64)),
                        (CmpOp::Lt, Value::from(9i64)),
                    ]),
                ]),
            )
            .filter("m", "m0");
        let plan = plan_read(&simple_table(), &query).unwrap();

        // Fields iterate lexicographically: `m`, then `x`.
        assert_eq!(
            plan.filter_expression.as_deref(),
            Some("#n0 = :v0 AND (#n1 = :v1 OR (#n1 >= :v2 AND #n1 < :v3))")
        );
    }

    #[test]
    fn test_projection_uses_placeholders() {
        let query = Query::new().filter("id", "a").project(["id", "m"]);
        let plan = plan_read(&simple_table(), &query).unwrap();

        assert_eq!(plan.mode, ReadMode::DirectKeyQuery);
        let projection = plan.projection_expression.unwrap();
        assert_eq!(projection, "#n0, #n1");
        // `id` is shared between the key condition and the projection.
        assert_eq!(plan.expression_names["#n0"], "id");
        assert_eq!(plan.expression_names["#n1"], "m");
    }

    #[test]
    fn test_sort_direction_mapping() {
        let table = simple_table();
        let base = Query::new().filter("id", "a");

        let asc = base.clone().sort_by("sk", SortDirection::Ascending);
        assert_eq!(plan_read(&table, &asc).unwrap().scan_forward, Some(true));

        let desc = base.sort_by("sk", SortDirection::Descending);
        assert_eq!(plan_read(&table, &desc).unwrap().scan_forward, Some(false));
    }

    #[test]
    fn test_sort_direction_dropped_in_scan_mode() {
        let query = Query::new()
            .filter("other", 1i64)
            .sort_by("other", SortDirection::Descending);
        let plan = plan_read(&simple_table(), &query).unwrap();
        assert_eq!(plan.mode, ReadMode::Scan);
        assert_eq!(plan.scan_forward, None);
    }

    #[test]
    fn test_no_raw_identifiers_in_expressions() {
        // Hostile attribute names and values must never reach expression
        // text; they travel in the substitution maps instead.
        let query = Query::new()
            .filter("a OR #n0 = :v0", "x\" OR 1=1")
            .filter("id", "a");
        let plan = plan_read(&simple_table(), &query).unwrap();

        let mut expressions = String::new();
        expressions.push_str(plan.key_condition.as_deref().unwrap_or(""));
        expressions.push('|');
        expressions.push_str(plan.filter_expression.as_deref().unwrap_or(""));

        assert!(!expressions.contains("OR 1=1"));
        assert!(!expressions.contains("a OR #n0"));
        for token in expressions.split(|c: char| !c.is_alphanumeric() && c != '#' && c != ':') {
            if token.is_empty() || token == "AND" || token == "OR" {
                continue;
            }
            assert!(
                token.starts_with('#') || token.starts_with(':'),
                "raw identifier leaked into expression: {token}"
            );
        }
        // The hostile name is present only as a placeholder target.
        assert!(plan
            .expression_names
            .values()
            .any(|name| name == "a OR #n0 = :v0"));
    }

    #[test]
    fn test_empty_query_scans_everything() {
        let plan = plan_read(&simple_table(), &Query::new()).unwrap();
        assert_eq!(plan.mode, ReadMode::Scan);
        assert_eq!(plan.key_condition, None);
        assert_eq!(plan.filter_expression, None);
        assert!(plan.expression_names.is_empty());
        assert!(plan.expression_values.is_empty());
    }
}
