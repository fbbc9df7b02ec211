//! Comparison clause construction.

use super::types::{CmpOp, QueryValue};
use crate::entity::Value;
use crate::storage::{Result, StoreError};

/// One normalized comparison clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: String,
    pub op: CmpOp,
    pub value: Value,
}

/// Where the clauses will land. DynamoDB allows a single condition on a
/// key-condition sort key, so that context caps the clause count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareContext {
    Filter,
    Sort,
}

/// Normalizes one field's query value into comparison clauses.
///
/// Scalars become a single equality clause; comparison sets become one
/// clause per operator, AND-combined by the caller. `OneOf` values are
/// the planner's concern (it calls this once per element) and are
/// rejected here.
pub fn build_clauses(field: &str, value: &QueryValue, ctx: CompareContext) -> Result<Vec<Clause>> {
    let clauses = match value {
        QueryValue::Scalar(v) => vec![Clause {
            field: field.to_string(),
            op: CmpOp::Eq,
            value: v.clone(),
        }],
        QueryValue::Comparisons(cmps) => cmps
            .iter()
            .map(|(op, v)| Clause {
                field: field.to_string(),
                op: *op,
                value: v.clone(),
            })
            .collect(),
        QueryValue::OneOf(_) => {
            return Err(StoreError::InvalidQuery(format!(
                "field {field}: nested array conditions are not supported"
            )))
        }
    };

    if ctx == CompareContext::Sort && clauses.len() > 1 {
        return Err(StoreError::SortKeyConditions {
            field: field.to_string(),
        });
    }

    Ok(clauses)
}

/// Expands a field's query value into OR-combined clause groups: one
/// group per `OneOf` element, a single group otherwise. Clauses within a
/// group are AND-combined.
pub fn clause_groups(field: &str, value: &QueryValue) -> Result<Vec<Vec<Clause>>> {
    match value {
        QueryValue::OneOf(elements) => elements
            .iter()
            .map(|element| build_clauses(field, element, CompareContext::Filter))
            .collect(),
        other => Ok(vec![build_clauses(field, other, CompareContext::Filter)?]),
    }
}
