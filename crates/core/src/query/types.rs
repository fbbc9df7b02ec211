//! Query grammar types.

use std::collections::BTreeMap;

use crate::entity::Value;

/// Comparison operators accepted by the query grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpOp {
    /// The grammar-level operator name.
    pub fn name(&self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Lt => "lt",
            CmpOp::Lte => "lte",
            CmpOp::Gt => "gt",
            CmpOp::Gte => "gte",
        }
    }

    /// The DynamoDB expression symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
        }
    }

    /// Parses a grammar operator name, with or without the `$` marker
    /// suffix. Returns `None` for anything outside the fixed set.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim_end_matches('$') {
            "eq" => Some(CmpOp::Eq),
            "ne" => Some(CmpOp::Ne),
            "lt" => Some(CmpOp::Lt),
            "lte" => Some(CmpOp::Lte),
            "gt" => Some(CmpOp::Gt),
            "gte" => Some(CmpOp::Gte),
            _ => None,
        }
    }
}

/// The shape of one filtered field, decided once at the parse boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// A plain value: equality.
    Scalar(Value),
    /// Logical OR over the elements; each element may itself carry
    /// comparison operators.
    OneOf(Vec<QueryValue>),
    /// One or more comparison clauses on a single field, combined with
    /// AND.
    Comparisons(Vec<(CmpOp, Value)>),
}

impl QueryValue {
    pub fn is_scalar(&self) -> bool {
        matches!(self, QueryValue::Scalar(_))
    }
}

impl<T: Into<Value>> From<T> for QueryValue {
    fn from(value: T) -> Self {
        QueryValue::Scalar(value.into())
    }
}

/// Sort direction for the single optional sort directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// An abstract entity query: field filters plus control directives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Field filters in deterministic (lexicographic) order.
    pub filters: BTreeMap<String, QueryValue>,

    /// At most one sort directive.
    pub sort: Option<(String, SortDirection)>,

    /// Projection field list.
    pub fields: Option<Vec<String>>,

    /// Remove directive: delete every match instead of the first.
    pub all: bool,

    /// Remove directive: return the deleted item.
    pub load: bool,

    /// Save directive: per-call merge override; `None` defers to the
    /// store-level default.
    pub merge: Option<bool>,

    /// Save directive: reserved upsert field list. Not supported; its
    /// presence makes the save fail fast.
    pub upsert: Option<Vec<String>>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field filter.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Adds a single-operator comparison on a field.
    pub fn compare(mut self, field: impl Into<String>, op: CmpOp, value: impl Into<Value>) -> Self {
        self.filters.insert(
            field.into(),
            QueryValue::Comparisons(vec![(op, value.into())]),
        );
        self
    }

    /// Adds an OR filter over several values.
    pub fn one_of<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<QueryValue>,
    {
        self.filters.insert(
            field.into(),
            QueryValue::OneOf(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some((field.into(), direction));
        self
    }

    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_all(mut self, all: bool) -> Self {
        self.all = all;
        self
    }

    pub fn with_load(mut self, load: bool) -> Self {
        self.load = load;
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = Some(merge);
        self
    }

    /// True when no field filters are present (directives do not count).
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// The filter value for a field, if any.
    pub fn get(&self, field: &str) -> Option<&QueryValue> {
        self.filters.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmp_op_names_and_symbols() {
        let all = [
            (CmpOp::Eq, "eq", "="),
            (CmpOp::Ne, "ne", "<>"),
            (CmpOp::Lt, "lt", "<"),
            (CmpOp::Lte, "lte", "<="),
            (CmpOp::Gt, "gt", ">"),
            (CmpOp::Gte, "gte", ">="),
        ];
        for (op, name, symbol) in all {
            assert_eq!(op.name(), name);
            assert_eq!(op.symbol(), symbol);
            assert_eq!(CmpOp::parse(name), Some(op));
            assert_eq!(CmpOp::parse(&format!("{name}$")), Some(op));
        }
        assert_eq!(CmpOp::parse("between"), None);
    }

    #[test]
    fn test_builder_shape() {
        let query = Query::new()
            .filter("m", "m0")
            .compare("i", CmpOp::Gte, 1i64)
            .one_of("x", [1i64, 2i64])
            .sort_by("i", SortDirection::Descending)
            .project(["id", "m"]);

        assert_eq!(query.filters.len(), 3);
        assert!(query.get("m").unwrap().is_scalar());
        assert!(matches!(query.get("x"), Some(QueryValue::OneOf(v)) if v.len() == 2));
        assert_eq!(
            query.sort,
            Some(("i".to_string(), SortDirection::Descending))
        );
        assert_eq!(query.fields.as_deref(), Some(&["id".to_string(), "m".to_string()][..]));
    }

    #[test]
    fn test_is_empty_ignores_directives() {
        assert!(Query::new().with_all(true).is_empty());
        assert!(!Query::new().filter("m", "m0").is_empty());
    }
}
