mod compare;
mod parse;
mod types;

pub use compare::{build_clauses, clause_groups, Clause, CompareContext};
pub use types::{CmpOp, Query, QueryValue, SortDirection};
