use thiserror::Error;

/// Errors surfaced by entity stores.
///
/// The first five variants are local validation failures raised before
/// any request is built; everything else reflects the storage backend.
/// A load or remove of a key that does not exist is `Ok(None)`, never an
/// error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Invalid comparison operator: {op}")]
    InvalidOperator { op: String },

    #[error("Only one condition per sort key: {field}")]
    SortKeyConditions { field: String },

    #[error("Empty remove query: pass the all directive to delete every item")]
    EmptyRemoveQuery,

    #[error("Not implemented: {feature}")]
    Unimplemented { feature: &'static str },

    #[error("Malformed query: {0}")]
    InvalidQuery(String),

    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: String, id: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_operator_display() {
        let error = StoreError::InvalidOperator {
            op: "between$".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid comparison operator: between$");
    }

    #[test]
    fn test_sort_key_conditions_display() {
        let error = StoreError::SortKeyConditions {
            field: "is".to_string(),
        };
        assert_eq!(error.to_string(), "Only one condition per sort key: is");
    }

    #[test]
    fn test_already_exists_display() {
        let error = StoreError::AlreadyExists {
            kind: "test/foo".to_string(),
            id: "abc-123".to_string(),
        };
        assert_eq!(error.to_string(), "test/foo already exists: abc-123");
    }

    #[test]
    fn test_unimplemented_display() {
        let error = StoreError::Unimplemented { feature: "upsert" };
        assert_eq!(error.to_string(), "Not implemented: upsert");
    }
}
