use async_trait::async_trait;

use crate::entity::{Canon, Record};
use crate::query::Query;

use super::Result;

/// Per-call save directives.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Attribute-level update (`true`) or full overwrite (`false`);
    /// `None` defers to the store-level default.
    pub merge: Option<bool>,

    /// Explicit key for a create; generated when absent.
    pub id: Option<String>,

    /// Reserved upsert field list. Unsupported: its presence fails the
    /// save before any request is issued.
    pub upsert: Option<Vec<String>>,
}

impl SaveOptions {
    /// Lifts the save-relevant directives out of a parsed query object.
    pub fn from_query(query: &Query) -> Self {
        Self {
            merge: query.merge,
            id: None,
            upsert: query.upsert.clone(),
        }
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = Some(merge);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The generic entity persistence contract.
///
/// Implementations translate these operations into backend wire calls.
/// Key misses are `Ok(None)` across the board.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Creates or updates an entity, returning the canonical post-write
    /// state reloaded from the backend.
    async fn save(&self, canon: &Canon, record: Record, options: &SaveOptions) -> Result<Record>;

    /// Loads a single entity: by key when the query carries the full
    /// key, otherwise the first match of the filtered listing. An empty
    /// query loads nothing.
    async fn load(&self, canon: &Canon, query: &Query) -> Result<Option<Record>>;

    /// Lists every entity matching the query, walking all result pages.
    async fn list(&self, canon: &Canon, query: &Query) -> Result<Vec<Record>>;

    /// Removes by key or by query. With the query's `all` directive every
    /// match is deleted; otherwise only the first. With `load`, the last
    /// deleted item's prior state is returned.
    async fn remove(&self, canon: &Canon, query: &Query) -> Result<Option<Record>>;
}
