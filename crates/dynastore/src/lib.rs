//! DynamoDB adapter for the dynastore entity protocol.
//!
//! Translates the generic entity operations from `dynastore_core`
//! (save/load/list/remove with the constrained filter/sort/comparison
//! grammar) into DynamoDB wire calls, and wire items back into native
//! records.
//!
//! The interesting part is the read path: [`planner`] turns a cleaned
//! query plus a table descriptor into either a direct key `Query`, a
//! secondary-index `Query`, or a `Scan` with a filter expression, always
//! routing attribute names and values through expression placeholders;
//! [`paginate`] then walks every result page to completion.

pub mod codec;
pub mod error;
pub mod paginate;
pub mod planner;
pub mod store;

pub use planner::{plan_read, ReadMode, ReadPlan};
pub use store::DynamoStore;
