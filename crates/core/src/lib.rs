//! Core types for the dynastore project.
//!
//! This crate is backend-agnostic: it defines the native value
//! representation, the canonical entity naming scheme, the external query
//! grammar and its comparison builder, table/index routing, per-entity
//! configuration, and the `EntityStore` trait that storage adapters
//! implement. Nothing in here touches the AWS SDK.

pub mod config;
pub mod entity;
pub mod query;
pub mod storage;
pub mod table;

pub use entity::{Canon, Record, Value};
pub use query::{CmpOp, Query, QueryValue, SortDirection};
pub use storage::{EntityStore, Result, SaveOptions, StoreError};
pub use table::{IndexDescriptor, TableDescriptor, TableResolver};
