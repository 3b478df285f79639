//! In-memory tabular storage for brushwork.
//!
//! This crate is deliberately small: it provides exactly the primitives the selection engine
//! needs from a table collaborator:
//! - a typed column schema (categorical / numeric / temporal)
//! - row filtering that produces an independent table
//! - distinct-value scans (used for distribution queries)
//! - an inner join on a key column (used by derived tables)

#![forbid(unsafe_code)]

mod table;
mod value;

pub use crate::table::{ColumnSchema, Table, TableError, TableResult};
pub use crate::value::{ColumnType, Value};
