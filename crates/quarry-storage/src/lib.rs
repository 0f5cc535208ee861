//! # quarry-storage
//!
//! Page format, row model, and binary row layout for QuarryDB.
//!
//! This crate implements:
//! - The slotted row page: a fixed-capacity byte buffer holding serialized
//!   rows behind a slot directory, with tombstone and forwarding markers
//! - The column schema and the deterministic binary row layout shared
//!   bit-exact by the serializer and value-address resolution
//! - The in-transit row and typed value model

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod layout;
pub mod page;
pub mod row;
pub mod schema;
pub mod value;

pub use error::{StorageError, StorageResult};
pub use page::{RowHeader, RowPage, RowPresence};
pub use row::Row;
pub use schema::{ColumnSchema, DataType, TableSchema};
pub use value::{Value, ValueComparison};
