//! Core types for QuarryDB.

mod address;
mod ids;

pub use address::{PageAddress, RowAddress, TreeAddress, ValueAddress};
pub use ids::{BatchId, ColumnId, DatabaseId, PageId, PlanId, RowId, SchemaId, TableId};

/// A slot ID is an index into a page's slot directory.
pub type SlotId = u16;
