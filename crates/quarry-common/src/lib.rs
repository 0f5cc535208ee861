//! # quarry-common
//!
//! Common types, errors, and utilities for QuarryDB.
//!
//! This crate provides the foundational types and abstractions used across
//! all QuarryDB components. It includes:
//!
//! - **Types**: Core identifiers (`PageId`, `RowId`, `BatchId`), logical
//!   addresses (`TreeAddress`, `RowAddress`, `ValueAddress`)
//! - **Errors**: Unified error handling with `QuarryError`
//! - **Config**: Engine configuration structures
//! - **Constants**: System-wide constants and limits
//!
//! ## Example
//!
//! ```rust
//! use quarry_common::types::{TreeAddress, DatabaseId, TableId, SchemaId};
//! use quarry_common::error::QuarryResult;
//!
//! fn example() -> QuarryResult<()> {
//!     let tree = TreeAddress::new(DatabaseId::new(1), TableId::new(7), SchemaId::new(1));
//!     assert_eq!(tree.table_id, TableId::new(7));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items at the crate root
pub use constants::*;
pub use error::{ErrorCode, QuarryError, QuarryResult};
pub use types::{
    BatchId, ColumnId, DatabaseId, PageAddress, PageId, PlanId, RowAddress, RowId, SchemaId,
    SlotId, TableId, TreeAddress, ValueAddress,
};
