//! # quarry-query
//!
//! Plan-based query execution for QuarryDB.
//!
//! This crate implements:
//! - **QueryPlan / QueryPlanPart / Operator**: the executable plan model,
//!   with operators as a closed enum
//! - **RowFilter**: recursive WHERE-clause trees over row-address sets
//! - **QueryExecutor**: permission checks, all-or-nothing locking,
//!   two-phase (Try/Commit) execution, advisory cancellation
//! - **Resultset / ResultsetBuilder**: result assembly with row
//!   deduplication and error aggregation
//! - **AuthorizationOracle / DatabaseCatalog**: the external collaborator
//!   seams

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod catalog;
pub mod executor;
pub mod filter;
pub mod operator;
pub mod plan;
pub mod resultset;

pub use auth::{AllowAllOracle, AuthorizationOracle, DenyAllOracle, Permission};
pub use catalog::{DatabaseCatalog, MemoryCatalog, StoragePolicy};
pub use executor::QueryExecutor;
pub use filter::{BooleanComparison, ColumnComparison, RowFilter};
pub use operator::{Mode, Operator};
pub use plan::{QueryPlan, QueryPlanPart, StatementKind};
pub use resultset::{Resultset, ResultsetBuilder};
