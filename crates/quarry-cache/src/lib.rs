//! # quarry-cache
//!
//! The in-memory paged row cache for QuarryDB.
//!
//! This crate implements:
//! - **TreeContainer**: all pages of one table behind a single
//!   reader-writer lock, with the row-forwarding protocol
//! - **DataCache**: the tree registry routing row and value operations
//! - **SystemCache**: per-database metadata pages
//! - **CacheManager**: the executor-facing façade that provisions pages
//!   on capacity misses, with a capped retry budget
//!
//! # Example
//!
//! ```rust
//! use quarry_cache::CacheManager;
//! use quarry_common::config::CacheConfig;
//!
//! let manager = CacheManager::in_memory(CacheConfig::default());
//! assert!(manager.data().loaded_trees().is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod container;
pub mod data;
pub mod error;
pub mod manager;
pub mod stats;
pub mod system;

pub use container::TreeContainer;
pub use data::{DataCache, TreeStatus};
pub use error::{CacheError, CacheResult};
pub use manager::{CacheManager, EmptyPageSource, PageSource};
pub use stats::CacheStats;
pub use system::SystemCache;
