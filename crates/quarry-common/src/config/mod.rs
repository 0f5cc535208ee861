//! Engine configuration structures.
//!
//! These structures define all configurable aspects of a QuarryDB engine
//! instance.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONTAINER_LOCK_TIMEOUT_MS, DEFAULT_MAX_CAPACITY_RETRIES, DEFAULT_PAGE_SIZE,
};

/// Top-level engine configuration.
///
/// # Example
///
/// ```rust
/// use quarry_common::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.cache.page_size, 8192);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Row cache configuration.
    pub cache: CacheConfig,
    /// Lock manager configuration.
    pub lock: LockConfig,
    /// Transaction manager configuration.
    pub txn: TxnConfig,
}

/// Row cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Page size in bytes for newly allocated pages.
    pub page_size: usize,
    /// Bounded timeout for a tree container's reader-writer lock.
    ///
    /// A timed-out acquisition fails the operation with a typed error; it
    /// never proceeds unlocked.
    pub container_lock_timeout: Duration,
    /// Cap on new-page retries when a tree reports `NoRoomOnTree`.
    pub max_capacity_retries: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            container_lock_timeout: Duration::from_millis(DEFAULT_CONTAINER_LOCK_TIMEOUT_MS),
            max_capacity_retries: DEFAULT_MAX_CAPACITY_RETRIES,
        }
    }
}

impl CacheConfig {
    /// Creates a config with the given page size.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }
}

/// Lock manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Whether to collect lock statistics.
    pub enable_stats: bool,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { enable_stats: true }
    }
}

/// Transaction manager configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxnConfig {
    /// Maximum number of concurrently active transaction batches.
    pub max_active_batches: usize,
}

impl Default for TxnConfig {
    fn default() -> Self {
        Self {
            max_active_batches: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cache.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.cache.max_capacity_retries, DEFAULT_MAX_CAPACITY_RETRIES);
        assert!(config.lock.enable_stats);
    }

    #[test]
    fn test_with_page_size() {
        let cache = CacheConfig::with_page_size(1024);
        assert_eq!(cache.page_size, 1024);
    }
}
