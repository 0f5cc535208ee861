//! Cache statistics for monitoring and debugging.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for row cache operations.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of rows added.
    rows_added: AtomicU64,
    /// Number of rows updated (in place or relocated).
    rows_updated: AtomicU64,
    /// Number of updates that created or moved a forward stub.
    rows_forwarded: AtomicU64,
    /// Number of rows deleted.
    rows_deleted: AtomicU64,
    /// Number of row reads.
    reads: AtomicU64,
    /// Number of pages provisioned after a capacity miss.
    pages_provisioned: AtomicU64,
}

impl CacheStats {
    /// Creates new statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a row insertion.
    #[inline]
    pub fn record_add(&self) {
        self.rows_added.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a row update.
    #[inline]
    pub fn record_update(&self) {
        self.rows_updated.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a forwarding event.
    #[inline]
    pub fn record_forward(&self) {
        self.rows_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a row deletion.
    #[inline]
    pub fn record_delete(&self) {
        self.rows_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a row read.
    #[inline]
    pub fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a provisioned page.
    #[inline]
    pub fn record_page_provisioned(&self) {
        self.pages_provisioned.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns rows added.
    pub fn rows_added(&self) -> u64 {
        self.rows_added.load(Ordering::Relaxed)
    }

    /// Returns rows updated.
    pub fn rows_updated(&self) -> u64 {
        self.rows_updated.load(Ordering::Relaxed)
    }

    /// Returns forwarding events.
    pub fn rows_forwarded(&self) -> u64 {
        self.rows_forwarded.load(Ordering::Relaxed)
    }

    /// Returns rows deleted.
    pub fn rows_deleted(&self) -> u64 {
        self.rows_deleted.load(Ordering::Relaxed)
    }

    /// Returns row reads.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns pages provisioned.
    pub fn pages_provisioned(&self) -> u64 {
        self.pages_provisioned.load(Ordering::Relaxed)
    }

    /// Resets all statistics.
    pub fn reset(&self) {
        self.rows_added.store(0, Ordering::Relaxed);
        self.rows_updated.store(0, Ordering::Relaxed);
        self.rows_forwarded.store(0, Ordering::Relaxed);
        self.rows_deleted.store(0, Ordering::Relaxed);
        self.reads.store(0, Ordering::Relaxed);
        self.pages_provisioned.store(0, Ordering::Relaxed);
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CacheStats {{ added: {}, updated: {}, forwarded: {}, deleted: {}, reads: {}, pages: {} }}",
            self.rows_added(),
            self.rows_updated(),
            self.rows_forwarded(),
            self.rows_deleted(),
            self.reads(),
            self.pages_provisioned()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_stats() {
        let stats = CacheStats::new();
        stats.record_add();
        stats.record_add();
        stats.record_forward();
        assert_eq!(stats.rows_added(), 2);
        assert_eq!(stats.rows_forwarded(), 1);
    }

    #[test]
    fn test_reset() {
        let stats = CacheStats::new();
        stats.record_read();
        stats.reset();
        assert_eq!(stats.reads(), 0);
    }
}
