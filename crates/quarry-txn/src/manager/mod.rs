//! Transaction batch lifecycle.
//!
//! A *batch* is the unit of isolation: one plan execution runs under one
//! batch, and every lock the plan takes is tagged with its batch ID. The
//! manager issues monotonically increasing IDs and tracks the in-flight
//! batches.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;

use quarry_common::config::TxnConfig;
use quarry_common::types::{BatchId, PlanId};

use crate::error::{TxnError, TxnResult};

/// One in-flight transaction batch.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    /// The batch's ID.
    pub batch_id: BatchId,
    /// The plan running under this batch.
    pub plan_id: PlanId,
    /// The requesting user.
    pub user_name: String,
    /// When the batch began.
    pub started_at: Instant,
}

/// Issues batch IDs and tracks in-flight batches.
#[derive(Debug)]
pub struct TransactionManager {
    next_batch_id: AtomicU64,
    active: RwLock<HashMap<BatchId, TransactionRequest>>,
    config: TxnConfig,
}

impl TransactionManager {
    /// Creates a transaction manager.
    #[must_use]
    pub fn new(config: TxnConfig) -> Self {
        Self {
            next_batch_id: AtomicU64::new(1),
            active: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Begins a batch for a plan execution.
    pub fn begin_batch(&self, plan_id: PlanId, user_name: &str) -> TxnResult<BatchId> {
        let mut active = self.active.write();
        if active.len() >= self.config.max_active_batches {
            return Err(TxnError::TooManyBatches {
                limit: self.config.max_active_batches,
            });
        }
        let batch_id = BatchId::new(self.next_batch_id.fetch_add(1, Ordering::SeqCst));
        active.insert(
            batch_id,
            TransactionRequest {
                batch_id,
                plan_id,
                user_name: user_name.to_string(),
                started_at: Instant::now(),
            },
        );
        tracing::debug!(batch = %batch_id, plan = %plan_id, user = user_name, "batch started");
        Ok(batch_id)
    }

    /// Ends a batch, removing it from the active set.
    pub fn end_batch(&self, batch_id: BatchId) -> TxnResult<TransactionRequest> {
        let removed = self
            .active
            .write()
            .remove(&batch_id)
            .ok_or(TxnError::BatchNotFound { batch_id })?;
        tracing::debug!(batch = %batch_id, "batch ended");
        Ok(removed)
    }

    /// Returns true if the batch is in flight.
    #[must_use]
    pub fn is_active(&self, batch_id: BatchId) -> bool {
        self.active.read().contains_key(&batch_id)
    }

    /// Returns the number of in-flight batches.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.read().len()
    }

    /// Returns a snapshot of the in-flight batches.
    #[must_use]
    pub fn active_batches(&self) -> Vec<TransactionRequest> {
        self.active.read().values().cloned().collect()
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new(TxnConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_lifecycle() {
        let manager = TransactionManager::default();
        let batch = manager.begin_batch(PlanId::new(1), "alice").unwrap();
        assert!(manager.is_active(batch));
        assert_eq!(manager.active_count(), 1);

        let request = manager.end_batch(batch).unwrap();
        assert_eq!(request.user_name, "alice");
        assert!(!manager.is_active(batch));
    }

    #[test]
    fn test_ids_are_monotonic() {
        let manager = TransactionManager::default();
        let a = manager.begin_batch(PlanId::new(1), "u").unwrap();
        let b = manager.begin_batch(PlanId::new(2), "u").unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_end_unknown_batch() {
        let manager = TransactionManager::default();
        assert!(matches!(
            manager.end_batch(BatchId::new(99)),
            Err(TxnError::BatchNotFound { .. })
        ));
    }

    #[test]
    fn test_active_batch_limit() {
        let manager = TransactionManager::new(TxnConfig {
            max_active_batches: 1,
        });
        manager.begin_batch(PlanId::new(1), "u").unwrap();
        assert!(matches!(
            manager.begin_batch(PlanId::new(2), "u"),
            Err(TxnError::TooManyBatches { limit: 1 })
        ));
    }
}
