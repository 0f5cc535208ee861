//! Transaction errors.

use quarry_common::error::QuarryError;
use quarry_common::types::BatchId;
use thiserror::Error;

/// Result type for transaction operations.
pub type TxnResult<T> = Result<T, TxnError>;

/// Errors raised by the transaction manager.
#[derive(Debug, Error)]
pub enum TxnError {
    /// The batch is not in the active set.
    #[error("transaction batch {batch_id} not found")]
    BatchNotFound {
        /// The missing batch.
        batch_id: BatchId,
    },

    /// The active-batch limit was reached.
    #[error("too many active batches: limit is {limit}")]
    TooManyBatches {
        /// Configured limit.
        limit: usize,
    },
}

impl From<TxnError> for QuarryError {
    fn from(err: TxnError) -> Self {
        match err {
            TxnError::BatchNotFound { batch_id } => Self::BatchNotFound { batch_id },
            TxnError::TooManyBatches { limit } => Self::TooManyBatches { limit },
        }
    }
}
