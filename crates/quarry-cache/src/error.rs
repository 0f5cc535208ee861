//! Cache errors.
//!
//! The structural statuses (`TreeNotInMemory`, `NoPagesOnTree`,
//! `NoRoomOnTree`) are recoverable: the cache manager reacts by loading or
//! supplying a page and retrying. `Corrupted` signals a violated invariant
//! and terminates the current operation.

use quarry_common::error::QuarryError;
use quarry_common::types::{PageId, RowId, TreeAddress};
use quarry_storage::StorageError;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by the tree container and cache layers.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The addressed tree is not loaded into memory.
    #[error("tree {tree} is not in memory")]
    TreeNotInMemory {
        /// The missing tree.
        tree: TreeAddress,
    },

    /// The tree is loaded but holds no pages.
    #[error("tree {tree} has no pages")]
    NoPagesOnTree {
        /// The empty tree.
        tree: TreeAddress,
    },

    /// No page on the tree can fit the row.
    #[error("no room on tree {tree} for {row_size} bytes")]
    NoRoomOnTree {
        /// The full tree.
        tree: TreeAddress,
        /// Size of the row that could not be placed.
        row_size: usize,
    },

    /// The new-page retry budget was exhausted.
    #[error("capacity exhausted on tree {tree} after {retries} retries")]
    CapacityExhausted {
        /// The tree that ran out of room.
        tree: TreeAddress,
        /// Number of retries attempted.
        retries: u32,
    },

    /// Row not found on the tree.
    #[error("row {row_id} not found on tree {tree}")]
    RowNotFound {
        /// The tree searched.
        tree: TreeAddress,
        /// The missing row.
        row_id: RowId,
    },

    /// Page not found on the tree.
    #[error("page {page_id} not found on tree {tree}")]
    PageNotFound {
        /// The tree searched.
        tree: TreeAddress,
        /// The missing page.
        page_id: PageId,
    },

    /// A page with this ID is already installed on the tree.
    #[error("page {page_id} already on tree {tree}")]
    DuplicatePage {
        /// The tree.
        tree: TreeAddress,
        /// The duplicate page.
        page_id: PageId,
    },

    /// The container's reader-writer lock could not be acquired in time.
    #[error("container lock timeout on tree {tree} after {duration_ms}ms")]
    LockTimeout {
        /// The contended tree.
        tree: TreeAddress,
        /// How long the acquisition waited.
        duration_ms: u64,
    },

    /// A cache invariant was violated.
    #[error("cache corruption: {message}")]
    Corrupted {
        /// Description of the violated invariant.
        message: String,
    },

    /// An underlying page or layout operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CacheError> for QuarryError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::TreeNotInMemory { tree } => Self::TreeNotInMemory { tree },
            CacheError::NoPagesOnTree { tree } => Self::NoPagesOnTree { tree },
            CacheError::NoRoomOnTree { tree, row_size } => Self::NoRoomOnTree { tree, row_size },
            CacheError::CapacityExhausted { tree, retries } => {
                Self::CapacityExhausted { tree, retries }
            }
            CacheError::RowNotFound { tree, row_id } => Self::RowNotFound { tree, row_id },
            CacheError::PageNotFound { tree, page_id } => Self::PageNotFound { tree, page_id },
            CacheError::DuplicatePage { tree, page_id } => Self::Corrupted {
                message: format!("duplicate page {page_id} on tree {tree}"),
            },
            CacheError::LockTimeout { tree, duration_ms } => {
                Self::LockTimeout { tree, duration_ms }
            }
            CacheError::Corrupted { message } => Self::Corrupted { message },
            CacheError::Storage(err) => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::error::ErrorCode;
    use quarry_common::types::{DatabaseId, SchemaId, TableId};

    #[test]
    fn test_conversion_preserves_category() {
        let tree = TreeAddress::new(DatabaseId::new(1), TableId::new(1), SchemaId::new(1));
        let err: QuarryError = CacheError::NoPagesOnTree { tree }.into();
        assert_eq!(err.code(), ErrorCode::NoPagesOnTree);

        let err: QuarryError = CacheError::LockTimeout {
            tree,
            duration_ms: 5000,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::LockTimeout);
    }
}
