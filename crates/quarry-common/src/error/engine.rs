//! Engine error types.
//!
//! Provides the unified error type for all engine operations.

use std::fmt;
use thiserror::Error;

use crate::types::{BatchId, PageId, PlanId, RowId, TreeAddress};

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Unknown or unspecified error.
    Unknown = 0x0000,
    /// Internal error (bug).
    Internal = 0x0001,
    /// Invalid argument provided.
    InvalidArgument = 0x0002,
    /// Operation timed out.
    Timeout = 0x0003,
    /// Operation was cancelled.
    Cancelled = 0x0004,

    // Cache errors (0x0100 - 0x01FF)
    /// Tree not loaded into memory.
    TreeNotInMemory = 0x0100,
    /// Tree has no pages.
    NoPagesOnTree = 0x0101,
    /// No page on the tree has room.
    NoRoomOnTree = 0x0102,
    /// New-page retry budget exhausted.
    CapacityExhausted = 0x0103,
    /// Row not found.
    RowNotFound = 0x0104,
    /// Page not found.
    PageNotFound = 0x0105,
    /// Container lock acquisition timed out.
    LockTimeout = 0x0106,
    /// Cache corruption detected.
    Corrupted = 0x0107,

    // Lock errors (0x0200 - 0x02FF)
    /// A lock request conflicted with an existing grant.
    LockConflict = 0x0200,

    // Transaction errors (0x0300 - 0x03FF)
    /// Transaction batch not found.
    BatchNotFound = 0x0300,
    /// Too many active transaction batches.
    TooManyBatches = 0x0301,

    // Query errors (0x0400 - 0x04FF)
    /// User lacks the required permission.
    PermissionDenied = 0x0400,
    /// Table not found.
    TableNotFound = 0x0401,
    /// Column not found.
    ColumnNotFound = 0x0402,
    /// Type mismatch between a value and its column.
    TypeMismatch = 0x0403,
    /// Plan execution failed.
    ExecutionFailed = 0x0404,
    /// Plan not found in the active set.
    PlanNotFound = 0x0405,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Cache",
            0x02 => "Lock",
            0x03 => "Transaction",
            0x04 => "Query",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for QuarryDB.
///
/// Structural cache conditions (`TreeNotInMemory`, `NoPagesOnTree`,
/// `NoRoomOnTree`) are recoverable: callers react by loading or supplying a
/// page and retrying. `Internal` and `Corrupted` indicate invariant
/// violations and terminate the current plan execution.
///
/// # Example
///
/// ```rust
/// use quarry_common::error::{QuarryError, QuarryResult};
/// use quarry_common::types::{TreeAddress, DatabaseId, TableId, SchemaId};
///
/// fn load(tree: TreeAddress) -> QuarryResult<()> {
///     Err(QuarryError::TreeNotInMemory { tree })
/// }
/// ```
#[derive(Debug, Error)]
pub enum QuarryError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// Invalid argument provided.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Error message.
        message: String,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        duration_ms: u64,
    },

    /// Operation was cancelled.
    #[error("operation was cancelled")]
    Cancelled,

    // ==========================================================================
    // Cache Errors
    // ==========================================================================
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

    /// No page on the tree has room for the row.
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

    /// A tree container's lock could not be acquired in time.
    #[error("container lock timeout on tree {tree} after {duration_ms}ms")]
    LockTimeout {
        /// The contended tree.
        tree: TreeAddress,
        /// How long the acquisition waited.
        duration_ms: u64,
    },

    /// Cache corruption detected (invariant violation).
    #[error("cache corruption: {message}")]
    Corrupted {
        /// Description of the violated invariant.
        message: String,
    },

    // ==========================================================================
    // Lock Errors
    // ==========================================================================
    /// A lock request conflicted with an existing grant.
    #[error("lock conflict: {held}")]
    LockConflict {
        /// Description of the conflicting grant.
        held: String,
    },

    // ==========================================================================
    // Transaction Errors
    // ==========================================================================
    /// Transaction batch not found.
    #[error("transaction batch {batch_id} not found")]
    BatchNotFound {
        /// The missing batch.
        batch_id: BatchId,
    },

    /// Too many active transaction batches.
    #[error("too many active batches: limit is {limit}")]
    TooManyBatches {
        /// Configured limit.
        limit: usize,
    },

    // ==========================================================================
    // Query Errors
    // ==========================================================================
    /// User lacks the required permission.
    #[error("user '{user}' lacks permission {permission}")]
    PermissionDenied {
        /// The requesting user.
        user: String,
        /// The missing permission.
        permission: String,
    },

    /// Table not found.
    #[error("table '{table}' not found")]
    TableNotFound {
        /// The missing table.
        table: String,
    },

    /// Column not found.
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound {
        /// The missing column.
        column: String,
        /// The table name.
        table: String,
    },

    /// Type mismatch between a value and its column.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    /// Plan execution failed.
    #[error("plan execution failed: {reason}")]
    ExecutionFailed {
        /// Reason for failure.
        reason: String,
    },

    /// Plan not found in the active set.
    #[error("plan {plan_id} is not active")]
    PlanNotFound {
        /// The missing plan.
        plan_id: PlanId,
    },
}

impl QuarryError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Timeout { .. } => ErrorCode::Timeout,
            Self::Cancelled => ErrorCode::Cancelled,
            Self::TreeNotInMemory { .. } => ErrorCode::TreeNotInMemory,
            Self::NoPagesOnTree { .. } => ErrorCode::NoPagesOnTree,
            Self::NoRoomOnTree { .. } => ErrorCode::NoRoomOnTree,
            Self::CapacityExhausted { .. } => ErrorCode::CapacityExhausted,
            Self::RowNotFound { .. } => ErrorCode::RowNotFound,
            Self::PageNotFound { .. } => ErrorCode::PageNotFound,
            Self::LockTimeout { .. } => ErrorCode::LockTimeout,
            Self::Corrupted { .. } => ErrorCode::Corrupted,
            Self::LockConflict { .. } => ErrorCode::LockConflict,
            Self::BatchNotFound { .. } => ErrorCode::BatchNotFound,
            Self::TooManyBatches { .. } => ErrorCode::TooManyBatches,
            Self::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            Self::TableNotFound { .. } => ErrorCode::TableNotFound,
            Self::ColumnNotFound { .. } => ErrorCode::ColumnNotFound,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::ExecutionFailed { .. } => ErrorCode::ExecutionFailed,
            Self::PlanNotFound { .. } => ErrorCode::PlanNotFound,
        }
    }

    /// Returns true if this error is recoverable by reacting and retrying.
    ///
    /// Structural cache statuses and lock conflicts are recoverable; the
    /// caller reacts (supplies a page, backs off) and retries. Invariant
    /// violations are not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TreeNotInMemory { .. }
                | Self::NoPagesOnTree { .. }
                | Self::NoRoomOnTree { .. }
                | Self::LockConflict { .. }
                | Self::LockTimeout { .. }
                | Self::Timeout { .. }
        )
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    #[must_use]
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DatabaseId, SchemaId, TableId};

    fn tree() -> TreeAddress {
        TreeAddress::new(DatabaseId::new(1), TableId::new(2), SchemaId::new(1))
    }

    #[test]
    fn test_error_code() {
        let err = QuarryError::TreeNotInMemory { tree: tree() };
        assert_eq!(err.code(), ErrorCode::TreeNotInMemory);
        assert_eq!(err.code().category(), "Cache");
    }

    #[test]
    fn test_error_display() {
        let err = QuarryError::NoRoomOnTree {
            tree: tree(),
            row_size: 64,
        };
        assert_eq!(err.to_string(), "no room on tree 1.1.2 for 64 bytes");
    }

    #[test]
    fn test_recoverable() {
        assert!(QuarryError::NoPagesOnTree { tree: tree() }.is_recoverable());
        assert!(QuarryError::LockConflict {
            held: "x".to_string()
        }
        .is_recoverable());
        assert!(!QuarryError::corrupted("bad").is_recoverable());
    }
}
