//! Storage errors.

use quarry_common::types::{PageId, RowId, SlotId};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in the page and layout layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Page cannot fit the record.
    #[error("page {page_id} full: need {required} bytes, have {available}")]
    PageFull {
        /// The full page.
        page_id: PageId,
        /// Bytes required for the record, its header, and a slot.
        required: usize,
        /// Bytes available in free space.
        available: usize,
    },

    /// Slot not found or out of range.
    #[error("slot {slot} not found on page {page_id}")]
    SlotNotFound {
        /// The page searched.
        page_id: PageId,
        /// The missing slot.
        slot: SlotId,
    },

    /// Row not found on the page.
    #[error("row {row_id} not found on page {page_id}")]
    RowNotFound {
        /// The page searched.
        page_id: PageId,
        /// The missing row.
        row_id: RowId,
    },

    /// Value does not match its column's type.
    #[error("type mismatch for column '{column}': expected {expected}")]
    TypeMismatch {
        /// The column name.
        column: String,
        /// The column's declared type.
        expected: String,
    },

    /// A value exceeds its column's declared capacity.
    #[error("value for column '{column}' is {size} bytes, limit is {max}")]
    ValueTooLarge {
        /// The column name.
        column: String,
        /// Actual value size.
        size: usize,
        /// Declared maximum.
        max: usize,
    },

    /// A non-nullable column received a null value.
    #[error("null value for non-nullable column '{column}'")]
    UnexpectedNull {
        /// The column name.
        column: String,
    },

    /// Column not present in the schema.
    #[error("column {column_id} not in schema for table '{table}'")]
    UnknownColumn {
        /// The table name.
        table: String,
        /// The missing column.
        column_id: quarry_common::types::ColumnId,
    },

    /// Row value count does not match the schema.
    #[error("row has {actual} values, schema has {expected} columns")]
    ColumnCountMismatch {
        /// Columns in the schema.
        expected: usize,
        /// Values in the row.
        actual: usize,
    },

    /// Serialized bytes do not decode under the schema.
    #[error("malformed row payload: {reason}")]
    MalformedPayload {
        /// What failed to decode.
        reason: String,
    },
}
