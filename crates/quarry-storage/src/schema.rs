//! Column and table schema definitions.
//!
//! The schema fixes the binary sort order of a row's columns: all
//! fixed-length columns come first, then all variable-length columns, each
//! group ordered by ordinal. Both the row serializer and value-address
//! resolution walk columns in this order, so the two can never disagree
//! about where a value lives.

use serde::{Deserialize, Serialize};
use std::fmt;

use quarry_common::types::{ColumnId, TreeAddress};

/// The data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean, 1 byte.
    Bool,
    /// 32-bit signed integer, 4 bytes.
    Int,
    /// 64-bit signed integer, 8 bytes.
    BigInt,
    /// 64-bit floating point, 8 bytes.
    Decimal,
    /// Microseconds since the Unix epoch, 8 bytes.
    DateTime,
    /// Fixed-length character data, exactly `n` bytes, zero-padded.
    Char(u16),
    /// Variable-length character data, at most `n` bytes.
    Varchar(u16),
}

impl DataType {
    /// Returns the fixed serialized size in bytes, or `None` for
    /// variable-length types.
    #[must_use]
    pub const fn fixed_size(&self) -> Option<usize> {
        match self {
            DataType::Bool => Some(1),
            DataType::Int => Some(4),
            DataType::BigInt | DataType::Decimal | DataType::DateTime => Some(8),
            DataType::Char(n) => Some(*n as usize),
            DataType::Varchar(_) => None,
        }
    }

    /// Returns true if this type serializes to a fixed number of bytes.
    #[inline]
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        self.fixed_size().is_some()
    }

    /// Returns the declared capacity for character types.
    #[must_use]
    pub const fn max_length(&self) -> Option<usize> {
        match self {
            DataType::Char(n) | DataType::Varchar(n) => Some(*n as usize),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "BOOL"),
            DataType::Int => write!(f, "INT"),
            DataType::BigInt => write!(f, "BIGINT"),
            DataType::Decimal => write!(f, "DECIMAL"),
            DataType::DateTime => write!(f, "DATETIME"),
            DataType::Char(n) => write!(f, "CHAR({})", n),
            DataType::Varchar(n) => write!(f, "VARCHAR({})", n),
        }
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// The column ID, unique within the table.
    pub id: ColumnId,
    /// The column name.
    pub name: String,
    /// The column's data type.
    pub data_type: DataType,
    /// Whether the column accepts nulls.
    pub nullable: bool,
    /// Declaration position, 0-based.
    pub ordinal: u32,
}

impl ColumnSchema {
    /// Creates a new column schema.
    #[must_use]
    pub fn new(
        id: ColumnId,
        name: impl Into<String>,
        data_type: DataType,
        nullable: bool,
        ordinal: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
            nullable,
            ordinal,
        }
    }
}

/// The schema of one table.
///
/// Columns are stored in declaration order; [`TableSchema::binary_order`]
/// yields them in the on-page serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// The storage tree the table's rows live on.
    pub tree: TreeAddress,
    /// The table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Creates a new table schema.
    #[must_use]
    pub fn new(tree: TreeAddress, name: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self {
            tree,
            name: name.into(),
            columns,
        }
    }

    /// Returns the columns in binary sort order: fixed-length columns
    /// first, then variable-length, each group by ordinal.
    #[must_use]
    pub fn binary_order(&self) -> Vec<&ColumnSchema> {
        let mut fixed: Vec<&ColumnSchema> =
            self.columns.iter().filter(|c| c.data_type.is_fixed()).collect();
        fixed.sort_by_key(|c| c.ordinal);
        let mut variable: Vec<&ColumnSchema> =
            self.columns.iter().filter(|c| !c.data_type.is_fixed()).collect();
        variable.sort_by_key(|c| c.ordinal);
        fixed.extend(variable);
        fixed
    }

    /// Looks up a column by ID.
    #[must_use]
    pub fn column(&self, id: ColumnId) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column_by_name(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the declaration index of a column.
    #[must_use]
    pub fn column_index(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }
}
