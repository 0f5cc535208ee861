//! Logical addresses for trees, pages, rows, and values.
//!
//! Addresses form a hierarchy: a `TreeAddress` names one table's storage
//! tree, a `PageAddress` names one page within a tree, a `RowAddress`
//! names one row by its stable ID plus its current physical slot, and a
//! `ValueAddress` locates a single column value down to the byte.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ColumnId, DatabaseId, PageId, RowId, SchemaId, TableId};
use super::SlotId;

/// The identity of one table's storage tree.
///
/// Immutable, `Copy`, and used as the cache map key: exactly one
/// `TreeContainer` exists per loaded tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeAddress {
    /// The database the tree belongs to.
    pub database_id: DatabaseId,
    /// The table the tree stores rows for.
    pub table_id: TableId,
    /// The schema the table lives in.
    pub schema_id: SchemaId,
}

impl TreeAddress {
    /// Creates a new tree address.
    #[inline]
    #[must_use]
    pub const fn new(database_id: DatabaseId, table_id: TableId, schema_id: SchemaId) -> Self {
        Self {
            database_id,
            table_id,
            schema_id,
        }
    }

    /// Returns the page address for `page_id` within this tree.
    #[inline]
    #[must_use]
    pub const fn page(self, page_id: PageId) -> PageAddress {
        PageAddress {
            tree: self,
            page_id,
        }
    }
}

impl fmt::Debug for TreeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TreeAddress(db={}, schema={}, table={})",
            self.database_id, self.schema_id, self.table_id
        )
    }
}

impl fmt::Display for TreeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.database_id, self.schema_id, self.table_id
        )
    }
}

/// The identity of one page within a tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageAddress {
    /// The tree the page belongs to.
    pub tree: TreeAddress,
    /// The page ID, unique within the tree.
    pub page_id: PageId,
}

impl PageAddress {
    /// Creates a new page address.
    #[inline]
    #[must_use]
    pub const fn new(tree: TreeAddress, page_id: PageId) -> Self {
        Self { tree, page_id }
    }
}

impl fmt::Debug for PageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageAddress({}, page={})", self.tree, self.page_id)
    }
}

impl fmt::Display for PageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tree, self.page_id)
    }
}

/// The logical handle to a row.
///
/// `row_id` is stable for the life of the row; `page_id` and `slot` name
/// the page and slot currently holding the row's canonical bytes. When a
/// row is forwarded its address changes but its ID does not.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowAddress {
    /// The page holding the canonical copy of the row.
    pub page_id: PageId,
    /// The stable row ID.
    pub row_id: RowId,
    /// The slot index within the page.
    pub slot: SlotId,
}

impl RowAddress {
    /// Creates a new row address.
    #[inline]
    #[must_use]
    pub const fn new(page_id: PageId, row_id: RowId, slot: SlotId) -> Self {
        Self {
            page_id,
            row_id,
            slot,
        }
    }
}

impl fmt::Debug for RowAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RowAddress(page={}, row={}, slot={})",
            self.page_id, self.row_id, self.slot
        )
    }
}

impl fmt::Display for RowAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}/{}", self.row_id, self.page_id, self.slot)
    }
}

/// The byte-exact locator of a single column value within a page.
///
/// `value_offset` is absolute within the page buffer and is computed by
/// walking the row's binary layout in column sort order; `parse_length`
/// is the number of bytes the value occupies (excluding any presence
/// byte or length prefix). NULL is carried as its own flag: an empty
/// varlen value also has `parse_length` 0, so length alone cannot
/// distinguish the two.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueAddress {
    /// The tree holding the value.
    pub tree: TreeAddress,
    /// The page holding the value.
    pub page_id: PageId,
    /// The row the value belongs to.
    pub row_id: RowId,
    /// The slot of the row within the page.
    pub slot: SlotId,
    /// Absolute byte offset of the value within the page buffer.
    pub value_offset: usize,
    /// Number of bytes to parse at `value_offset`.
    pub parse_length: usize,
    /// Whether the cell is NULL.
    pub is_null: bool,
    /// The column the value belongs to.
    pub column_id: ColumnId,
}

impl ValueAddress {
    /// Returns the row address this value belongs to.
    #[inline]
    #[must_use]
    pub const fn row_address(&self) -> RowAddress {
        RowAddress::new(self.page_id, self.row_id, self.slot)
    }
}

impl fmt::Debug for ValueAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ValueAddress(page={}, row={}, col={}, off={}, len={}, null={})",
            self.page_id, self.row_id, self.column_id, self.value_offset, self.parse_length,
            self.is_null
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> TreeAddress {
        TreeAddress::new(DatabaseId::new(1), TableId::new(2), SchemaId::new(1))
    }

    #[test]
    fn test_tree_address_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(tree(), "container");
        assert_eq!(map.get(&tree()), Some(&"container"));

        let other = TreeAddress::new(DatabaseId::new(1), TableId::new(3), SchemaId::new(1));
        assert!(!map.contains_key(&other));
    }

    #[test]
    fn test_page_address() {
        let page = tree().page(PageId::new(9));
        assert_eq!(page.page_id, PageId::new(9));
        assert_eq!(page.tree, tree());
    }

    #[test]
    fn test_row_address_display() {
        let addr = RowAddress::new(PageId::new(3), RowId::new(12), 4);
        assert_eq!(format!("{}", addr), "12@3/4");
    }

    #[test]
    fn test_value_address_row() {
        let va = ValueAddress {
            tree: tree(),
            page_id: PageId::new(2),
            row_id: RowId::new(5),
            slot: 1,
            value_offset: 100,
            parse_length: 4,
            is_null: false,
            column_id: ColumnId::new(1),
        };
        assert_eq!(va.row_address(), RowAddress::new(PageId::new(2), RowId::new(5), 1));
    }
}
