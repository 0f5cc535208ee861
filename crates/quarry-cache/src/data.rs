//! The data cache: tree registry and row/value routing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use quarry_common::config::CacheConfig;
use quarry_common::types::{
    ColumnId, PageAddress, RowAddress, RowId, TreeAddress, ValueAddress,
};
use quarry_storage::{Row, TableSchema, Value, ValueComparison};

use crate::container::TreeContainer;
use crate::error::{CacheError, CacheResult};

/// Why a tree cannot accept a row right now, or that it can.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStatus {
    /// The tree is not loaded; the caller must register it first.
    NotInMemory,
    /// The tree is loaded but holds no pages.
    NoPages,
    /// Every page is full for the probed row size.
    NoRoom,
    /// At least one page has room.
    HasRoom,
}

/// Holds one [`TreeContainer`] per loaded tree and routes row and value
/// operations to them.
///
/// The registry map is behind its own `RwLock`; containers are `Arc`-shared
/// so operations run outside the registry lock.
pub struct DataCache {
    trees: RwLock<HashMap<TreeAddress, Arc<TreeContainer>>>,
    config: CacheConfig,
}

impl DataCache {
    /// Creates an empty data cache.
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            trees: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Registers a tree, creating its (empty) container.
    ///
    /// Re-registering an already-loaded tree is a no-op returning the
    /// existing container.
    pub fn register_tree(&self, schema: TableSchema) -> Arc<TreeContainer> {
        let mut trees = self.trees.write();
        Arc::clone(trees.entry(schema.tree).or_insert_with(|| {
            tracing::debug!(tree = %schema.tree, table = %schema.name, "tree registered");
            Arc::new(TreeContainer::new(
                schema,
                self.config.container_lock_timeout,
            ))
        }))
    }

    /// Removes a tree from memory. Returns true if it was loaded.
    pub fn evict_tree(&self, tree: TreeAddress) -> bool {
        self.trees.write().remove(&tree).is_some()
    }

    /// Returns the container for a tree.
    pub fn tree(&self, tree: TreeAddress) -> CacheResult<Arc<TreeContainer>> {
        self.trees
            .read()
            .get(&tree)
            .cloned()
            .ok_or(CacheError::TreeNotInMemory { tree })
    }

    /// Returns true if the tree is loaded.
    #[must_use]
    pub fn contains_tree(&self, tree: TreeAddress) -> bool {
        self.trees.read().contains_key(&tree)
    }

    /// Returns the addresses of all loaded trees.
    #[must_use]
    pub fn loaded_trees(&self) -> Vec<TreeAddress> {
        self.trees.read().keys().copied().collect()
    }

    /// Probes what would happen to an add of `row_size` bytes.
    pub fn tree_status(&self, tree: TreeAddress, row_size: usize) -> CacheResult<TreeStatus> {
        let Ok(container) = self.tree(tree) else {
            return Ok(TreeStatus::NotInMemory);
        };
        if container.is_empty()? {
            return Ok(TreeStatus::NoPages);
        }
        if container.is_tree_full(row_size)? {
            return Ok(TreeStatus::NoRoom);
        }
        Ok(TreeStatus::HasRoom)
    }

    // =========================================================================
    // Row operations
    // =========================================================================

    /// Adds a row to the tree.
    pub fn add_row(&self, tree: TreeAddress, row: &Row) -> CacheResult<RowAddress> {
        self.tree(tree)?.add_row(row)
    }

    /// Updates a row on the tree by its stable ID.
    pub fn update_row(&self, tree: TreeAddress, row: &Row) -> CacheResult<RowAddress> {
        self.tree(tree)?.update_row(row)
    }

    /// Deletes a row from the tree. Returns true if it existed.
    pub fn delete_row(&self, tree: TreeAddress, row_id: RowId) -> CacheResult<bool> {
        self.tree(tree)?.delete_row(row_id)
    }

    /// Reads a row by its stable ID.
    pub fn get_row(&self, tree: TreeAddress, row_id: RowId) -> CacheResult<Row> {
        self.tree(tree)?.get_row(row_id)
    }

    /// Returns the current physical address of a row.
    pub fn get_row_address(&self, tree: TreeAddress, row_id: RowId) -> CacheResult<RowAddress> {
        self.tree(tree)?.get_row_address(row_id)
    }

    /// Returns the addresses of all live rows on the tree.
    pub fn row_addresses(&self, tree: TreeAddress) -> CacheResult<Vec<RowAddress>> {
        self.tree(tree)?.row_addresses()
    }

    /// Returns every page referencing the row.
    pub fn page_references_to_row(
        &self,
        tree: TreeAddress,
        row_id: RowId,
    ) -> CacheResult<Vec<PageAddress>> {
        self.tree(tree)?.page_references_to_row(row_id)
    }

    // =========================================================================
    // Value addressing and scans
    // =========================================================================

    /// Returns byte-exact addresses for one column across all live rows.
    pub fn value_addresses_for_column(
        &self,
        tree: TreeAddress,
        column_id: ColumnId,
    ) -> CacheResult<Vec<ValueAddress>> {
        self.tree(tree)?.value_addresses_for_column(column_id)
    }

    /// Returns value addresses for one column restricted to the given rows.
    pub fn values_for_column_by_rows(
        &self,
        tree: TreeAddress,
        column_id: ColumnId,
        rows: &[RowId],
    ) -> CacheResult<Vec<ValueAddress>> {
        self.tree(tree)?.value_addresses_for_rows(column_id, rows)
    }

    /// Reads the value at a byte-exact address.
    pub fn value_at_address(&self, address: &ValueAddress) -> CacheResult<Value> {
        self.tree(address.tree)?.value_at(address)
    }

    /// Returns true if any live row matches the comparison.
    pub fn has_value(
        &self,
        tree: TreeAddress,
        column_id: ColumnId,
        comparison: ValueComparison,
        literal: &Value,
    ) -> CacheResult<bool> {
        self.tree(tree)?.has_value(column_id, comparison, literal)
    }

    /// Counts live rows matching the comparison.
    pub fn count_rows_with_value(
        &self,
        tree: TreeAddress,
        column_id: ColumnId,
        comparison: ValueComparison,
        literal: &Value,
    ) -> CacheResult<usize> {
        self.tree(tree)?
            .count_rows_with_value(column_id, comparison, literal)
    }

    /// Returns the addresses of live rows matching the comparison.
    pub fn row_addresses_with_value(
        &self,
        tree: TreeAddress,
        column_id: ColumnId,
        comparison: ValueComparison,
        literal: &Value,
    ) -> CacheResult<Vec<RowAddress>> {
        self.tree(tree)?
            .row_addresses_with_value(column_id, comparison, literal)
    }
}

impl std::fmt::Debug for DataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCache")
            .field("trees", &self.trees.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::types::{DatabaseId, PageId, SchemaId, TableId};
    use quarry_storage::{ColumnSchema, DataType, RowPage};

    fn tree() -> TreeAddress {
        TreeAddress::new(DatabaseId::new(1), TableId::new(1), SchemaId::new(1))
    }

    fn schema() -> TableSchema {
        TableSchema::new(
            tree(),
            "t",
            vec![ColumnSchema::new(
                ColumnId::new(1),
                "id",
                DataType::Int,
                false,
                0,
            )],
        )
    }

    #[test]
    fn test_unregistered_tree() {
        let cache = DataCache::new(CacheConfig::default());
        assert!(matches!(
            cache.get_row(tree(), RowId::new(1)),
            Err(CacheError::TreeNotInMemory { .. })
        ));
        assert_eq!(
            cache.tree_status(tree(), 8).unwrap(),
            TreeStatus::NotInMemory
        );
    }

    #[test]
    fn test_status_transitions() {
        let cache = DataCache::new(CacheConfig::with_page_size(256));
        let container = cache.register_tree(schema());
        assert_eq!(cache.tree_status(tree(), 8).unwrap(), TreeStatus::NoPages);

        container
            .add_page(RowPage::new(PageId::new(1), 256))
            .unwrap();
        assert_eq!(cache.tree_status(tree(), 8).unwrap(), TreeStatus::HasRoom);
        assert_eq!(cache.tree_status(tree(), 4096).unwrap(), TreeStatus::NoRoom);
    }

    #[test]
    fn test_routing() {
        let cache = DataCache::new(CacheConfig::with_page_size(256));
        let container = cache.register_tree(schema());
        container
            .add_page(RowPage::new(PageId::new(1), 256))
            .unwrap();

        let row = Row::new(RowId::new(1), vec![Value::Int(42)]);
        cache.add_row(tree(), &row).unwrap();
        assert_eq!(cache.get_row(tree(), RowId::new(1)).unwrap(), row);

        assert!(cache.evict_tree(tree()));
        assert!(!cache.contains_tree(tree()));
    }
}
