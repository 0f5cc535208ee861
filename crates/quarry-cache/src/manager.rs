//! The cache manager: the façade the executor talks to.
//!
//! The manager wraps the data and system caches and reacts to the
//! recoverable capacity statuses: when a tree reports `NoPagesOnTree` or
//! `NoRoomOnTree`, it provisions a page (from the injected [`PageSource`]
//! when storage has one, otherwise freshly allocated) and retries the
//! operation. Retries are capped by `CacheConfig::max_capacity_retries`;
//! exceeding the cap surfaces [`CacheError::CapacityExhausted`] instead of
//! looping.

use std::sync::Arc;

use bytes::Bytes;

use quarry_common::config::CacheConfig;
use quarry_common::types::{PageId, RowAddress, RowId, TreeAddress};
use quarry_storage::{Row, RowPage, TableSchema};

use crate::container::TreeContainer;
use crate::data::DataCache;
use crate::error::{CacheError, CacheResult};
use crate::system::SystemCache;

/// The external storage collaborator that can supply page bytes.
///
/// Persistence is out of scope for the cache: the source hands over page
/// images and is never written back to. Returning `None` means storage has
/// no page with that ID and the manager allocates a fresh one.
pub trait PageSource: Send + Sync {
    /// Fetches the bytes of one page of a tree, if storage has it.
    fn fetch_page(&self, tree: TreeAddress, page_id: PageId) -> Option<Bytes>;
}

/// A page source with no pages; every request allocates fresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyPageSource;

impl PageSource for EmptyPageSource {
    fn fetch_page(&self, _tree: TreeAddress, _page_id: PageId) -> Option<Bytes> {
        None
    }
}

/// Routes cache operations and reacts to capacity statuses.
pub struct CacheManager {
    data: DataCache,
    system: SystemCache,
    source: Arc<dyn PageSource>,
    config: CacheConfig,
}

impl CacheManager {
    /// Creates a cache manager over the given page source.
    #[must_use]
    pub fn new(config: CacheConfig, source: Arc<dyn PageSource>) -> Self {
        Self {
            data: DataCache::new(config.clone()),
            system: SystemCache::new(),
            source,
            config,
        }
    }

    /// Creates a manager with no backing pages (tests, fresh engines).
    #[must_use]
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::new(config, Arc::new(EmptyPageSource))
    }

    /// Returns the data cache.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &DataCache {
        &self.data
    }

    /// Returns the system cache.
    #[inline]
    #[must_use]
    pub fn system(&self) -> &SystemCache {
        &self.system
    }

    /// Registers a tree, creating its container if needed.
    pub fn register_tree(&self, schema: TableSchema) -> Arc<TreeContainer> {
        self.data.register_tree(schema)
    }

    /// Adds a row, provisioning pages on capacity misses.
    pub fn try_add_row(&self, tree: TreeAddress, row: &Row) -> CacheResult<RowAddress> {
        self.with_capacity_retries(tree, |container| container.add_row(row))
    }

    /// Updates a row, provisioning pages when the grown row fits nowhere.
    pub fn update_row(&self, tree: TreeAddress, row: &Row) -> CacheResult<RowAddress> {
        self.with_capacity_retries(tree, |container| container.update_row(row))
    }

    /// Deletes a row. Returns true if it existed.
    pub fn delete_row(&self, tree: TreeAddress, row_id: RowId) -> CacheResult<bool> {
        self.data.delete_row(tree, row_id)
    }

    /// Reads a row by its stable ID.
    pub fn get_row(&self, tree: TreeAddress, row_id: RowId) -> CacheResult<Row> {
        self.data.get_row(tree, row_id)
    }

    /// Runs a container operation, provisioning a page and retrying on
    /// each capacity miss, up to the configured cap.
    fn with_capacity_retries<T>(
        &self,
        tree: TreeAddress,
        op: impl Fn(&TreeContainer) -> CacheResult<T>,
    ) -> CacheResult<T> {
        let container = self.data.tree(tree)?;
        let mut retries = 0u32;
        loop {
            match op(&container) {
                Err(CacheError::NoPagesOnTree { .. }) | Err(CacheError::NoRoomOnTree { .. })
                    if retries < self.config.max_capacity_retries =>
                {
                    retries += 1;
                    tracing::warn!(
                        tree = %tree,
                        retry = retries,
                        "tree out of room, provisioning a page"
                    );
                    self.provision_page(&container)?;
                }
                Err(CacheError::NoPagesOnTree { .. }) | Err(CacheError::NoRoomOnTree { .. }) => {
                    return Err(CacheError::CapacityExhausted { tree, retries });
                }
                other => return other,
            }
        }
    }

    /// Installs the next page for a tree, fetched or freshly allocated.
    fn provision_page(&self, container: &TreeContainer) -> CacheResult<()> {
        let page_id = container.next_page_id()?;
        let page = match self.source.fetch_page(container.tree(), page_id) {
            Some(bytes) => RowPage::from_bytes(bytes.to_vec())?,
            None => RowPage::new(page_id, self.config.page_size),
        };
        container.stats().record_page_provisioned();
        container.add_page(page)
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("data", &self.data)
            .field("system", &self.system)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::types::{ColumnId, DatabaseId, SchemaId, TableId};
    use quarry_storage::{ColumnSchema, DataType, Value};

    fn tree() -> TreeAddress {
        TreeAddress::new(DatabaseId::new(1), TableId::new(1), SchemaId::new(1))
    }

    fn schema() -> TableSchema {
        TableSchema::new(
            tree(),
            "t",
            vec![
                ColumnSchema::new(ColumnId::new(1), "id", DataType::Int, false, 0),
                ColumnSchema::new(ColumnId::new(2), "body", DataType::Varchar(300), false, 1),
            ],
        )
    }

    fn row(id: u64, body: &str) -> Row {
        Row::new(
            RowId::new(id),
            vec![Value::Int(id as i32), Value::Text(body.to_string())],
        )
    }

    #[test]
    fn test_add_provisions_first_page() {
        let manager = CacheManager::in_memory(CacheConfig::with_page_size(256));
        manager.register_tree(schema());

        // The tree starts with zero pages; the manager provisions one.
        let addr = manager.try_add_row(tree(), &row(1, "hello")).unwrap();
        assert_eq!(addr.page_id, PageId::new(1));
        assert_eq!(manager.get_row(tree(), RowId::new(1)).unwrap(), row(1, "hello"));
    }

    #[test]
    fn test_add_grows_tree_across_pages() {
        let manager = CacheManager::in_memory(CacheConfig::with_page_size(256));
        let container = manager.register_tree(schema());

        for i in 1..=20 {
            manager.try_add_row(tree(), &row(i, "a body that takes space")).unwrap();
        }
        assert!(container.page_count().unwrap() > 1);
        for i in 1..=20 {
            assert!(manager.get_row(tree(), RowId::new(i)).is_ok());
        }
    }

    #[test]
    fn test_capacity_cap() {
        let mut config = CacheConfig::with_page_size(256);
        config.max_capacity_retries = 2;
        let manager = CacheManager::in_memory(config);
        manager.register_tree(schema());

        // A row that can never fit keeps tripping NoRoomOnTree until the
        // retry budget runs out.
        let too_big = row(1, &"x".repeat(280));
        assert!(matches!(
            manager.try_add_row(tree(), &too_big),
            Err(CacheError::CapacityExhausted { retries: 2, .. })
        ));
    }

    #[test]
    fn test_page_source_supplies_existing_pages() {
        struct OnePageSource {
            bytes: Bytes,
        }
        impl PageSource for OnePageSource {
            fn fetch_page(&self, _tree: TreeAddress, page_id: PageId) -> Option<Bytes> {
                (page_id == PageId::new(1)).then(|| self.bytes.clone())
            }
        }

        // Storage already holds page 1 with a row on it.
        let mut seeded = RowPage::new(PageId::new(1), 256);
        let existing = row(7, "from storage");
        let payload = existing.serialize(&schema()).unwrap();
        seeded.insert_row(RowId::new(7), &payload).unwrap();

        let source = Arc::new(OnePageSource {
            bytes: Bytes::copy_from_slice(seeded.bytes()),
        });
        let manager = CacheManager::new(CacheConfig::with_page_size(256), source);
        manager.register_tree(schema());

        // The first add pulls the stored page in; the stored row is
        // visible and new row IDs skip past it.
        let addr = manager.try_add_row(tree(), &row(8, "fresh")).unwrap();
        assert_eq!(addr.page_id, PageId::new(1));
        assert_eq!(manager.get_row(tree(), RowId::new(7)).unwrap(), existing);
    }

    #[test]
    fn test_update_provisions_for_overflow() {
        let manager = CacheManager::in_memory(CacheConfig::with_page_size(256));
        manager.register_tree(schema());
        manager.try_add_row(tree(), &row(1, "small")).unwrap();
        manager.try_add_row(tree(), &row(2, &"f".repeat(120))).unwrap();

        // The grown row fits on no existing page; the manager provisions
        // one and the update forwards there.
        let grown = row(1, &"g".repeat(150));
        let addr = manager.update_row(tree(), &grown).unwrap();
        assert!(addr.page_id > PageId::new(1));
        assert_eq!(manager.get_row(tree(), RowId::new(1)).unwrap(), grown);
    }
}
