//! The tree container: all in-memory pages of one table.
//!
//! A `TreeContainer` owns its pages behind a single `parking_lot::RwLock`.
//! Every mutation holds the write lock for its whole duration, so a row is
//! never observable mid-move; reads share the read lock. Acquisition is
//! bounded by `CacheConfig::container_lock_timeout` and a timed-out
//! acquisition fails the operation with [`CacheError::LockTimeout`].
//!
//! # Row forwarding
//!
//! A row's ID never changes, but its bytes can move when an update no
//! longer fits in place. The container maintains exactly one canonical
//! copy per row; every other record for that row is a forward stub naming
//! the canonical `(page, slot)`. Stubs are flat: a stub always points
//! directly at the canonical location, never at another stub, because
//! every move retargets all stubs in the same write-locked critical
//! section.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use quarry_common::types::{
    ColumnId, PageAddress, PageId, RowAddress, RowId, TreeAddress, ValueAddress,
};
use quarry_storage::layout;
use quarry_storage::page::RewriteOutcome;
use quarry_storage::{Row, RowPage, RowPresence, TableSchema, Value, ValueComparison};

use crate::error::{CacheError, CacheResult};
use crate::stats::CacheStats;

/// The resolved canonical location of a row within the page set.
#[derive(Debug, Clone, Copy)]
struct Canonical {
    page_index: usize,
    slot: u16,
}

/// All in-memory pages of one table, with the forwarding protocol.
pub struct TreeContainer {
    tree: TreeAddress,
    schema: TableSchema,
    pages: RwLock<Vec<RowPage>>,
    lock_timeout: Duration,
    next_row_id: AtomicU64,
    stats: CacheStats,
}

impl TreeContainer {
    /// Creates an empty container for one table.
    #[must_use]
    pub fn new(schema: TableSchema, lock_timeout: Duration) -> Self {
        Self {
            tree: schema.tree,
            schema,
            pages: RwLock::new(Vec::new()),
            lock_timeout,
            next_row_id: AtomicU64::new(RowId::FIRST.as_u64()),
            stats: CacheStats::new(),
        }
    }

    /// Returns the tree this container stores.
    #[inline]
    #[must_use]
    pub fn tree(&self) -> TreeAddress {
        self.tree
    }

    /// Returns the table schema.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Returns the container's statistics.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Allocates the next row ID for this tree.
    pub fn allocate_row_id(&self) -> RowId {
        RowId::new(self.next_row_id.fetch_add(1, Ordering::SeqCst))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds a row to the first page with room.
    ///
    /// Returns `NoPagesOnTree` when the container is empty and
    /// `NoRoomOnTree` when no page can fit the row; the cache manager
    /// reacts to both by provisioning a page.
    pub fn add_row(&self, row: &Row) -> CacheResult<RowAddress> {
        let payload = row.serialize(&self.schema)?;
        let mut pages = self.write_pages()?;
        if pages.is_empty() {
            return Err(CacheError::NoPagesOnTree { tree: self.tree });
        }
        let Some(index) = pages.iter().position(|p| p.can_fit(payload.len())) else {
            return Err(CacheError::NoRoomOnTree {
                tree: self.tree,
                row_size: payload.len(),
            });
        };
        let slot = pages[index].insert_row(row.id, &payload)?;
        let page_id = pages[index].page_id();
        self.next_row_id
            .fetch_max(row.id.as_u64() + 1, Ordering::SeqCst);
        self.stats.record_add();
        Ok(RowAddress::new(page_id, row.id, slot))
    }

    /// Updates a row by its stable ID, moving it when it no longer fits.
    ///
    /// Resolution first finds the single canonical copy (following stubs
    /// when the row was forwarded before). The rewrite is attempted in
    /// place; on overflow the row relocates, within its page or to another
    /// page, and every stub in the tree is retargeted before the write
    /// lock is released.
    pub fn update_row(&self, row: &Row) -> CacheResult<RowAddress> {
        let payload = row.serialize(&self.schema)?;
        let mut pages = self.write_pages()?;
        if pages.is_empty() {
            return Err(CacheError::NoPagesOnTree { tree: self.tree });
        }
        let canonical = self.resolve_canonical(&pages, row.id)?;
        let canonical_page_id = pages[canonical.page_index].page_id();

        match pages[canonical.page_index].rewrite_row(canonical.slot, &payload)? {
            RewriteOutcome::InPlace => {
                self.stats.record_update();
                Ok(RowAddress::new(canonical_page_id, row.id, canonical.slot))
            }
            RewriteOutcome::RelocatedWithinPage(new_slot) => {
                // Pre-existing stubs elsewhere still point at the old slot.
                for page in pages.iter_mut() {
                    page.retarget_stubs(row.id, canonical_page_id, new_slot);
                }
                self.stats.record_update();
                self.stats.record_forward();
                tracing::debug!(
                    tree = %self.tree,
                    row = %row.id,
                    page = %canonical_page_id,
                    "row relocated within page"
                );
                Ok(RowAddress::new(canonical_page_id, row.id, new_slot))
            }
            RewriteOutcome::NoRoom => {
                self.relocate_row(&mut pages, canonical, row.id, &payload)
            }
        }
    }

    /// Moves a row to another page after its home page ran out of room.
    fn relocate_row(
        &self,
        pages: &mut [RowPage],
        canonical: Canonical,
        row_id: RowId,
        payload: &[u8],
    ) -> CacheResult<RowAddress> {
        let Some(target_index) = pages
            .iter()
            .enumerate()
            .position(|(i, p)| i != canonical.page_index && p.can_fit(payload.len()))
        else {
            return Err(CacheError::NoRoomOnTree {
                tree: self.tree,
                row_size: payload.len(),
            });
        };

        let new_slot = pages[target_index].insert_row(row_id, payload)?;
        let to_page = pages[target_index].page_id();
        pages[canonical.page_index].make_stub(canonical.slot, to_page, new_slot)?;
        for page in pages.iter_mut() {
            page.retarget_stubs(row_id, to_page, new_slot);
        }
        self.stats.record_update();
        self.stats.record_forward();
        tracing::debug!(
            tree = %self.tree,
            row = %row_id,
            to_page = %to_page,
            "row forwarded to another page"
        );
        Ok(RowAddress::new(to_page, row_id, new_slot))
    }

    /// Deletes a row by ID, tombstoning its canonical copy and every stub.
    ///
    /// Returns true if the row existed.
    pub fn delete_row(&self, row_id: RowId) -> CacheResult<bool> {
        let mut pages = self.write_pages()?;
        let mut deleted = false;
        for page in pages.iter_mut() {
            deleted |= page.delete_row(row_id);
        }
        if deleted {
            self.stats.record_delete();
        }
        Ok(deleted)
    }

    /// Installs a page supplied by the caller.
    ///
    /// The cache manager calls this after `NoRoomOnTree` or
    /// `NoPagesOnTree` with a page fetched from storage or freshly
    /// allocated.
    pub fn add_page(&self, page: RowPage) -> CacheResult<()> {
        let mut pages = self.write_pages()?;
        if pages.iter().any(|p| p.page_id() == page.page_id()) {
            return Err(CacheError::DuplicatePage {
                tree: self.tree,
                page_id: page.page_id(),
            });
        }
        if let Some(max) = page.max_row_id() {
            self.next_row_id
                .fetch_max(max.as_u64() + 1, Ordering::SeqCst);
        }
        pages.push(page);
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Reads a row by its stable ID, following forwarding stubs.
    pub fn get_row(&self, row_id: RowId) -> CacheResult<Row> {
        let pages = self.read_pages()?;
        let canonical = self.resolve_canonical(&pages, row_id)?;
        let page = &pages[canonical.page_index];
        let payload = page
            .payload(canonical.slot)
            .ok_or_else(|| CacheError::Corrupted {
                message: format!("canonical slot for row {row_id} holds no payload"),
            })?;
        let values = layout::deserialize_row(&self.schema, payload)?;
        self.stats.record_read();
        Ok(Row::new(row_id, values))
    }

    /// Returns the current physical address of a row.
    pub fn get_row_address(&self, row_id: RowId) -> CacheResult<RowAddress> {
        let pages = self.read_pages()?;
        let canonical = self.resolve_canonical(&pages, row_id)?;
        Ok(RowAddress::new(
            pages[canonical.page_index].page_id(),
            row_id,
            canonical.slot,
        ))
    }

    /// Returns the addresses of all live rows.
    pub fn row_addresses(&self) -> CacheResult<Vec<RowAddress>> {
        let pages = self.read_pages()?;
        let mut addresses = Vec::new();
        for page in pages.iter() {
            let page_id = page.page_id();
            addresses.extend(
                page.live_rows()
                    .map(|(slot, row_id, _)| RowAddress::new(page_id, row_id, slot)),
            );
        }
        Ok(addresses)
    }

    /// Returns the addresses of all pages.
    pub fn page_addresses(&self) -> CacheResult<Vec<PageAddress>> {
        let pages = self.read_pages()?;
        Ok(pages.iter().map(|p| self.tree.page(p.page_id())).collect())
    }

    /// Returns true if the container holds a page with this ID.
    pub fn has_page(&self, page_id: PageId) -> CacheResult<bool> {
        let pages = self.read_pages()?;
        Ok(pages.iter().any(|p| p.page_id() == page_id))
    }

    /// Returns true if no page can fit a row of `row_size` bytes.
    ///
    /// An empty container is trivially full; callers distinguish that case
    /// via [`TreeContainer::is_empty`].
    pub fn is_tree_full(&self, row_size: usize) -> CacheResult<bool> {
        let pages = self.read_pages()?;
        Ok(pages.iter().all(|p| p.is_full(row_size)))
    }

    /// Returns true if the container holds no pages.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.read_pages()?.is_empty())
    }

    /// Returns the number of pages.
    pub fn page_count(&self) -> CacheResult<usize> {
        Ok(self.read_pages()?.len())
    }

    /// Returns every page holding a live record (canonical or stub) for
    /// the row.
    pub fn page_references_to_row(&self, row_id: RowId) -> CacheResult<Vec<PageAddress>> {
        let pages = self.read_pages()?;
        Ok(pages
            .iter()
            .filter(|p| p.references_row(row_id))
            .map(|p| self.tree.page(p.page_id()))
            .collect())
    }

    /// Returns the highest live row ID on the tree, if any.
    pub fn max_row_id(&self) -> CacheResult<Option<RowId>> {
        let pages = self.read_pages()?;
        Ok(pages.iter().filter_map(RowPage::max_row_id).max())
    }

    /// Returns the lowest page ID not yet in use.
    pub fn next_page_id(&self) -> CacheResult<PageId> {
        let pages = self.read_pages()?;
        Ok(pages
            .iter()
            .map(|p| p.page_id())
            .max()
            .map_or(PageId::FIRST, PageId::next))
    }

    // =========================================================================
    // Value addressing and scans
    // =========================================================================

    /// Returns byte-exact addresses for one column across all live rows.
    ///
    /// A NULL cell yields an address with `is_null` set and `parse_length`
    /// 0; an empty non-null varlen cell also has `parse_length` 0 but
    /// `is_null` false.
    pub fn value_addresses_for_column(&self, column_id: ColumnId) -> CacheResult<Vec<ValueAddress>> {
        let pages = self.read_pages()?;
        let mut addresses = Vec::new();
        for page in pages.iter() {
            for (slot, row_id, payload) in page.live_rows() {
                let cell = layout::locate_cell(&self.schema, payload, column_id)?;
                let base = page.payload_offset(slot).ok_or_else(|| CacheError::Corrupted {
                    message: format!("live slot {slot} has no payload offset"),
                })?;
                addresses.push(ValueAddress {
                    tree: self.tree,
                    page_id: page.page_id(),
                    row_id,
                    slot,
                    value_offset: base + cell.offset,
                    parse_length: if cell.is_null { 0 } else { cell.length },
                    is_null: cell.is_null,
                    column_id,
                });
            }
        }
        Ok(addresses)
    }

    /// Returns value addresses for one column restricted to the given rows.
    pub fn value_addresses_for_rows(
        &self,
        column_id: ColumnId,
        rows: &[RowId],
    ) -> CacheResult<Vec<ValueAddress>> {
        let all = self.value_addresses_for_column(column_id)?;
        Ok(all
            .into_iter()
            .filter(|a| rows.contains(&a.row_id))
            .collect())
    }

    /// Reads the value at a byte-exact address.
    pub fn value_at(&self, address: &ValueAddress) -> CacheResult<Value> {
        if address.is_null {
            return Ok(Value::Null);
        }
        let column =
            self.schema
                .column(address.column_id)
                .ok_or_else(|| CacheError::Corrupted {
                    message: format!("address names unknown column {}", address.column_id),
                })?;
        let pages = self.read_pages()?;
        let page = pages
            .iter()
            .find(|p| p.page_id() == address.page_id)
            .ok_or(CacheError::PageNotFound {
                tree: self.tree,
                page_id: address.page_id,
            })?;
        let bytes = page
            .read_at(address.value_offset, address.parse_length)
            .ok_or_else(|| CacheError::Corrupted {
                message: format!(
                    "value address {}+{} out of page bounds",
                    address.value_offset, address.parse_length
                ),
            })?;
        let value = Value::decode_body(column.data_type, bytes)?;
        Ok(value)
    }

    /// Returns the addresses of live rows whose column matches the
    /// comparison against the literal.
    pub fn row_addresses_with_value(
        &self,
        column_id: ColumnId,
        comparison: ValueComparison,
        literal: &Value,
    ) -> CacheResult<Vec<RowAddress>> {
        let pages = self.read_pages()?;
        let mut addresses = Vec::new();
        for page in pages.iter() {
            let page_id = page.page_id();
            for (slot, row_id, payload) in page.live_rows() {
                let stored = layout::read_value(&self.schema, payload, column_id)?;
                if comparison.matches(&stored, literal) {
                    addresses.push(RowAddress::new(page_id, row_id, slot));
                }
            }
        }
        Ok(addresses)
    }

    /// Returns true if any live row matches the comparison.
    pub fn has_value(
        &self,
        column_id: ColumnId,
        comparison: ValueComparison,
        literal: &Value,
    ) -> CacheResult<bool> {
        Ok(!self
            .row_addresses_with_value(column_id, comparison, literal)?
            .is_empty())
    }

    /// Counts live rows matching the comparison.
    pub fn count_rows_with_value(
        &self,
        column_id: ColumnId,
        comparison: ValueComparison,
        literal: &Value,
    ) -> CacheResult<usize> {
        Ok(self
            .row_addresses_with_value(column_id, comparison, literal)?
            .len())
    }

    // =========================================================================
    // Private helpers
    // =========================================================================

    fn read_pages(&self) -> CacheResult<RwLockReadGuard<'_, Vec<RowPage>>> {
        self.pages
            .try_read_for(self.lock_timeout)
            .ok_or(CacheError::LockTimeout {
                tree: self.tree,
                duration_ms: self.lock_timeout.as_millis() as u64,
            })
    }

    fn write_pages(&self) -> CacheResult<RwLockWriteGuard<'_, Vec<RowPage>>> {
        self.pages
            .try_write_for(self.lock_timeout)
            .ok_or(CacheError::LockTimeout {
                tree: self.tree,
                duration_ms: self.lock_timeout.as_millis() as u64,
            })
    }

    /// Finds the single canonical copy of a row.
    ///
    /// Exactly one page may hold the canonical record; two is corruption,
    /// zero with live stubs is a dangling forward.
    fn resolve_canonical(&self, pages: &[RowPage], row_id: RowId) -> CacheResult<Canonical> {
        let mut canonical = None;
        let mut saw_stub = false;
        for (index, page) in pages.iter().enumerate() {
            match page.row_presence(row_id) {
                RowPresence::CanonicalOnly { slot }
                | RowPresence::CanonicalForwardedSamePage { slot } => {
                    if canonical.is_some() {
                        return Err(CacheError::Corrupted {
                            message: format!("row {row_id} canonical on two pages"),
                        });
                    }
                    canonical = Some(Canonical {
                        page_index: index,
                        slot,
                    });
                }
                RowPresence::ForwardedToOtherPage { .. } => saw_stub = true,
                RowPresence::Absent => {}
            }
        }
        match canonical {
            Some(found) => Ok(found),
            None if saw_stub => Err(CacheError::Corrupted {
                message: format!("row {row_id} has stubs but no canonical copy"),
            }),
            None => Err(CacheError::RowNotFound {
                tree: self.tree,
                row_id,
            }),
        }
    }
}

impl std::fmt::Debug for TreeContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeContainer")
            .field("tree", &self.tree)
            .field("table", &self.schema.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::types::{DatabaseId, SchemaId, TableId};
    use quarry_storage::{ColumnSchema, DataType};

    const PAGE_SIZE: usize = 256;

    fn tree() -> TreeAddress {
        TreeAddress::new(DatabaseId::new(1), TableId::new(1), SchemaId::new(1))
    }

    fn schema() -> TableSchema {
        TableSchema::new(
            tree(),
            "notes",
            vec![
                ColumnSchema::new(ColumnId::new(1), "id", DataType::Int, false, 0),
                ColumnSchema::new(ColumnId::new(2), "body", DataType::Varchar(200), false, 1),
            ],
        )
    }

    fn container_with_pages(count: u64) -> TreeContainer {
        let container = TreeContainer::new(schema(), Duration::from_secs(1));
        for i in 1..=count {
            container
                .add_page(RowPage::new(PageId::new(i), PAGE_SIZE))
                .unwrap();
        }
        container
    }

    fn note(id: u64, body: &str) -> Row {
        Row::new(
            RowId::new(id),
            vec![Value::Int(id as i32), Value::Text(body.to_string())],
        )
    }

    #[test]
    fn test_add_and_get() {
        let container = container_with_pages(1);
        let addr = container.add_row(&note(1, "hello")).unwrap();
        assert_eq!(addr.row_id, RowId::new(1));

        let row = container.get_row(RowId::new(1)).unwrap();
        assert_eq!(row.values[1], Value::Text("hello".to_string()));
    }

    #[test]
    fn test_empty_tree_statuses() {
        let container = TreeContainer::new(schema(), Duration::from_secs(1));
        assert!(matches!(
            container.add_row(&note(1, "x")),
            Err(CacheError::NoPagesOnTree { .. })
        ));
        assert!(container.is_empty().unwrap());
    }

    #[test]
    fn test_no_room_on_tree() {
        let container = container_with_pages(1);
        let mut id = 1;
        loop {
            match container.add_row(&note(id, "padding padding")) {
                Ok(_) => id += 1,
                Err(CacheError::NoRoomOnTree { .. }) => break,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert!(container.is_tree_full(40).unwrap());
    }

    #[test]
    fn test_update_in_place_keeps_address() {
        let container = container_with_pages(1);
        let before = container.add_row(&note(1, "long enough body")).unwrap();
        let after = container.update_row(&note(1, "short")).unwrap();
        assert_eq!(before, after);
        assert_eq!(
            container.get_row(RowId::new(1)).unwrap().values[1],
            Value::Text("short".to_string())
        );
    }

    #[test]
    fn test_update_overflow_forwards_to_other_page() {
        let container = container_with_pages(2);
        // Nearly fill page 1 so the grown row cannot stay there.
        container.add_row(&note(1, "a")).unwrap();
        let filler = "f".repeat(120);
        container.add_row(&note(2, &filler)).unwrap();

        let grown = "g".repeat(150);
        let addr = container.update_row(&note(1, &grown)).unwrap();
        assert_eq!(addr.page_id, PageId::new(2));

        // The stable ID still resolves to the latest value.
        let row = container.get_row(RowId::new(1)).unwrap();
        assert_eq!(row.values[1], Value::Text(grown));

        // Both pages reference the row: stub on page 1, canonical on page 2.
        let refs = container.page_references_to_row(RowId::new(1)).unwrap();
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_repeated_forwarding_resolves_to_single_canonical() {
        let container = container_with_pages(4);
        container.add_row(&note(1, "start")).unwrap();
        let filler = "f".repeat(120);
        container.add_row(&note(2, &filler)).unwrap();

        // Each update grows the row past its current page's free space.
        for (i, len) in [150, 160, 170].iter().enumerate() {
            let body = "x".repeat(*len);
            container.update_row(&note(1, &body)).unwrap();
            let row = container.get_row(RowId::new(1)).unwrap();
            assert_eq!(row.values[1], Value::Text(body), "after update {i}");
        }

        // Exactly one canonical copy, reachable through the address.
        let addr = container.get_row_address(RowId::new(1)).unwrap();
        let refs = container.page_references_to_row(RowId::new(1)).unwrap();
        assert!(refs.iter().any(|r| r.page_id == addr.page_id));
    }

    #[test]
    fn test_update_missing_row() {
        let container = container_with_pages(1);
        assert!(matches!(
            container.update_row(&note(9, "x")),
            Err(CacheError::RowNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_row_and_stubs() {
        let container = container_with_pages(2);
        container.add_row(&note(1, "a")).unwrap();
        let filler = "f".repeat(120);
        container.add_row(&note(2, &filler)).unwrap();
        container.update_row(&note(1, &"g".repeat(150))).unwrap();

        assert!(container.delete_row(RowId::new(1)).unwrap());
        assert!(matches!(
            container.get_row(RowId::new(1)),
            Err(CacheError::RowNotFound { .. })
        ));
        assert!(container
            .page_references_to_row(RowId::new(1))
            .unwrap()
            .is_empty());

        assert!(!container.delete_row(RowId::new(1)).unwrap());
    }

    #[test]
    fn test_value_addresses_and_reads() {
        let container = container_with_pages(1);
        container.add_row(&note(1, "alpha")).unwrap();
        container.add_row(&note(2, "beta")).unwrap();

        let addresses = container
            .value_addresses_for_column(ColumnId::new(2))
            .unwrap();
        assert_eq!(addresses.len(), 2);
        let values: Vec<Value> = addresses
            .iter()
            .map(|a| container.value_at(a).unwrap())
            .collect();
        assert!(values.contains(&Value::Text("alpha".to_string())));
        assert!(values.contains(&Value::Text("beta".to_string())));
    }

    #[test]
    fn test_value_at_empty_text() {
        let container = container_with_pages(1);
        container.add_row(&note(1, "")).unwrap();

        let addresses = container
            .value_addresses_for_column(ColumnId::new(2))
            .unwrap();
        assert_eq!(addresses.len(), 1);
        // Zero-length body, but the cell is present.
        assert_eq!(addresses[0].parse_length, 0);
        assert!(!addresses[0].is_null);
        assert_eq!(
            container.value_at(&addresses[0]).unwrap(),
            Value::Text(String::new())
        );
    }

    #[test]
    fn test_value_at_null_cell() {
        let schema = TableSchema::new(
            tree(),
            "drafts",
            vec![
                ColumnSchema::new(ColumnId::new(1), "id", DataType::Int, false, 0),
                ColumnSchema::new(ColumnId::new(2), "body", DataType::Varchar(200), true, 1),
            ],
        );
        let container = TreeContainer::new(schema, Duration::from_secs(1));
        container
            .add_page(RowPage::new(PageId::new(1), PAGE_SIZE))
            .unwrap();
        container
            .add_row(&Row::new(RowId::new(1), vec![Value::Int(1), Value::Null]))
            .unwrap();

        let addresses = container
            .value_addresses_for_column(ColumnId::new(2))
            .unwrap();
        assert!(addresses[0].is_null);
        assert_eq!(container.value_at(&addresses[0]).unwrap(), Value::Null);
    }

    #[test]
    fn test_lock_timeout_surfaces_as_error() {
        let container = TreeContainer::new(schema(), Duration::from_millis(10));
        container
            .add_page(RowPage::new(PageId::new(1), PAGE_SIZE))
            .unwrap();

        // Hold the read lock so the bounded write acquisition cannot
        // succeed before the timeout.
        let guard = container.pages.read();
        assert!(matches!(
            container.add_row(&note(1, "x")),
            Err(CacheError::LockTimeout { .. })
        ));
        drop(guard);
        container.add_row(&note(1, "x")).unwrap();
    }

    #[test]
    fn test_scans() {
        let container = container_with_pages(1);
        for i in 1..=5 {
            container.add_row(&note(i, "row")).unwrap();
        }
        let matches = container
            .row_addresses_with_value(
                ColumnId::new(1),
                ValueComparison::GreaterThan,
                &Value::Int(3),
            )
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert!(container
            .has_value(ColumnId::new(1), ValueComparison::Equals, &Value::Int(2))
            .unwrap());
        assert_eq!(
            container
                .count_rows_with_value(
                    ColumnId::new(1),
                    ValueComparison::LessThanOrEqualTo,
                    &Value::Int(2)
                )
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_row_id_allocation() {
        let container = container_with_pages(1);
        container.add_row(&note(7, "seed")).unwrap();
        assert!(container.allocate_row_id() > RowId::new(7));
    }

    #[test]
    fn test_duplicate_page_rejected() {
        let container = container_with_pages(1);
        assert!(matches!(
            container.add_page(RowPage::new(PageId::new(1), PAGE_SIZE)),
            Err(CacheError::DuplicatePage { .. })
        ));
    }

    #[test]
    fn test_next_page_id() {
        let container = container_with_pages(3);
        assert_eq!(container.next_page_id().unwrap(), PageId::new(4));
    }
}
