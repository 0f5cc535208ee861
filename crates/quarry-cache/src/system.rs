//! The system cache: one metadata page per database.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use quarry_common::types::DatabaseId;
use quarry_storage::RowPage;

/// Holds the metadata page of each known database.
///
/// System metadata rides on the same page format as table data; the
/// executor's DDL operators read and replace these pages wholesale.
#[derive(Default)]
pub struct SystemCache {
    pages: RwLock<HashMap<DatabaseId, Arc<RowPage>>>,
}

impl SystemCache {
    /// Creates an empty system cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the metadata page for a database, if loaded.
    #[must_use]
    pub fn database_page(&self, database_id: DatabaseId) -> Option<Arc<RowPage>> {
        self.pages.read().get(&database_id).cloned()
    }

    /// Installs or replaces the metadata page for a database.
    pub fn set_database_page(&self, database_id: DatabaseId, page: RowPage) {
        self.pages.write().insert(database_id, Arc::new(page));
    }

    /// Returns true if the database has a metadata page loaded.
    #[must_use]
    pub fn has_database(&self, database_id: DatabaseId) -> bool {
        self.pages.read().contains_key(&database_id)
    }

    /// Removes a database's metadata page. Returns true if present.
    pub fn remove_database(&self, database_id: DatabaseId) -> bool {
        self.pages.write().remove(&database_id).is_some()
    }
}

impl std::fmt::Debug for SystemCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemCache")
            .field("databases", &self.pages.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::types::PageId;

    #[test]
    fn test_set_and_get() {
        let cache = SystemCache::new();
        let db = DatabaseId::new(1);
        assert!(!cache.has_database(db));

        cache.set_database_page(db, RowPage::new(PageId::new(1), 256));
        assert!(cache.has_database(db));
        assert_eq!(
            cache.database_page(db).unwrap().page_id(),
            PageId::new(1)
        );

        assert!(cache.remove_database(db));
        assert!(cache.database_page(db).is_none());
    }
}
