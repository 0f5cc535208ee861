//! The database catalog interface.
//!
//! Table and schema metadata live behind the [`DatabaseCatalog`] trait so
//! the executor can run against any metadata store. [`MemoryCatalog`] is
//! the in-process implementation used by embedded engines and tests.

use std::collections::HashMap;

use parking_lot::RwLock;

use quarry_common::types::{DatabaseId, SchemaId, TreeAddress};
use quarry_storage::TableSchema;

/// How a table's pages are managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoragePolicy {
    /// Pages live in the cache and are persisted by the storage layer.
    #[default]
    Cached,
    /// Pages are pinned in memory for the table's lifetime.
    MemoryResident,
}

/// Table and schema metadata the executor consults.
pub trait DatabaseCatalog: Send + Sync {
    /// Returns the schema of a table, if known.
    fn table_schema(&self, tree: TreeAddress) -> Option<TableSchema>;

    /// Registers a table. Re-registering an existing tree is a no-op.
    fn register_table(&self, schema: TableSchema);

    /// Registers a schema under a database. Re-registering is a no-op.
    fn register_schema(&self, database_id: DatabaseId, schema_id: SchemaId, name: &str);

    /// Returns true if the schema is registered.
    fn has_schema(&self, database_id: DatabaseId, schema_id: SchemaId) -> bool;

    /// Sets a table's storage policy.
    fn set_storage_policy(&self, tree: TreeAddress, policy: StoragePolicy);

    /// Returns a table's storage policy.
    fn storage_policy(&self, tree: TreeAddress) -> StoragePolicy;
}

/// An in-process catalog.
#[derive(Default)]
pub struct MemoryCatalog {
    tables: RwLock<HashMap<TreeAddress, TableSchema>>,
    schemas: RwLock<HashMap<(DatabaseId, SchemaId), String>>,
    policies: RwLock<HashMap<TreeAddress, StoragePolicy>>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatabaseCatalog for MemoryCatalog {
    fn table_schema(&self, tree: TreeAddress) -> Option<TableSchema> {
        self.tables.read().get(&tree).cloned()
    }

    fn register_table(&self, schema: TableSchema) {
        self.tables.write().entry(schema.tree).or_insert(schema);
    }

    fn register_schema(&self, database_id: DatabaseId, schema_id: SchemaId, name: &str) {
        self.schemas
            .write()
            .entry((database_id, schema_id))
            .or_insert_with(|| name.to_string());
    }

    fn has_schema(&self, database_id: DatabaseId, schema_id: SchemaId) -> bool {
        self.schemas.read().contains_key(&(database_id, schema_id))
    }

    fn set_storage_policy(&self, tree: TreeAddress, policy: StoragePolicy) {
        self.policies.write().insert(tree, policy);
    }

    fn storage_policy(&self, tree: TreeAddress) -> StoragePolicy {
        self.policies
            .read()
            .get(&tree)
            .copied()
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for MemoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCatalog")
            .field("tables", &self.tables.read().len())
            .field("schemas", &self.schemas.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_common::types::{ColumnId, TableId};
    use quarry_storage::{ColumnSchema, DataType};

    fn tree() -> TreeAddress {
        TreeAddress::new(DatabaseId::new(1), TableId::new(1), SchemaId::new(1))
    }

    #[test]
    fn test_register_and_lookup() {
        let catalog = MemoryCatalog::new();
        assert!(catalog.table_schema(tree()).is_none());

        catalog.register_table(TableSchema::new(
            tree(),
            "t",
            vec![ColumnSchema::new(ColumnId::new(1), "id", DataType::Int, false, 0)],
        ));
        assert_eq!(catalog.table_schema(tree()).unwrap().name, "t");

        catalog.register_schema(DatabaseId::new(1), SchemaId::new(2), "analytics");
        assert!(catalog.has_schema(DatabaseId::new(1), SchemaId::new(2)));
        assert!(!catalog.has_schema(DatabaseId::new(1), SchemaId::new(3)));
    }

    #[test]
    fn test_storage_policy() {
        let catalog = MemoryCatalog::new();
        assert_eq!(catalog.storage_policy(tree()), StoragePolicy::Cached);
        catalog.set_storage_policy(tree(), StoragePolicy::MemoryResident);
        assert_eq!(
            catalog.storage_policy(tree()),
            StoragePolicy::MemoryResident
        );
    }
}
