//! The in-transit row model.

use crate::error::StorageResult;
use crate::layout;
use crate::schema::TableSchema;
use crate::value::Value;

use quarry_common::types::RowId;

/// One logical record in transit between the executor and the cache.
///
/// On-page state (tombstone and forwarding markers) lives in the page's
/// row header, not here: a `Row` is always a plain, live record.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// The stable row ID. Never changes, even across forwarding.
    pub id: RowId,
    /// Column values in declaration order.
    pub values: Vec<Value>,
}

impl Row {
    /// Creates a new row.
    #[must_use]
    pub fn new(id: RowId, values: Vec<Value>) -> Self {
        Self { id, values }
    }

    /// Serializes the row's values under the given schema.
    pub fn serialize(&self, schema: &TableSchema) -> StorageResult<Vec<u8>> {
        layout::serialize_row(schema, &self.values)
    }

    /// Returns the serialized payload size under the given schema.
    pub fn payload_size(&self, schema: &TableSchema) -> StorageResult<usize> {
        layout::serialized_size(schema, &self.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSchema, DataType};
    use quarry_common::types::{ColumnId, DatabaseId, SchemaId, TableId, TreeAddress};

    #[test]
    fn test_row_serialize() {
        let tree = TreeAddress::new(DatabaseId::new(1), TableId::new(1), SchemaId::new(1));
        let schema = TableSchema::new(
            tree,
            "t",
            vec![ColumnSchema::new(ColumnId::new(1), "id", DataType::Int, false, 0)],
        );
        let row = Row::new(RowId::new(1), vec![Value::Int(5)]);
        let payload = row.serialize(&schema).unwrap();
        assert_eq!(payload.len(), 4);
        assert_eq!(row.payload_size(&schema).unwrap(), 4);
    }
}
