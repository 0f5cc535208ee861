//! Binary row layout.
//!
//! A serialized row is the concatenation of its cells in binary sort order
//! (fixed-length columns before variable-length, each group by ordinal).
//! Cell encoding:
//!
//! ```text
//! fixed,    NOT NULL:  [body: size]
//! fixed,    nullable:  [present: 1][body: size]      body zeroed when null
//! variable, NOT NULL:  [len: 4 LE][body: len]
//! variable, nullable:  [present: 1]                  when null
//!                      [present: 1][len: 4 LE][body: len]  when present
//! ```
//!
//! The same walk drives serialization, deserialization, and value-address
//! resolution, so offsets are deterministic: for a fixed schema, a column's
//! offset depends only on the sizes of the cells before it, and fixed-width
//! cells never change size.

use crate::error::{StorageError, StorageResult};
use crate::schema::TableSchema;
use crate::value::Value;

use quarry_common::constants::VARLEN_PREFIX_SIZE;
use quarry_common::types::ColumnId;

/// The location of one cell's body within a serialized row payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLocation {
    /// Byte offset of the body within the payload.
    pub offset: usize,
    /// Body length in bytes.
    pub length: usize,
    /// Whether the cell is NULL.
    pub is_null: bool,
}

/// Serializes a row's values (in declaration order) into its payload bytes.
pub fn serialize_row(schema: &TableSchema, values: &[Value]) -> StorageResult<Vec<u8>> {
    if values.len() != schema.columns.len() {
        return Err(StorageError::ColumnCountMismatch {
            expected: schema.columns.len(),
            actual: values.len(),
        });
    }

    let mut payload = Vec::new();
    for column in schema.binary_order() {
        let index = schema
            .column_index(column.id)
            .expect("binary_order yields schema columns");
        let value = &values[index];
        value.check_column(column)?;

        let body = value.encode_body(column.data_type)?;
        if column.data_type.is_fixed() {
            if column.nullable {
                payload.push(u8::from(!value.is_null()));
            }
            payload.extend_from_slice(&body);
        } else if column.nullable {
            if value.is_null() {
                payload.push(0);
            } else {
                payload.push(1);
                payload.extend_from_slice(&(body.len() as u32).to_le_bytes());
                payload.extend_from_slice(&body);
            }
        } else {
            payload.extend_from_slice(&(body.len() as u32).to_le_bytes());
            payload.extend_from_slice(&body);
        }
    }
    Ok(payload)
}

/// Returns the serialized size of a row without keeping the bytes.
pub fn serialized_size(schema: &TableSchema, values: &[Value]) -> StorageResult<usize> {
    serialize_row(schema, values).map(|p| p.len())
}

/// Deserializes a row payload back into values in declaration order.
pub fn deserialize_row(schema: &TableSchema, payload: &[u8]) -> StorageResult<Vec<Value>> {
    let mut values = vec![Value::Null; schema.columns.len()];
    for column in schema.binary_order() {
        let location = locate_cell(schema, payload, column.id)?;
        let index = schema
            .column_index(column.id)
            .expect("binary_order yields schema columns");
        values[index] = if location.is_null {
            Value::Null
        } else {
            let body = payload
                .get(location.offset..location.offset + location.length)
                .ok_or_else(|| StorageError::MalformedPayload {
                    reason: format!("cell for column '{}' out of bounds", column.name),
                })?;
            Value::decode_body(column.data_type, body)?
        };
    }
    Ok(values)
}

/// Walks the payload to locate one column's cell body.
///
/// The walk visits cells in binary sort order, accumulating offsets:
/// fixed cells advance by their fixed size (+1 if nullable); variable
/// cells advance by the 4-byte length prefix plus the actual body size
/// (or a single byte when null).
pub fn locate_cell(
    schema: &TableSchema,
    payload: &[u8],
    column_id: ColumnId,
) -> StorageResult<CellLocation> {
    let truncated = || StorageError::MalformedPayload {
        reason: "payload shorter than schema walk".to_string(),
    };

    let mut offset = 0usize;
    for column in schema.binary_order() {
        if let Some(size) = column.data_type.fixed_size() {
            let mut is_null = false;
            if column.nullable {
                let present = *payload.get(offset).ok_or_else(truncated)?;
                is_null = present == 0;
                offset += 1;
            }
            if column.id == column_id {
                return Ok(CellLocation {
                    offset,
                    length: size,
                    is_null,
                });
            }
            offset += size;
        } else {
            let mut is_null = false;
            if column.nullable {
                let present = *payload.get(offset).ok_or_else(truncated)?;
                is_null = present == 0;
                offset += 1;
            }
            if is_null {
                if column.id == column_id {
                    return Ok(CellLocation {
                        offset,
                        length: 0,
                        is_null: true,
                    });
                }
                continue;
            }
            let prefix = payload
                .get(offset..offset + VARLEN_PREFIX_SIZE)
                .ok_or_else(truncated)?;
            let length = u32::from_le_bytes(prefix.try_into().expect("4-byte slice")) as usize;
            offset += VARLEN_PREFIX_SIZE;
            if column.id == column_id {
                return Ok(CellLocation {
                    offset,
                    length,
                    is_null: false,
                });
            }
            offset += length;
        }
    }

    Err(StorageError::UnknownColumn {
        table: schema.name.clone(),
        column_id,
    })
}

/// Reads one column's value out of a serialized payload.
pub fn read_value(
    schema: &TableSchema,
    payload: &[u8],
    column_id: ColumnId,
) -> StorageResult<Value> {
    let column = schema
        .column(column_id)
        .ok_or_else(|| StorageError::UnknownColumn {
            table: schema.name.clone(),
            column_id,
        })?;
    let location = locate_cell(schema, payload, column_id)?;
    if location.is_null {
        return Ok(Value::Null);
    }
    let body = payload
        .get(location.offset..location.offset + location.length)
        .ok_or_else(|| StorageError::MalformedPayload {
            reason: format!("cell for column '{}' out of bounds", column.name),
        })?;
    Value::decode_body(column.data_type, body)
}
