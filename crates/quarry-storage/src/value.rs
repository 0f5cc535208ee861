//! Typed column values and comparison operators.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{StorageError, StorageResult};
use crate::schema::{ColumnSchema, DataType};

/// A single column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit integer value.
    Int(i32),
    /// 64-bit integer value.
    BigInt(i64),
    /// Floating point value.
    Decimal(f64),
    /// Microseconds since the Unix epoch.
    DateTime(i64),
    /// Character data (CHAR or VARCHAR).
    Text(String),
}

impl Value {
    /// Returns true if this value is NULL.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Checks that this value is storable under the given column, returning
    /// a typed error otherwise.
    pub fn check_column(&self, column: &ColumnSchema) -> StorageResult<()> {
        let ok = match (self, column.data_type) {
            (Value::Null, _) => {
                if !column.nullable {
                    return Err(StorageError::UnexpectedNull {
                        column: column.name.clone(),
                    });
                }
                true
            }
            (Value::Bool(_), DataType::Bool) => true,
            (Value::Int(_), DataType::Int) => true,
            (Value::BigInt(_), DataType::BigInt) => true,
            (Value::Decimal(_), DataType::Decimal) => true,
            (Value::DateTime(_), DataType::DateTime) => true,
            (Value::Text(s), DataType::Char(n) | DataType::Varchar(n)) => {
                if s.len() > n as usize {
                    return Err(StorageError::ValueTooLarge {
                        column: column.name.clone(),
                        size: s.len(),
                        max: n as usize,
                    });
                }
                true
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(StorageError::TypeMismatch {
                column: column.name.clone(),
                expected: column.data_type.to_string(),
            })
        }
    }

    /// Encodes this value into the cell body for the given type.
    ///
    /// Fixed-length types always produce exactly `fixed_size` bytes
    /// (`Char` is zero-padded); `Varchar` produces the raw string bytes.
    /// NULL encodes as a zeroed body for fixed types and an empty body
    /// for variable types; the presence byte is the layout's concern.
    pub fn encode_body(&self, data_type: DataType) -> StorageResult<Vec<u8>> {
        let body = match (self, data_type) {
            (Value::Null, t) => vec![0u8; t.fixed_size().unwrap_or(0)],
            (Value::Bool(b), DataType::Bool) => vec![u8::from(*b)],
            (Value::Int(v), DataType::Int) => v.to_le_bytes().to_vec(),
            (Value::BigInt(v), DataType::BigInt) => v.to_le_bytes().to_vec(),
            (Value::Decimal(v), DataType::Decimal) => v.to_le_bytes().to_vec(),
            (Value::DateTime(v), DataType::DateTime) => v.to_le_bytes().to_vec(),
            (Value::Text(s), DataType::Char(n)) => {
                let mut bytes = vec![0u8; n as usize];
                bytes[..s.len()].copy_from_slice(s.as_bytes());
                bytes
            }
            (Value::Text(s), DataType::Varchar(_)) => s.as_bytes().to_vec(),
            _ => {
                return Err(StorageError::MalformedPayload {
                    reason: format!("cannot encode {:?} as {}", self, data_type),
                })
            }
        };
        Ok(body)
    }

    /// Decodes a cell body into a value for the given type.
    pub fn decode_body(data_type: DataType, bytes: &[u8]) -> StorageResult<Value> {
        let malformed = |reason: &str| StorageError::MalformedPayload {
            reason: reason.to_string(),
        };
        let value = match data_type {
            DataType::Bool => {
                let b = *bytes.first().ok_or_else(|| malformed("empty bool cell"))?;
                Value::Bool(b != 0)
            }
            DataType::Int => Value::Int(i32::from_le_bytes(
                bytes.try_into().map_err(|_| malformed("bad int cell"))?,
            )),
            DataType::BigInt => Value::BigInt(i64::from_le_bytes(
                bytes.try_into().map_err(|_| malformed("bad bigint cell"))?,
            )),
            DataType::Decimal => Value::Decimal(f64::from_le_bytes(
                bytes.try_into().map_err(|_| malformed("bad decimal cell"))?,
            )),
            DataType::DateTime => Value::DateTime(i64::from_le_bytes(
                bytes.try_into().map_err(|_| malformed("bad datetime cell"))?,
            )),
            DataType::Char(_) => {
                // Trim the zero padding back off.
                let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                Value::Text(
                    std::str::from_utf8(&bytes[..end])
                        .map_err(|_| malformed("non-utf8 char cell"))?
                        .to_string(),
                )
            }
            DataType::Varchar(_) => Value::Text(
                std::str::from_utf8(bytes)
                    .map_err(|_| malformed("non-utf8 varchar cell"))?
                    .to_string(),
            ),
        };
        Ok(value)
    }

    /// Compares two values of the same variant.
    ///
    /// Returns `None` for NULLs or mismatched variants: SQL comparisons
    /// against NULL are never true.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::BigInt(a), Value::BigInt(b)) => Some(a.cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Comparison operator applied between a stored value and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueComparison {
    /// Stored value equals the literal.
    Equals,
    /// Stored value is greater than the literal.
    GreaterThan,
    /// Stored value is less than the literal.
    LessThan,
    /// Stored value is greater than or equal to the literal.
    GreaterThanOrEqualTo,
    /// Stored value is less than or equal to the literal.
    LessThanOrEqualTo,
}

impl ValueComparison {
    /// Evaluates `stored <op> literal`.
    ///
    /// Comparisons involving NULL or mismatched types are false.
    #[must_use]
    pub fn matches(&self, stored: &Value, literal: &Value) -> bool {
        let Some(ordering) = stored.compare(literal) else {
            return false;
        };
        match self {
            ValueComparison::Equals => ordering == Ordering::Equal,
            ValueComparison::GreaterThan => ordering == Ordering::Greater,
            ValueComparison::LessThan => ordering == Ordering::Less,
            ValueComparison::GreaterThanOrEqualTo => ordering != Ordering::Less,
            ValueComparison::LessThanOrEqualTo => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for ValueComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueComparison::Equals => "=",
            ValueComparison::GreaterThan => ">",
            ValueComparison::LessThan => "<",
            ValueComparison::GreaterThanOrEqualTo => ">=",
            ValueComparison::LessThanOrEqualTo => "<=",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_fixed() {
        let v = Value::Int(-7);
        let body = v.encode_body(DataType::Int).unwrap();
        assert_eq!(body.len(), 4);
        assert_eq!(Value::decode_body(DataType::Int, &body).unwrap(), v);

        let v = Value::BigInt(1 << 40);
        let body = v.encode_body(DataType::BigInt).unwrap();
        assert_eq!(Value::decode_body(DataType::BigInt, &body).unwrap(), v);
    }

    #[test]
    fn test_encode_decode_char_padding() {
        let v = Value::Text("abc".to_string());
        let body = v.encode_body(DataType::Char(8)).unwrap();
        assert_eq!(body.len(), 8);
        assert_eq!(Value::decode_body(DataType::Char(8), &body).unwrap(), v);
    }

    #[test]
    fn test_encode_varchar() {
        let v = Value::Text("hello".to_string());
        let body = v.encode_body(DataType::Varchar(20)).unwrap();
        assert_eq!(body, b"hello");
    }

    #[test]
    fn test_comparisons() {
        use ValueComparison::*;
        assert!(Equals.matches(&Value::Int(3), &Value::Int(3)));
        assert!(GreaterThan.matches(&Value::Int(4), &Value::Int(3)));
        assert!(LessThanOrEqualTo.matches(&Value::Int(3), &Value::Int(3)));
        assert!(GreaterThanOrEqualTo.matches(&Value::Text("b".into()), &Value::Text("a".into())));
        assert!(!LessThan.matches(&Value::Int(4), &Value::Int(3)));
    }

    #[test]
    fn test_null_never_matches() {
        use ValueComparison::*;
        assert!(!Equals.matches(&Value::Null, &Value::Null));
        assert!(!Equals.matches(&Value::Null, &Value::Int(1)));
        assert!(!GreaterThan.matches(&Value::Int(1), &Value::Null));
    }

    #[test]
    fn test_mismatched_types_never_match() {
        assert!(!ValueComparison::Equals.matches(&Value::Int(1), &Value::BigInt(1)));
    }
}
