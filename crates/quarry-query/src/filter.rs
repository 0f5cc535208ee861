//! WHERE-clause filter trees.
//!
//! A compiled WHERE clause is a binary tree: leaves compare one column
//! against a literal, internal nodes combine two subtrees with `And` or
//! `Or`. Resolution is recursive over row-address sets: `And` intersects
//! by row ID, `Or` concatenates (duplicates allowed; the resultset
//! builder deduplicates at the boundary).

use quarry_cache::{CacheResult, TreeContainer};
use quarry_common::types::{ColumnId, RowAddress};
use quarry_storage::{Value, ValueComparison};

/// One column/comparison/literal triple.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnComparison {
    /// The column to compare.
    pub column_id: ColumnId,
    /// The comparison operator.
    pub comparison: ValueComparison,
    /// The literal to compare against.
    pub literal: Value,
}

/// How two subtree results combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanComparison {
    /// Row must match both children (intersection by row ID).
    And,
    /// Row may match either child (concatenation; duplicates allowed).
    Or,
}

/// A compiled WHERE-clause tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    /// A leaf comparison.
    Comparison(ColumnComparison),
    /// A boolean combination of two subtrees.
    Boolean {
        /// The combinator.
        op: BooleanComparison,
        /// Left subtree.
        left: Box<RowFilter>,
        /// Right subtree.
        right: Box<RowFilter>,
    },
}

impl RowFilter {
    /// Creates a leaf comparison filter.
    #[must_use]
    pub fn comparison(column_id: ColumnId, comparison: ValueComparison, literal: Value) -> Self {
        Self::Comparison(ColumnComparison {
            column_id,
            comparison,
            literal,
        })
    }

    /// Combines two filters with `And`.
    #[must_use]
    pub fn and(left: RowFilter, right: RowFilter) -> Self {
        Self::Boolean {
            op: BooleanComparison::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Combines two filters with `Or`.
    #[must_use]
    pub fn or(left: RowFilter, right: RowFilter) -> Self {
        Self::Boolean {
            op: BooleanComparison::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Resolves the filter to the matching row addresses on one tree.
    pub fn resolve(&self, container: &TreeContainer) -> CacheResult<Vec<RowAddress>> {
        match self {
            RowFilter::Comparison(cmp) => {
                container.row_addresses_with_value(cmp.column_id, cmp.comparison, &cmp.literal)
            }
            RowFilter::Boolean { op, left, right } => {
                let left = left.resolve(container)?;
                let right = right.resolve(container)?;
                Ok(match op {
                    BooleanComparison::And => left
                        .into_iter()
                        .filter(|a| right.iter().any(|b| b.row_id == a.row_id))
                        .collect(),
                    BooleanComparison::Or => {
                        let mut combined = left;
                        combined.extend(right);
                        combined
                    }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use quarry_common::types::{DatabaseId, PageId, RowId, SchemaId, TableId, TreeAddress};
    use quarry_storage::{ColumnSchema, DataType, Row, RowPage, TableSchema};

    fn container() -> TreeContainer {
        let tree = TreeAddress::new(DatabaseId::new(1), TableId::new(1), SchemaId::new(1));
        let schema = TableSchema::new(
            tree,
            "people",
            vec![
                ColumnSchema::new(ColumnId::new(1), "id", DataType::Int, false, 0),
                ColumnSchema::new(ColumnId::new(2), "age", DataType::Int, false, 1),
            ],
        );
        let container = TreeContainer::new(schema, Duration::from_secs(1));
        container
            .add_page(RowPage::new(PageId::new(1), 4096))
            .unwrap();
        for (id, age) in [(1, 20), (2, 30), (3, 40), (4, 50)] {
            container
                .add_row(&Row::new(
                    RowId::new(id),
                    vec![Value::Int(id as i32), Value::Int(age)],
                ))
                .unwrap();
        }
        container
    }

    fn age_over(age: i32) -> RowFilter {
        RowFilter::comparison(ColumnId::new(2), ValueComparison::GreaterThan, Value::Int(age))
    }

    fn id_is(id: i32) -> RowFilter {
        RowFilter::comparison(ColumnId::new(1), ValueComparison::Equals, Value::Int(id))
    }

    #[test]
    fn test_leaf_resolution() {
        let c = container();
        let matches = age_over(25).resolve(&c).unwrap();
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_and_intersects() {
        let c = container();
        let filter = RowFilter::and(age_over(25), id_is(3));
        let matches = filter.resolve(&c).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].row_id, RowId::new(3));
    }

    #[test]
    fn test_or_concatenates_with_duplicates() {
        let c = container();
        // Row 3 matches both children; Or keeps the duplicate.
        let filter = RowFilter::or(age_over(25), id_is(3));
        let matches = filter.resolve(&c).unwrap();
        assert_eq!(matches.len(), 4);
        assert_eq!(
            matches
                .iter()
                .filter(|a| a.row_id == RowId::new(3))
                .count(),
            2
        );
    }

    #[test]
    fn test_nested_tree() {
        let c = container();
        // (age > 25 AND id = 3) OR id = 1
        let filter = RowFilter::or(RowFilter::and(age_over(25), id_is(3)), id_is(1));
        let mut ids: Vec<u64> = filter
            .resolve(&c)
            .unwrap()
            .iter()
            .map(|a| a.row_id.as_u64())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3]);
    }
}
