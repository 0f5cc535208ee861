//! Result assembly.
//!
//! The executor builds a [`Resultset`] through a [`ResultsetBuilder`].
//! Read operators feed resolved rows in during the Commit phase; the
//! builder deduplicates by row ID (an `Or` filter may produce the same
//! row twice). Error-bearing results carry zero rows and callers treat
//! them as no-ops.

use std::collections::HashSet;

use quarry_common::types::{ColumnId, RowId};
use quarry_storage::Value;

/// The outcome of one plan execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resultset {
    /// The addressed columns, in projection order.
    pub columns: Vec<ColumnId>,
    /// Resolved rows: one value per addressed column.
    pub rows: Vec<Vec<Value>>,
    /// Status messages from non-queryable operators.
    pub messages: Vec<String>,
    /// Execution errors (lock conflicts, cache failures).
    pub execution_errors: Vec<String>,
    /// Authentication errors (permission denials).
    pub authentication_errors: Vec<String>,
}

impl Resultset {
    /// Returns true if the result carries any error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.execution_errors.is_empty() || !self.authentication_errors.is_empty()
    }

    /// Returns the number of resolved rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Accumulates rows, messages, and errors during plan execution.
#[derive(Debug, Default)]
pub struct ResultsetBuilder {
    columns: Vec<ColumnId>,
    rows: Vec<Vec<Value>>,
    seen_rows: HashSet<RowId>,
    messages: Vec<String>,
    execution_errors: Vec<String>,
    authentication_errors: Vec<String>,
}

impl ResultsetBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the addressed columns. Later calls win; reads in one plan
    /// share a projection.
    pub fn set_columns(&mut self, columns: Vec<ColumnId>) {
        self.columns = columns;
    }

    /// Adds one resolved row, skipping duplicates by row ID.
    pub fn add_row(&mut self, row_id: RowId, values: Vec<Value>) {
        if self.seen_rows.insert(row_id) {
            self.rows.push(values);
        }
    }

    /// Records a status message from a non-queryable operator.
    pub fn add_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Records an execution error.
    pub fn add_execution_error(&mut self, error: impl Into<String>) {
        self.execution_errors.push(error.into());
    }

    /// Records an authentication error.
    pub fn add_authentication_error(&mut self, error: impl Into<String>) {
        self.authentication_errors.push(error.into());
    }

    /// Returns true if any error has been recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.execution_errors.is_empty() || !self.authentication_errors.is_empty()
    }

    /// Finishes the result. An error-bearing result drops its rows.
    #[must_use]
    pub fn build(self) -> Resultset {
        let errored = !self.execution_errors.is_empty() || !self.authentication_errors.is_empty();
        Resultset {
            columns: if errored { Vec::new() } else { self.columns },
            rows: if errored { Vec::new() } else { self.rows },
            messages: self.messages,
            execution_errors: self.execution_errors,
            authentication_errors: self.authentication_errors,
        }
    }
}

/// Builds a result holding a single authentication error.
#[must_use]
pub fn authentication_failure(error: impl Into<String>) -> Resultset {
    let mut builder = ResultsetBuilder::new();
    builder.add_authentication_error(error);
    builder.build()
}

/// Builds a result holding a single execution error.
#[must_use]
pub fn execution_failure(error: impl Into<String>) -> Resultset {
    let mut builder = ResultsetBuilder::new();
    builder.add_execution_error(error);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_by_row_id() {
        let mut builder = ResultsetBuilder::new();
        builder.set_columns(vec![ColumnId::new(1)]);
        builder.add_row(RowId::new(1), vec![Value::Int(1)]);
        builder.add_row(RowId::new(1), vec![Value::Int(1)]);
        builder.add_row(RowId::new(2), vec![Value::Int(2)]);

        let result = builder.build();
        assert_eq!(result.row_count(), 2);
        assert!(!result.has_errors());
    }

    #[test]
    fn test_error_result_drops_rows() {
        let mut builder = ResultsetBuilder::new();
        builder.add_row(RowId::new(1), vec![Value::Int(1)]);
        builder.add_execution_error("lock conflict");

        let result = builder.build();
        assert_eq!(result.row_count(), 0);
        assert!(result.has_errors());
        assert_eq!(result.execution_errors.len(), 1);
    }

    #[test]
    fn test_failure_helpers() {
        let auth = authentication_failure("denied");
        assert_eq!(auth.authentication_errors, vec!["denied".to_string()]);
        let exec = execution_failure("boom");
        assert_eq!(exec.execution_errors, vec!["boom".to_string()]);
    }
}
