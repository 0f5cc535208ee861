//! Plan operators.
//!
//! Operators are a closed enum: adding a kind forces every dispatch site
//! to handle it at compile time. Reads are *queryable* (produce row and
//! value addresses); writes and DDL are *non-queryable* (produce status
//! messages).
//!
//! Every operator executes twice: once in `Mode::Try` (speculative; cache
//! mutations land here) and once in `Mode::Commit` (finalization; reads
//! collect their rows, writes verify and report). There is no rollback
//! mode: Try-phase work is either idempotent to re-run or verified in
//! Commit, and an error-bearing result is treated as a no-op by callers.

use std::collections::HashMap;

use quarry_cache::CacheManager;
use quarry_common::error::{QuarryError, QuarryResult};
use quarry_common::types::{ColumnId, DatabaseId, RowAddress, RowId, SchemaId, TreeAddress};
use quarry_storage::{Row, TableSchema, Value};

use crate::auth::Permission;
use crate::catalog::{DatabaseCatalog, StoragePolicy};
use crate::filter::RowFilter;
use crate::resultset::ResultsetBuilder;

/// The execution pass an operator runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Speculative execution; cache mutations are applied here.
    Try,
    /// Finalization; reads collect rows, writes verify and report.
    Commit,
}

/// One step of a plan part.
#[derive(Debug, Clone)]
pub enum Operator {
    /// Read rows from a table, optionally filtered, projecting columns.
    TableRead {
        /// The table to read.
        tree: TreeAddress,
        /// The projected columns.
        columns: Vec<ColumnId>,
        /// The compiled WHERE clause, if any.
        filter: Option<RowFilter>,
    },
    /// Insert one row.
    InsertRow {
        /// The target table.
        tree: TreeAddress,
        /// Column values in declaration order.
        values: Vec<Value>,
    },
    /// Update rows, optionally scoped to the previous read's result.
    UpdateRows {
        /// The target table.
        tree: TreeAddress,
        /// Column assignments to apply.
        assignments: Vec<(ColumnId, Value)>,
        /// When set, applies only to the rows the most recent read in
        /// this part produced; otherwise to every row.
        scoped_to_previous: bool,
    },
    /// Delete rows, optionally scoped to the previous read's result.
    DeleteRows {
        /// The target table.
        tree: TreeAddress,
        /// When set, applies only to the rows the most recent read in
        /// this part produced; otherwise to every row.
        scoped_to_previous: bool,
    },
    /// Create a table.
    CreateTable {
        /// The new table's schema.
        schema: TableSchema,
    },
    /// Create a schema.
    CreateSchema {
        /// The owning database.
        database_id: DatabaseId,
        /// The new schema's ID.
        schema_id: SchemaId,
        /// The new schema's name.
        name: String,
    },
    /// Change a table's storage policy.
    SetStoragePolicy {
        /// The target table.
        tree: TreeAddress,
        /// The new policy.
        policy: StoragePolicy,
    },
}

impl Operator {
    /// Returns the permission this operator requires.
    #[must_use]
    pub const fn required_permission(&self) -> Permission {
        match self {
            Operator::TableRead { .. } => Permission::Select,
            Operator::InsertRow { .. } => Permission::Insert,
            Operator::UpdateRows { .. } => Permission::Update,
            Operator::DeleteRows { .. } => Permission::Delete,
            Operator::CreateTable { .. } => Permission::CreateTable,
            Operator::CreateSchema { .. } => Permission::CreateSchema,
            Operator::SetStoragePolicy { .. } => Permission::SetStoragePolicy,
        }
    }

    /// Returns the database this operator touches.
    #[must_use]
    pub const fn database_id(&self) -> DatabaseId {
        match self {
            Operator::TableRead { tree, .. }
            | Operator::InsertRow { tree, .. }
            | Operator::UpdateRows { tree, .. }
            | Operator::DeleteRows { tree, .. }
            | Operator::SetStoragePolicy { tree, .. } => tree.database_id,
            Operator::CreateTable { schema } => schema.tree.database_id,
            Operator::CreateSchema { database_id, .. } => *database_id,
        }
    }

    /// Returns true if the operator produces row and value addresses.
    #[must_use]
    pub const fn is_queryable(&self) -> bool {
        matches!(self, Operator::TableRead { .. })
    }
}

/// What an operator needs to run against.
pub struct OperatorContext<'a> {
    /// The row cache.
    pub cache: &'a CacheManager,
    /// The metadata catalog.
    pub catalog: &'a dyn DatabaseCatalog,
}

/// Mutable state shared by the operators of one plan part, carried
/// across both execution passes.
#[derive(Debug, Default)]
pub struct PartState {
    /// Row addresses produced by the most recent read operator.
    pub last_read: Option<Vec<RowAddress>>,
    /// Row IDs allocated by insert operators in the Try pass, keyed by
    /// operator index, so Commit verifies instead of re-inserting.
    pub inserted: HashMap<usize, RowId>,
    /// Rows affected per write operator, recorded in Try and reported
    /// in Commit.
    pub affected: HashMap<usize, usize>,
}

impl Operator {
    /// Runs the operator once under the given mode.
    ///
    /// `index` is the operator's position within its part, used to key
    /// per-operator state across the two passes.
    pub fn execute(
        &self,
        index: usize,
        mode: Mode,
        ctx: &OperatorContext<'_>,
        state: &mut PartState,
        results: &mut ResultsetBuilder,
    ) -> QuarryResult<()> {
        match self {
            Operator::TableRead {
                tree,
                columns,
                filter,
            } => self.table_read(*tree, columns, filter.as_ref(), mode, ctx, state, results),
            Operator::InsertRow { tree, values } => {
                self.insert_row(index, *tree, values, mode, ctx, state, results)
            }
            Operator::UpdateRows {
                tree,
                assignments,
                scoped_to_previous,
            } => self.update_rows(
                index,
                *tree,
                assignments,
                *scoped_to_previous,
                mode,
                ctx,
                state,
                results,
            ),
            Operator::DeleteRows {
                tree,
                scoped_to_previous,
            } => self.delete_rows(index, *tree, *scoped_to_previous, mode, ctx, state, results),
            Operator::CreateTable { schema } => {
                if mode == Mode::Try {
                    ctx.catalog.register_table(schema.clone());
                    ctx.cache.register_tree(schema.clone());
                } else {
                    results.add_message(format!("table '{}' created", schema.name));
                }
                Ok(())
            }
            Operator::CreateSchema {
                database_id,
                schema_id,
                name,
            } => {
                if mode == Mode::Try {
                    ctx.catalog.register_schema(*database_id, *schema_id, name);
                } else {
                    results.add_message(format!("schema '{name}' created"));
                }
                Ok(())
            }
            Operator::SetStoragePolicy { tree, policy } => {
                if mode == Mode::Try {
                    ctx.catalog.set_storage_policy(*tree, *policy);
                } else {
                    results.add_message(format!("storage policy set for table {tree}"));
                }
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn table_read(
        &self,
        tree: TreeAddress,
        columns: &[ColumnId],
        filter: Option<&RowFilter>,
        mode: Mode,
        ctx: &OperatorContext<'_>,
        state: &mut PartState,
        results: &mut ResultsetBuilder,
    ) -> QuarryResult<()> {
        let container = ctx.cache.data().tree(tree)?;
        let addresses = match filter {
            Some(filter) => filter.resolve(&container)?,
            None => container.row_addresses()?,
        };

        if mode == Mode::Commit {
            let schema = container.schema();
            results.set_columns(columns.to_vec());
            for address in &addresses {
                let row = container.get_row(address.row_id)?;
                let mut projected = Vec::with_capacity(columns.len());
                for column_id in columns {
                    let position = schema.column_index(*column_id).ok_or_else(|| {
                        QuarryError::ColumnNotFound {
                            column: column_id.to_string(),
                            table: schema.name.clone(),
                        }
                    })?;
                    projected.push(row.values[position].clone());
                }
                results.add_row(address.row_id, projected);
            }
        }
        state.last_read = Some(addresses);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_row(
        &self,
        index: usize,
        tree: TreeAddress,
        values: &[Value],
        mode: Mode,
        ctx: &OperatorContext<'_>,
        state: &mut PartState,
        results: &mut ResultsetBuilder,
    ) -> QuarryResult<()> {
        match mode {
            Mode::Try => {
                let container = ctx.cache.data().tree(tree)?;
                let row_id = container.allocate_row_id();
                let row = Row::new(row_id, values.to_vec());
                ctx.cache.try_add_row(tree, &row)?;
                state.inserted.insert(index, row_id);
                Ok(())
            }
            Mode::Commit => {
                let row_id =
                    state
                        .inserted
                        .get(&index)
                        .copied()
                        .ok_or_else(|| QuarryError::Internal {
                            message: "insert committed without a Try pass".to_string(),
                        })?;
                // The Try-phase insert must still be visible.
                ctx.cache.get_row(tree, row_id)?;
                results.add_message(format!("1 row inserted (row {row_id})"));
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn update_rows(
        &self,
        index: usize,
        tree: TreeAddress,
        assignments: &[(ColumnId, Value)],
        scoped_to_previous: bool,
        mode: Mode,
        ctx: &OperatorContext<'_>,
        state: &mut PartState,
        results: &mut ResultsetBuilder,
    ) -> QuarryResult<()> {
        match mode {
            Mode::Try => {
                let targets = self.target_rows(tree, scoped_to_previous, ctx, state)?;
                let container = ctx.cache.data().tree(tree)?;
                let schema = container.schema().clone();
                for row_id in &targets {
                    let mut row = container.get_row(*row_id)?;
                    for (column_id, value) in assignments {
                        let position = schema.column_index(*column_id).ok_or_else(|| {
                            QuarryError::ColumnNotFound {
                                column: column_id.to_string(),
                                table: schema.name.clone(),
                            }
                        })?;
                        row.values[position] = value.clone();
                    }
                    ctx.cache.update_row(tree, &row)?;
                }
                state.affected.insert(index, targets.len());
                Ok(())
            }
            Mode::Commit => {
                let affected = state.affected.get(&index).copied().unwrap_or(0);
                results.add_message(format!("{affected} rows updated"));
                Ok(())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn delete_rows(
        &self,
        index: usize,
        tree: TreeAddress,
        scoped_to_previous: bool,
        mode: Mode,
        ctx: &OperatorContext<'_>,
        state: &mut PartState,
        results: &mut ResultsetBuilder,
    ) -> QuarryResult<()> {
        match mode {
            Mode::Try => {
                let targets = self.target_rows(tree, scoped_to_previous, ctx, state)?;
                let mut deleted = 0;
                for row_id in targets {
                    if ctx.cache.delete_row(tree, row_id)? {
                        deleted += 1;
                    }
                }
                state.affected.insert(index, deleted);
                Ok(())
            }
            Mode::Commit => {
                let affected = state.affected.get(&index).copied().unwrap_or(0);
                results.add_message(format!("{affected} rows deleted"));
                Ok(())
            }
        }
    }

    /// Returns the row IDs a write applies to.
    ///
    /// A scoped write consumes the most recent read's addresses; an
    /// unscoped write, or a scoped one with no preceding read, applies
    /// to every row.
    fn target_rows(
        &self,
        tree: TreeAddress,
        scoped_to_previous: bool,
        ctx: &OperatorContext<'_>,
        state: &PartState,
    ) -> QuarryResult<Vec<RowId>> {
        if scoped_to_previous {
            if let Some(addresses) = &state.last_read {
                return Ok(addresses.iter().map(|a| a.row_id).collect());
            }
        }
        let container = ctx.cache.data().tree(tree)?;
        Ok(container
            .row_addresses()?
            .into_iter()
            .map(|a| a.row_id)
            .collect())
    }
}
