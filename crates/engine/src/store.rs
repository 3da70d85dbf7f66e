//! Store contracts.
//!
//! The reconciler, queue and context menu only see these two traits. Any
//! backing store (the in-memory ones in [`crate::memory`], a recording fake
//! in tests, a persisted one in an application) plugs in behind them.
//!
//! Mutations are `async` because a real store may suspend; the queue awaits
//! each call before issuing the next one.

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::error::StoreError;
use crate::table::TableSnapshot;
use crate::variable::{Variable, VariableDescriptor, VariableField};

/// One cell write in a bulk update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub row: usize,
    pub col: usize,
    pub value: CellValue,
}

impl CellUpdate {
    pub fn new(row: usize, col: usize, value: CellValue) -> Self {
        Self { row, col, value }
    }
}

/// Variable metadata, keyed by column index.
#[allow(async_fn_in_trait)]
pub trait VariableStore {
    /// Add a variable. If `column_index` is already taken, that variable and
    /// every later one shift right by one. An unset index appends.
    async fn add_variable(&mut self, descriptor: VariableDescriptor) -> Result<Variable, StoreError>;

    /// Add several variables in the given order.
    async fn add_multiple_variables(
        &mut self,
        descriptors: Vec<VariableDescriptor>,
    ) -> Result<(), StoreError> {
        for descriptor in descriptors {
            self.add_variable(descriptor).await?;
        }
        Ok(())
    }

    /// Remove the variable at `column_index`; later variables shift left.
    async fn delete_variable(&mut self, column_index: usize) -> Result<(), StoreError>;

    async fn update_variable(
        &mut self,
        column_index: usize,
        field: VariableField,
    ) -> Result<(), StoreError>;

    /// Create default variables for every unoccupied index in `0..=max_index`.
    async fn ensure_complete_variables(&mut self, max_index: usize) -> Result<(), StoreError>;

    fn variable_by_column_index(&self, column_index: usize) -> Option<Variable>;

    /// All variables, ordered by column index.
    fn variables(&self) -> Vec<Variable>;
}

/// The raw data matrix.
#[allow(async_fn_in_trait)]
pub trait DataStore {
    /// Insert an empty row before `index`; `index == row_count()` appends.
    async fn add_row(&mut self, index: usize) -> Result<(), StoreError>;

    /// Insert an empty column before `index`, shifting later cells right.
    async fn add_column(&mut self, index: usize) -> Result<(), StoreError>;

    /// Insert columns one at a time, in ascending order.
    async fn add_columns(&mut self, mut indices: Vec<usize>) -> Result<(), StoreError> {
        indices.sort_unstable();
        indices.dedup();
        for index in indices {
            self.add_column(index).await?;
        }
        Ok(())
    }

    async fn delete_row(&mut self, index: usize) -> Result<(), StoreError>;

    /// Delete rows from the bottom up so earlier indices stay valid.
    async fn delete_rows(&mut self, mut indices: Vec<usize>) -> Result<(), StoreError> {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        for index in indices {
            self.delete_row(index).await?;
        }
        Ok(())
    }

    async fn delete_column(&mut self, index: usize) -> Result<(), StoreError>;

    /// Delete columns from the right so earlier indices stay valid.
    async fn delete_columns(&mut self, mut indices: Vec<usize>) -> Result<(), StoreError> {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        for index in indices {
            self.delete_column(index).await?;
        }
        Ok(())
    }

    /// Write every update or none of them.
    async fn update_bulk_cells(&mut self, updates: Vec<CellUpdate>) -> Result<(), StoreError>;

    /// Grow the matrix to at least `rows` x `cols`. Never shrinks.
    async fn ensure_matrix_dimensions(&mut self, rows: usize, cols: usize) -> Result<(), StoreError>;

    fn row_count(&self) -> usize;

    fn column_count(&self) -> usize;

    fn rows(&self) -> Vec<Vec<CellValue>>;
}

/// Capture both stores as a [`TableSnapshot`].
pub fn snapshot<V: VariableStore, D: DataStore>(variables: &V, data: &D) -> TableSnapshot {
    TableSnapshot::new(variables.variables(), data.rows())
}
