//! Pending store mutations.
//!
//! A [`PendingOperation`] is built synchronously by the reconciler or the
//! context menu, queued, and applied exactly once. Each variant maps to one
//! fixed sequence of store calls in [`PendingOperation::apply`].

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{CellUpdate, DataStore, VariableStore};
use crate::variable::{Alignment, VariableDescriptor, VariableField};

/// Target matrix size after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub rows: usize,
    pub cols: usize,
}

impl Dimensions {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingOperation {
    /// Plain value writes, optionally growing the matrix first.
    UpdateCells {
        updates: Vec<CellUpdate>,
        dimensions: Option<Dimensions>,
    },
    /// Writes that land on the spare row.
    AddRowAndUpdate {
        dimensions: Dimensions,
        updates: Vec<CellUpdate>,
    },
    /// Writes that land on the spare column.
    AddColAndUpdate {
        variables: Vec<VariableDescriptor>,
        dimensions: Dimensions,
        updates: Vec<CellUpdate>,
    },
    /// Writes that land on both the spare row and the spare column.
    AddRowColAndUpdate {
        variables: Vec<VariableDescriptor>,
        dimensions: Dimensions,
        updates: Vec<CellUpdate>,
    },
    /// Columns past the spare one, created before the writes that use them.
    AddColsImplicit {
        variables: Vec<VariableDescriptor>,
        dimensions: Dimensions,
    },
    InsertRow { at: usize },
    DeleteRows { rows: Vec<usize> },
    InsertColumn { at: usize },
    DeleteColumns { columns: Vec<usize> },
    UpdateVariable { column: usize, field: VariableField },
    SetAlignment { columns: Vec<usize>, align: Alignment },
}

/// Discriminant of a [`PendingOperation`], for logs and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    UpdateCells,
    AddRowAndUpdate,
    AddColAndUpdate,
    AddRowColAndUpdate,
    AddColsImplicit,
    InsertRow,
    DeleteRows,
    InsertColumn,
    DeleteColumns,
    UpdateVariable,
    SetAlignment,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::UpdateCells => "UPDATE_CELLS",
            OperationKind::AddRowAndUpdate => "ADD_ROW_AND_UPDATE",
            OperationKind::AddColAndUpdate => "ADD_COL_AND_UPDATE",
            OperationKind::AddRowColAndUpdate => "ADD_ROW_COL_AND_UPDATE",
            OperationKind::AddColsImplicit => "ADD_COLS_IMPLICIT",
            OperationKind::InsertRow => "INSERT_ROW",
            OperationKind::DeleteRows => "DELETE_ROWS",
            OperationKind::InsertColumn => "INSERT_COLUMN",
            OperationKind::DeleteColumns => "DELETE_COLUMNS",
            OperationKind::UpdateVariable => "UPDATE_VARIABLE",
            OperationKind::SetAlignment => "SET_ALIGNMENT",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PendingOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            PendingOperation::UpdateCells { .. } => OperationKind::UpdateCells,
            PendingOperation::AddRowAndUpdate { .. } => OperationKind::AddRowAndUpdate,
            PendingOperation::AddColAndUpdate { .. } => OperationKind::AddColAndUpdate,
            PendingOperation::AddRowColAndUpdate { .. } => OperationKind::AddRowColAndUpdate,
            PendingOperation::AddColsImplicit { .. } => OperationKind::AddColsImplicit,
            PendingOperation::InsertRow { .. } => OperationKind::InsertRow,
            PendingOperation::DeleteRows { .. } => OperationKind::DeleteRows,
            PendingOperation::InsertColumn { .. } => OperationKind::InsertColumn,
            PendingOperation::DeleteColumns { .. } => OperationKind::DeleteColumns,
            PendingOperation::UpdateVariable { .. } => OperationKind::UpdateVariable,
            PendingOperation::SetAlignment { .. } => OperationKind::SetAlignment,
        }
    }

    /// Cell writes carried by this operation, if any.
    pub fn updates(&self) -> &[CellUpdate] {
        match self {
            PendingOperation::UpdateCells { updates, .. }
            | PendingOperation::AddRowAndUpdate { updates, .. }
            | PendingOperation::AddColAndUpdate { updates, .. }
            | PendingOperation::AddRowColAndUpdate { updates, .. } => updates,
            _ => &[],
        }
    }

    /// Run the operation's store calls in order, stopping at the first error.
    ///
    /// Calls that already completed are not undone.
    pub async fn apply<V, D>(self, variables: &mut V, data: &mut D) -> Result<(), StoreError>
    where
        V: VariableStore,
        D: DataStore,
    {
        debug!("applying {}", self.kind());
        match self {
            PendingOperation::UpdateCells { updates, dimensions } => {
                if let Some(dims) = dimensions {
                    data.ensure_matrix_dimensions(dims.rows, dims.cols).await?;
                }
                data.update_bulk_cells(updates).await
            }
            PendingOperation::AddRowAndUpdate { dimensions, updates } => {
                data.ensure_matrix_dimensions(dimensions.rows, dimensions.cols).await?;
                data.update_bulk_cells(updates).await
            }
            PendingOperation::AddColAndUpdate { variables: descriptors, dimensions, updates }
            | PendingOperation::AddRowColAndUpdate { variables: descriptors, dimensions, updates } => {
                grow_columns(variables, data, descriptors, dimensions).await?;
                data.update_bulk_cells(updates).await
            }
            PendingOperation::AddColsImplicit { variables: descriptors, dimensions } => {
                grow_columns(variables, data, descriptors, dimensions).await
            }
            PendingOperation::InsertRow { at } => data.add_row(at).await,
            PendingOperation::DeleteRows { rows } => data.delete_rows(rows).await,
            PendingOperation::InsertColumn { at } => {
                // The variable goes first: it is what shifts later column indices
                variables.add_variable(VariableDescriptor::at(at)).await?;
                data.add_column(at).await
            }
            PendingOperation::DeleteColumns { mut columns } => {
                columns.sort_unstable_by(|a, b| b.cmp(a));
                columns.dedup();
                for &col in &columns {
                    variables.delete_variable(col).await?;
                }
                data.delete_columns(columns).await
            }
            PendingOperation::UpdateVariable { column, field } => {
                variables.update_variable(column, field).await
            }
            PendingOperation::SetAlignment { columns, align } => {
                for col in columns {
                    // Committed columns without a variable have nothing to align
                    if variables.variable_by_column_index(col).is_none() {
                        debug!("no variable at column {col}; alignment skipped");
                        continue;
                    }
                    variables.update_variable(col, VariableField::Align(align)).await?;
                }
                Ok(())
            }
        }
    }
}

/// Shared schema step of every column-growth operation.
///
/// Descriptors were built against an earlier snapshot. A column that gained
/// a variable since then keeps it: growth only fills free indices and never
/// shifts existing variables away from their data.
async fn grow_columns<V, D>(
    variables: &mut V,
    data: &mut D,
    descriptors: Vec<VariableDescriptor>,
    dimensions: Dimensions,
) -> Result<(), StoreError>
where
    V: VariableStore,
    D: DataStore,
{
    let fresh: Vec<VariableDescriptor> = descriptors
        .into_iter()
        .filter(|d| match d.column_index {
            Some(index) if variables.variable_by_column_index(index).is_some() => {
                debug!("column {index} already has a variable; descriptor dropped");
                false
            }
            _ => true,
        })
        .collect();
    variables.add_multiple_variables(fresh).await?;
    if dimensions.cols > 0 {
        variables.ensure_complete_variables(dimensions.cols - 1).await?;
    }
    data.ensure_matrix_dimensions(dimensions.rows, dimensions.cols).await
}
