//! Store snapshots and the dimension constants the grid is built against.

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::variable::{Variable, DEFAULT_DECIMALS, DEFAULT_NUMERIC_WIDTH, MIN_STRING_WIDTH};

/// Minimum number of rows the data grid displays.
pub const DEFAULT_MIN_ROWS: usize = 100;

/// Minimum number of columns the data grid displays.
pub const DEFAULT_MIN_COLUMNS: usize = 45;

/// Pixel width of a column with no variable behind it.
pub const DEFAULT_COLUMN_WIDTH: u32 = 64;

/// Dimension constants and new-variable defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSettings {
    pub min_rows: usize,
    pub min_columns: usize,
    pub default_column_width: u32,
    pub numeric_width: u32,
    pub numeric_decimals: u32,
    pub min_string_width: u32,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            min_rows: DEFAULT_MIN_ROWS,
            min_columns: DEFAULT_MIN_COLUMNS,
            default_column_width: DEFAULT_COLUMN_WIDTH,
            numeric_width: DEFAULT_NUMERIC_WIDTH,
            numeric_decimals: DEFAULT_DECIMALS,
            min_string_width: MIN_STRING_WIDTH,
        }
    }
}

/// Read-only view of both stores at one instant.
///
/// The reconciler and the structure builder work only from snapshots, so
/// they stay pure functions of their inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub variables: Vec<Variable>,
    pub rows: Vec<Vec<CellValue>>,
}

impl TableSnapshot {
    pub fn new(variables: Vec<Variable>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { variables, rows }
    }

    /// Committed row count.
    pub fn actual_rows(&self) -> usize {
        self.rows.len()
    }

    /// Committed column count: the larger of the variable extent and the
    /// widest data row.
    pub fn actual_cols(&self) -> usize {
        let from_variables = self
            .variables
            .iter()
            .map(|v| v.column_index + 1)
            .max()
            .unwrap_or(0);
        let from_rows = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        from_variables.max(from_rows)
    }

    pub fn variable_at(&self, column_index: usize) -> Option<&Variable> {
        self.variables.iter().find(|v| v.column_index == column_index)
    }

    /// Committed value at a position. Positions outside a short row read as
    /// `Empty`; positions outside the extent read as `None`.
    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        static EMPTY: CellValue = CellValue::Empty;
        if col >= self.actual_cols() {
            return None;
        }
        self.rows.get(row).map(|r| r.get(col).unwrap_or(&EMPTY))
    }
}
