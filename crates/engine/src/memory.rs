//! In-memory stores.
//!
//! Plain `Vec`-backed implementations of [`VariableStore`] and [`DataStore`].
//! Every call completes without suspending, which makes them the natural
//! backing for the CLI and for tests.

use log::debug;

use crate::cell::CellValue;
use crate::error::StoreError;
use crate::store::{CellUpdate, DataStore, VariableStore};
use crate::table::TableSettings;
use crate::variable::{Variable, VariableDescriptor, VariableField};

// ============================================================================
// Variables
// ============================================================================

/// Variables kept sorted by `column_index`.
#[derive(Debug, Clone, Default)]
pub struct MemoryVariableStore {
    variables: Vec<Variable>,
    settings: TableSettings,
}

impl MemoryVariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: TableSettings) -> Self {
        Self { variables: Vec::new(), settings }
    }

    /// Seed from existing records. Later duplicates of a column index win.
    pub fn from_variables(variables: Vec<Variable>, settings: TableSettings) -> Self {
        let mut sorted: Vec<Variable> = Vec::with_capacity(variables.len());
        for var in variables {
            match sorted.iter().position(|v| v.column_index == var.column_index) {
                Some(pos) => sorted[pos] = var,
                None => sorted.push(var),
            }
        }
        sorted.sort_by_key(|v| v.column_index);
        Self { variables: sorted, settings }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    fn position(&self, column_index: usize) -> Option<usize> {
        self.variables.iter().position(|v| v.column_index == column_index)
    }

    fn next_index(&self) -> usize {
        self.variables.last().map(|v| v.column_index + 1).unwrap_or(0)
    }

    fn name_taken(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v.name.eq_ignore_ascii_case(name))
    }

    /// `var<N>` starting at the column's own number, skipping names in use.
    fn unique_default_name(&self, column_index: usize) -> String {
        let mut n = column_index + 1;
        loop {
            let candidate = format!("var{n}");
            if !self.name_taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn default_variable(&self, column_index: usize) -> Variable {
        Variable {
            width: self.settings.numeric_width,
            decimals: self.settings.numeric_decimals,
            ..Variable::numeric(column_index)
        }
    }

    fn insert_sorted(&mut self, var: Variable) {
        let pos = self
            .variables
            .iter()
            .position(|v| v.column_index > var.column_index)
            .unwrap_or(self.variables.len());
        self.variables.insert(pos, var);
    }
}

impl VariableStore for MemoryVariableStore {
    async fn add_variable(&mut self, mut descriptor: VariableDescriptor) -> Result<Variable, StoreError> {
        let index = descriptor.column_index.unwrap_or_else(|| self.next_index());

        // Make room: the occupant and everything after it move right
        if self.position(index).is_some() {
            for var in self.variables.iter_mut().filter(|v| v.column_index >= index) {
                var.column_index += 1;
            }
        }

        let has_name = descriptor.name.as_deref().is_some_and(|n| !n.trim().is_empty());
        if !has_name {
            descriptor.name = Some(self.unique_default_name(index));
        }
        if descriptor.var_type.map_or(true, |t| t.is_numeric_family()) {
            descriptor.width.get_or_insert(self.settings.numeric_width);
            descriptor.decimals.get_or_insert(self.settings.numeric_decimals);
        }

        let var = Variable::from_descriptor(descriptor, index);
        debug!("add variable '{}' at column {}", var.name, index);
        self.insert_sorted(var.clone());
        Ok(var)
    }

    async fn delete_variable(&mut self, column_index: usize) -> Result<(), StoreError> {
        if let Some(pos) = self.position(column_index) {
            self.variables.remove(pos);
        }
        for var in self.variables.iter_mut().filter(|v| v.column_index > column_index) {
            var.column_index -= 1;
        }
        Ok(())
    }

    async fn update_variable(&mut self, column_index: usize, field: VariableField) -> Result<(), StoreError> {
        let pos = self.position(column_index).ok_or(StoreError::UnknownVariable(column_index))?;
        let var = &mut self.variables[pos];

        if let VariableField::Missing(spec) = &field {
            spec.validate(var.var_type)
                .map_err(|source| StoreError::InvalidMissing { column: column_index, source })?;
        }

        var.apply(field);

        // A type change can invalidate the existing missing-values spec
        if var.missing.validate(var.var_type).is_err() {
            debug!("clearing missing values of '{}' after type change", var.name);
            var.missing = Default::default();
        }
        Ok(())
    }

    async fn ensure_complete_variables(&mut self, max_index: usize) -> Result<(), StoreError> {
        for index in 0..=max_index {
            if self.position(index).is_none() {
                let mut var = self.default_variable(index);
                var.name = self.unique_default_name(index);
                self.insert_sorted(var);
            }
        }
        Ok(())
    }

    fn variable_by_column_index(&self, column_index: usize) -> Option<Variable> {
        self.position(column_index).map(|pos| self.variables[pos].clone())
    }

    fn variables(&self) -> Vec<Variable> {
        self.variables.clone()
    }
}

// ============================================================================
// Data
// ============================================================================

/// A dense row-major matrix. Every row is padded to `cols` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryDataStore {
    rows: Vec<Vec<CellValue>>,
    cols: usize,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from rows of uneven length; short rows are padded with `Empty`.
    pub fn from_rows(mut rows: Vec<Vec<CellValue>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(cols, CellValue::Empty);
        }
        Self { rows, cols }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    fn check_row(&self, row: usize, inclusive_end: bool) -> Result<(), StoreError> {
        let limit = if inclusive_end { self.rows.len() + 1 } else { self.rows.len() };
        if row < limit {
            Ok(())
        } else {
            Err(StoreError::RowOutOfBounds { row, rows: self.rows.len() })
        }
    }

    fn check_col(&self, col: usize, inclusive_end: bool) -> Result<(), StoreError> {
        let limit = if inclusive_end { self.cols + 1 } else { self.cols };
        if col < limit {
            Ok(())
        } else {
            Err(StoreError::ColumnOutOfBounds { col, cols: self.cols })
        }
    }
}

impl DataStore for MemoryDataStore {
    async fn add_row(&mut self, index: usize) -> Result<(), StoreError> {
        self.check_row(index, true)?;
        self.rows.insert(index, vec![CellValue::Empty; self.cols]);
        Ok(())
    }

    async fn add_column(&mut self, index: usize) -> Result<(), StoreError> {
        self.check_col(index, true)?;
        for row in &mut self.rows {
            row.insert(index, CellValue::Empty);
        }
        self.cols += 1;
        Ok(())
    }

    async fn delete_row(&mut self, index: usize) -> Result<(), StoreError> {
        self.check_row(index, false)?;
        self.rows.remove(index);
        Ok(())
    }

    async fn delete_column(&mut self, index: usize) -> Result<(), StoreError> {
        self.check_col(index, false)?;
        for row in &mut self.rows {
            row.remove(index);
        }
        self.cols -= 1;
        Ok(())
    }

    async fn update_bulk_cells(&mut self, updates: Vec<CellUpdate>) -> Result<(), StoreError> {
        if let Some(bad) = updates.iter().find(|u| u.row >= self.rows.len() || u.col >= self.cols) {
            return Err(StoreError::CellOutOfBounds {
                row: bad.row,
                col: bad.col,
                rows: self.rows.len(),
                cols: self.cols,
            });
        }
        for update in updates {
            self.rows[update.row][update.col] = update.value;
        }
        Ok(())
    }

    async fn ensure_matrix_dimensions(&mut self, rows: usize, cols: usize) -> Result<(), StoreError> {
        if cols > self.cols {
            self.cols = cols;
            for row in &mut self.rows {
                row.resize(cols, CellValue::Empty);
            }
        }
        if rows > self.rows.len() {
            let width = self.cols;
            self.rows.resize_with(rows, || vec![CellValue::Empty; width]);
        }
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_count(&self) -> usize {
        self.cols
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        self.rows.clone()
    }
}
