//! Change reconciliation.
//!
//! The grid widget proposes edits before applying them. [`reconcile`] turns
//! one proposed batch into the store operations that realize it. The widget
//! never applies the edit itself; state changes only through the queue.
//!
//! ## Classification
//!
//! With actual extent `(R, C)`:
//!
//! | Edits touch            | Operations                                  |
//! |------------------------|---------------------------------------------|
//! | row `R` and column `C` | `ADD_ROW_COL_AND_UPDATE`                    |
//! | row `R` only           | `ADD_ROW_AND_UPDATE`                        |
//! | column `C` only        | `ADD_COL_AND_UPDATE`                        |
//! | neither                | `UPDATE_CELLS`                              |
//!
//! When a branch that does not create columns itself still reaches past
//! `C - 1`, an `ADD_COLS_IMPLICIT` for the gap is emitted first.

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::cell::{is_empty_like, CellValue, EditValue};
use crate::inference::infer_column_schema;
use crate::operation::{Dimensions, PendingOperation};
use crate::store::CellUpdate;
use crate::table::{TableSettings, TableSnapshot};
use crate::validation::{
    parse_numeric_input, parse_spss_date, truncate_to_width, InvalidCell, ValidationFailureReason,
};
use crate::variable::{VariableDescriptor, VariableType};

// ============================================================================
// Input
// ============================================================================

/// A row or column reference as the widget reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellRef {
    Index(i64),
    Key(String),
}

impl CellRef {
    /// Integer index, if this reference names one.
    pub fn resolve(&self) -> Option<usize> {
        let n = match self {
            CellRef::Index(n) => *n,
            CellRef::Key(key) => key.trim().parse::<i64>().ok()?,
        };
        usize::try_from(n).ok()
    }
}

impl From<usize> for CellRef {
    fn from(n: usize) -> Self {
        CellRef::Index(n as i64)
    }
}

/// One proposed change: `(row, prop, old, new)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEdit {
    pub row: CellRef,
    pub prop: CellRef,
    #[serde(default)]
    pub old: Option<EditValue>,
    #[serde(default)]
    pub new: Option<EditValue>,
}

impl RawEdit {
    pub fn new(row: usize, col: usize, old: Option<EditValue>, new: Option<EditValue>) -> Self {
        Self { row: row.into(), prop: col.into(), old, new }
    }

    /// An edit of a previously empty cell.
    pub fn set(row: usize, col: usize, value: impl Into<EditValue>) -> Self {
        Self::new(row, col, None, Some(value.into()))
    }
}

/// What triggered an edit batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeSource {
    #[default]
    Edit,
    CopyPaste,
    Autofill,
    UndoRedo,
}

/// An edit with integer coordinates that changes something.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEdit {
    pub row: usize,
    pub col: usize,
    pub old: Option<EditValue>,
    pub new: Option<EditValue>,
}

impl ResolvedEdit {
    fn is_noop(&self) -> bool {
        self.old == self.new || (is_empty_like(&self.old) && is_empty_like(&self.new))
    }
}

/// Resolve coordinates and drop unresolvable edits and no-ops.
pub fn resolve_edits(raw: &[RawEdit]) -> Vec<ResolvedEdit> {
    raw.iter()
        .filter_map(|edit| {
            let resolved = ResolvedEdit {
                row: edit.row.resolve()?,
                col: edit.prop.resolve()?,
                old: edit.old.clone(),
                new: edit.new.clone(),
            };
            (!resolved.is_noop()).then_some(resolved)
        })
        .collect()
}

// ============================================================================
// Rejection
// ============================================================================

/// A batch refused because at least one value failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRejected {
    pub invalid: Vec<InvalidCell>,
}

impl fmt::Display for BatchRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.invalid.first() {
            Some(first) => write!(
                f,
                "edit batch rejected: {} invalid cell(s), first at ({}, {}): {}",
                self.invalid.len(),
                first.row,
                first.col,
                first.reason
            ),
            None => write!(f, "edit batch rejected"),
        }
    }
}

impl std::error::Error for BatchRejected {}

// ============================================================================
// Reconcile
// ============================================================================

/// How a column's incoming values are checked and converted.
#[derive(Debug, Clone, Copy)]
enum ColumnRule {
    Numeric,
    Date,
    Text { width: u32 },
    /// A committed column with no variable behind it yet.
    Untyped,
}

impl ColumnRule {
    fn from_type(var_type: VariableType, width: u32) -> Self {
        match var_type {
            VariableType::String => ColumnRule::Text { width },
            VariableType::Date => ColumnRule::Date,
            _ => ColumnRule::Numeric,
        }
    }

    fn convert(&self, value: &Option<EditValue>) -> Result<CellValue, ValidationFailureReason> {
        let Some(value) = value.as_ref().filter(|_| !is_empty_like(value)) else {
            return Ok(CellValue::Empty);
        };
        match (self, value) {
            (ColumnRule::Numeric | ColumnRule::Untyped, EditValue::Number(n)) => Ok(CellValue::Number(*n)),
            (ColumnRule::Numeric, EditValue::Text(s)) => parse_numeric_input(s)
                .map(CellValue::Number)
                .map_err(|_| ValidationFailureReason::NotNumeric),
            (ColumnRule::Untyped, EditValue::Text(s)) => Ok(parse_numeric_input(s)
                .map(CellValue::Number)
                .unwrap_or_else(|_| CellValue::Text(s.clone()))),
            (ColumnRule::Date, v) => {
                let text = v.as_text();
                parse_spss_date(&text)
                    .map(|_| CellValue::Text(text.trim().to_string()))
                    .map_err(ValidationFailureReason::Date)
            }
            (ColumnRule::Text { width }, v) => Ok(CellValue::Text(truncate_to_width(&v.as_text(), *width))),
        }
    }
}

fn column_rule(snapshot: &TableSnapshot, new_columns: &[VariableDescriptor], col: usize) -> ColumnRule {
    if let Some(var) = snapshot.variable_at(col) {
        return ColumnRule::from_type(var.var_type, var.width);
    }
    match new_columns.iter().find(|d| d.column_index == Some(col)) {
        Some(desc) => ColumnRule::from_type(desc.var_type.unwrap_or_default(), desc.width.unwrap_or(0)),
        // Gap columns padded as NUMERIC by the store
        None if col >= snapshot.actual_cols() => ColumnRule::Numeric,
        None => ColumnRule::Untyped,
    }
}

/// Classify one batch of proposed edits against the current store state.
///
/// Returns the operations to enqueue, in dependency order, or the cells that
/// failed validation. An empty list means every edit was a no-op.
pub fn reconcile(
    snapshot: &TableSnapshot,
    raw_edits: &[RawEdit],
    settings: &TableSettings,
) -> Result<Vec<PendingOperation>, BatchRejected> {
    let edits = resolve_edits(raw_edits);
    if edits.is_empty() {
        return Ok(Vec::new());
    }

    let actual_rows = snapshot.actual_rows();
    let actual_cols = snapshot.actual_cols();
    let new_columns = infer_column_schema(actual_cols, &edits, settings);

    // Validate everything before building any operation
    let mut updates = Vec::with_capacity(edits.len());
    let mut invalid = Vec::new();
    for edit in &edits {
        match column_rule(snapshot, &new_columns, edit.col).convert(&edit.new) {
            Ok(value) => updates.push(CellUpdate::new(edit.row, edit.col, value)),
            Err(reason) => invalid.push(InvalidCell { row: edit.row, col: edit.col, reason }),
        }
    }
    if !invalid.is_empty() {
        let rejected = BatchRejected { invalid };
        warn!("{rejected}");
        return Err(rejected);
    }

    let max_row = edits.iter().map(|e| e.row).max().unwrap_or(0);
    let max_col = edits.iter().map(|e| e.col).max().unwrap_or(0);
    let is_adding_row = edits.iter().any(|e| e.row == actual_rows);
    let is_adding_col = edits.iter().any(|e| e.col == actual_cols);
    let target = Dimensions::new(actual_rows.max(max_row + 1), actual_cols.max(max_col + 1));
    let reaches_past_cols = max_col >= actual_cols;

    let mut ops = Vec::with_capacity(2);
    if is_adding_col {
        let op = if is_adding_row {
            PendingOperation::AddRowColAndUpdate { variables: new_columns, dimensions: target, updates }
        } else {
            PendingOperation::AddColAndUpdate { variables: new_columns, dimensions: target, updates }
        };
        ops.push(op);
    } else {
        if reaches_past_cols {
            ops.push(PendingOperation::AddColsImplicit {
                variables: new_columns,
                dimensions: Dimensions::new(actual_rows, target.cols),
            });
        }
        if is_adding_row {
            ops.push(PendingOperation::AddRowAndUpdate { dimensions: target, updates });
        } else {
            let grows = max_row >= actual_rows || reaches_past_cols;
            ops.push(PendingOperation::UpdateCells {
                updates,
                dimensions: grows.then_some(target),
            });
        }
    }

    debug!(
        "reconciled {} edit(s) against {}x{} into [{}]",
        edits.len(),
        actual_rows,
        actual_cols,
        ops.iter().map(|op| op.kind().as_str()).collect::<Vec<_>>().join(", ")
    );
    Ok(ops)
}
