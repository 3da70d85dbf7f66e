//! Grid widget callbacks.
//!
//! [`GridAdapter`] is what a grid widget talks to. It vetoes every direct
//! edit, routes the batch through the reconciler and queue, and keeps the
//! selection and invalid-cell state the widget asks about.

use log::{debug, error, warn};
use statgrid_core::{Range, Selection};

use crate::cell::EditValue;
use crate::context_menu::{ContextMenu, MenuAction, MenuItem};
use crate::error::QueueError;
use crate::operation::PendingOperation;
use crate::queue::QueueHandle;
use crate::reconcile::{reconcile, ChangeSource, RawEdit};
use crate::structure::ColumnConfig;
use crate::table::{TableSettings, TableSnapshot};
use crate::validation::InvalidCell;
use crate::variable::VariableField;

/// Result of one `before_change` call, for callers that want more than the
/// veto flag.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOutcome {
    /// Operations were queued under these sequence numbers.
    Queued(Vec<u64>),
    /// Every edit was a no-op.
    Ignored,
    /// Validation failed; nothing was queued.
    Rejected(Vec<InvalidCell>),
    /// The worker is gone.
    QueueClosed,
}

pub struct GridAdapter {
    queue: QueueHandle,
    settings: TableSettings,
    selection: Option<Selection>,
    invalid: Vec<InvalidCell>,
    last_outcome: Option<ChangeOutcome>,
}

impl GridAdapter {
    pub fn new(queue: QueueHandle, settings: TableSettings) -> Self {
        Self { queue, settings, selection: None, invalid: Vec::new(), last_outcome: None }
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn queue(&self) -> &QueueHandle {
        &self.queue
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Intercept a proposed edit batch. Always returns `false`: the widget
    /// must not apply the edit itself.
    pub fn before_change(&mut self, snapshot: &TableSnapshot, edits: &[RawEdit], source: ChangeSource) -> bool {
        debug!("before_change: {} edit(s) from {:?}", edits.len(), source);
        let outcome = match reconcile(snapshot, edits, &self.settings) {
            Ok(ops) if ops.is_empty() => ChangeOutcome::Ignored,
            Ok(ops) => {
                self.clear_invalid_for(ops.iter().flat_map(|op| op.updates()).map(|u| (u.row, u.col)));
                match self.queue.enqueue_all(ops) {
                    Ok(seqs) => ChangeOutcome::Queued(seqs),
                    Err(e) => {
                        error!("dropping edit batch: {e}");
                        ChangeOutcome::QueueClosed
                    }
                }
            }
            Err(rejected) => {
                for cell in &rejected.invalid {
                    self.mark_invalid(cell.clone());
                }
                ChangeOutcome::Rejected(rejected.invalid)
            }
        };
        self.last_outcome = Some(outcome);
        false
    }

    /// What the most recent `before_change` did.
    pub fn last_outcome(&self) -> Option<&ChangeOutcome> {
        self.last_outcome.as_ref()
    }

    /// Run a column's validator against a value and record the result.
    pub fn after_validate(&mut self, row: usize, col: usize, value: &EditValue, config: &ColumnConfig) -> bool {
        let Some(validator) = config.validator else {
            return true;
        };
        match validator.validate(&value.as_text()) {
            Ok(()) => {
                self.clear_invalid_for(std::iter::once((row, col)));
                true
            }
            Err(reason) => {
                self.mark_invalid(InvalidCell { row, col, reason });
                false
            }
        }
    }

    pub fn invalid_cells(&self) -> &[InvalidCell] {
        &self.invalid
    }

    pub fn is_invalid(&self, row: usize, col: usize) -> bool {
        self.invalid.iter().any(|c| c.row == row && c.col == col)
    }

    fn mark_invalid(&mut self, cell: InvalidCell) {
        self.invalid.retain(|c| !(c.row == cell.row && c.col == cell.col));
        self.invalid.push(cell);
    }

    fn clear_invalid_for(&mut self, cells: impl Iterator<Item = (usize, usize)>) {
        for (row, col) in cells {
            self.invalid.retain(|c| !(c.row == row && c.col == col));
        }
    }

    // ========================================================================
    // Selection and layout
    // ========================================================================

    /// Record the selection the widget reports. `-1` coordinates are header
    /// clicks.
    pub fn after_selection_end(&mut self, row: isize, col: isize, row2: isize, col2: isize) {
        self.selection = Some(Selection::from_range(Range::from_grid(row, col, row2, col2)));
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Persist a dragged column width on its variable. Spare columns have no
    /// variable and are ignored.
    pub fn after_column_resize(
        &self,
        snapshot: &TableSnapshot,
        column: usize,
        width: u32,
    ) -> Result<Option<u64>, QueueError> {
        match snapshot.variable_at(column) {
            Some(var) if var.columns != width => self
                .queue
                .enqueue(PendingOperation::UpdateVariable { column, field: VariableField::Columns(width) })
                .map(Some),
            Some(_) => Ok(None),
            None => {
                debug!("resize of column {column} without a variable ignored");
                Ok(None)
            }
        }
    }

    /// Single-field variable update from a dialog.
    pub fn update_variable(&self, column: usize, field: VariableField) -> Result<u64, QueueError> {
        self.queue.enqueue(PendingOperation::UpdateVariable { column, field })
    }

    // ========================================================================
    // Context menu
    // ========================================================================

    pub fn context_menu_items(&self, snapshot: &TableSnapshot) -> Vec<MenuItem> {
        ContextMenu::for_snapshot(snapshot).items(self.selection.as_ref())
    }

    /// Queue the operations for a menu action. Returns how many were queued.
    pub fn run_context_action(&self, snapshot: &TableSnapshot, action: MenuAction) -> Result<usize, QueueError> {
        let ops = ContextMenu::for_snapshot(snapshot).command(action, self.selection.as_ref());
        if ops.is_empty() {
            warn!("{:?} has nothing to act on", action);
            return Ok(0);
        }
        self.queue.enqueue_all(ops).map(|seqs| seqs.len())
    }
}
