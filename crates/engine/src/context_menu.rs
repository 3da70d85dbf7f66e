//! Context menu commands for the data grid.
//!
//! Translates a selection into queued operations. Insert positions clamp to
//! the committed extent; delete and align commands ignore spare rows and
//! columns.

use serde::{Deserialize, Serialize};
use statgrid_core::Selection;

use crate::operation::PendingOperation;
use crate::table::TableSnapshot;
use crate::variable::Alignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuAction {
    InsertRowAbove,
    InsertRowBelow,
    DeleteRows,
    InsertColumnLeft,
    InsertColumnRight,
    DeleteColumns,
    AlignLeft,
    AlignCenter,
    AlignRight,
}

impl MenuAction {
    pub const ALL: [MenuAction; 9] = [
        MenuAction::InsertRowAbove,
        MenuAction::InsertRowBelow,
        MenuAction::DeleteRows,
        MenuAction::InsertColumnLeft,
        MenuAction::InsertColumnRight,
        MenuAction::DeleteColumns,
        MenuAction::AlignLeft,
        MenuAction::AlignCenter,
        MenuAction::AlignRight,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::InsertRowAbove => "Insert row above",
            MenuAction::InsertRowBelow => "Insert row below",
            MenuAction::DeleteRows => "Delete row(s)",
            MenuAction::InsertColumnLeft => "Insert column left",
            MenuAction::InsertColumnRight => "Insert column right",
            MenuAction::DeleteColumns => "Delete column(s)",
            MenuAction::AlignLeft => "Align left",
            MenuAction::AlignCenter => "Align center",
            MenuAction::AlignRight => "Align right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub action: MenuAction,
    pub label: &'static str,
    pub disabled: bool,
}

/// Menu state for one committed extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextMenu {
    actual_rows: usize,
    actual_cols: usize,
}

impl ContextMenu {
    pub fn new(actual_rows: usize, actual_cols: usize) -> Self {
        Self { actual_rows, actual_cols }
    }

    pub fn for_snapshot(snapshot: &TableSnapshot) -> Self {
        Self::new(snapshot.actual_rows(), snapshot.actual_cols())
    }

    /// Items to show. Everything is disabled without a selection.
    pub fn items(&self, selection: Option<&Selection>) -> Vec<MenuItem> {
        MenuAction::ALL
            .iter()
            .map(|&action| MenuItem {
                action,
                label: action.label(),
                disabled: selection.map_or(true, |sel| !self.is_enabled(action, sel)),
            })
            .collect()
    }

    fn is_enabled(&self, action: MenuAction, selection: &Selection) -> bool {
        match action {
            MenuAction::DeleteRows => !self.committed_rows(selection).is_empty(),
            MenuAction::DeleteColumns
            | MenuAction::AlignLeft
            | MenuAction::AlignCenter
            | MenuAction::AlignRight => !self.committed_columns(selection).is_empty(),
            _ => true,
        }
    }

    /// Operations for an action, in the order they must run.
    pub fn command(&self, action: MenuAction, selection: Option<&Selection>) -> Vec<PendingOperation> {
        let Some(selection) = selection else {
            return Vec::new();
        };
        let rows = selection.rows();
        let columns = selection.columns();
        let (Some(&first_row), Some(&last_row)) = (rows.first(), rows.last()) else {
            return Vec::new();
        };
        let (Some(&first_col), Some(&last_col)) = (columns.first(), columns.last()) else {
            return Vec::new();
        };

        match action {
            MenuAction::InsertRowAbove => vec![PendingOperation::InsertRow {
                at: first_row.min(self.actual_rows),
            }],
            MenuAction::InsertRowBelow => vec![PendingOperation::InsertRow {
                at: (last_row + 1).min(self.actual_rows),
            }],
            MenuAction::InsertColumnLeft => vec![PendingOperation::InsertColumn {
                at: first_col.min(self.actual_cols),
            }],
            MenuAction::InsertColumnRight => vec![PendingOperation::InsertColumn {
                at: (last_col + 1).min(self.actual_cols),
            }],
            MenuAction::DeleteRows => {
                let rows = self.committed_rows(selection);
                if rows.is_empty() {
                    Vec::new()
                } else {
                    vec![PendingOperation::DeleteRows { rows }]
                }
            }
            MenuAction::DeleteColumns => {
                let columns = self.committed_columns(selection);
                if columns.is_empty() {
                    Vec::new()
                } else {
                    vec![PendingOperation::DeleteColumns { columns }]
                }
            }
            MenuAction::AlignLeft => self.align(selection, Alignment::Left),
            MenuAction::AlignCenter => self.align(selection, Alignment::Center),
            MenuAction::AlignRight => self.align(selection, Alignment::Right),
        }
    }

    fn align(&self, selection: &Selection, align: Alignment) -> Vec<PendingOperation> {
        let columns = self.committed_columns(selection);
        if columns.is_empty() {
            Vec::new()
        } else {
            vec![PendingOperation::SetAlignment { columns, align }]
        }
    }

    fn committed_rows(&self, selection: &Selection) -> Vec<usize> {
        selection.rows().into_iter().filter(|&r| r < self.actual_rows).collect()
    }

    fn committed_columns(&self, selection: &Selection) -> Vec<usize> {
        selection.columns().into_iter().filter(|&c| c < self.actual_cols).collect()
    }
}
