//! Edit script replay: drive the grid headlessly from a JSON script.
//!
//! Usage: statgrid replay script.json [--format csv|json] [--output file]
//!
//! ## Script format
//!
//! ```json
//! {
//!   "variables": [{ "name": "age" }, { "name": "city", "type": "STRING" }],
//!   "rows": [[31, "Oslo"]],
//!   "steps": [
//!     { "step": "edit", "source": "copyPaste", "edits": [{ "row": 1, "prop": 0, "old": null, "new": "44" }] },
//!     { "step": "select", "row": 0, "col": 1, "row2": 0, "col2": 1 },
//!     { "step": "menu", "action": "insert_column_left" },
//!     { "step": "resize", "column": 0, "width": 120 },
//!     { "step": "variable", "column": 0, "update": { "field": "label", "value": "Age" } }
//!   ]
//! }
//! ```
//!
//! Every step is queued and drained before the next one runs, so each step
//! sees the stores exactly as the previous one left them.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use log::{debug, info};
use serde::Deserialize;
use statgrid_engine::cell::CellValue;
use statgrid_engine::context_menu::MenuAction;
use statgrid_engine::error::StoreError;
use statgrid_engine::events::{EventCollector, OperationFailed};
use statgrid_engine::grid::{ChangeOutcome, GridAdapter};
use statgrid_engine::memory::{MemoryDataStore, MemoryVariableStore};
use statgrid_engine::queue::operation_queue;
use statgrid_engine::reconcile::{ChangeSource, RawEdit};
use statgrid_engine::store::{DataStore, VariableStore};
use statgrid_engine::table::{TableSettings, TableSnapshot};
use statgrid_engine::validation::InvalidCell;
use statgrid_engine::variable::{Variable, VariableDescriptor, VariableField};

use crate::exit_codes::{EXIT_REPLAY_PARSE, EXIT_REPLAY_QUEUE};
use crate::CliError;

// ============================================================================
// Script
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Initial variables. A missing `columnIndex` means "this position".
    #[serde(default)]
    pub variables: Vec<VariableDescriptor>,
    /// Initial data rows.
    #[serde(default)]
    pub rows: Vec<Vec<CellValue>>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Edit {
        #[serde(default)]
        source: ChangeSource,
        edits: Vec<RawEdit>,
    },
    Select {
        row: isize,
        col: isize,
        row2: isize,
        col2: isize,
    },
    Deselect,
    Menu {
        action: MenuAction,
    },
    Resize {
        column: usize,
        width: u32,
    },
    Variable {
        column: usize,
        update: VariableField,
    },
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Edit { .. } => "edit",
            Step::Select { .. } => "select",
            Step::Deselect => "deselect",
            Step::Menu { .. } => "menu",
            Step::Resize { .. } => "resize",
            Step::Variable { .. } => "variable",
        }
    }
}

pub fn parse_script(contents: &str) -> Result<Script, CliError> {
    serde_json::from_str(contents).map_err(|e| CliError {
        code: EXIT_REPLAY_PARSE,
        message: format!("invalid replay script: {}", e),
        hint: Some("see `statgrid replay --help` for the script format".to_string()),
    })
}

// ============================================================================
// Execution
// ============================================================================

/// An edit step whose batch was refused.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedStep {
    pub step: usize,
    pub cells: Vec<InvalidCell>,
}

/// Result of replaying a script.
#[derive(Debug)]
pub struct ReplayResult {
    /// Both stores after the last step.
    pub snapshot: TableSnapshot,
    /// Steps executed.
    pub steps: usize,
    /// Operations applied successfully.
    pub applied: usize,
    /// Operations the stores refused.
    pub failed: Vec<OperationFailed>,
    /// Edit batches refused before reaching the queue.
    pub rejected: Vec<RejectedStep>,
}

pub fn execute_script(path: &Path, settings: TableSettings) -> Result<ReplayResult, CliError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {}", path.display(), e)))?;
    let script = parse_script(&contents)?;
    smol::block_on(execute(script, settings))
}

pub async fn execute(script: Script, settings: TableSettings) -> Result<ReplayResult, CliError> {
    let (variables, data) = seed_stores(script.variables, script.rows, settings).await?;

    let (handle, mut worker) = operation_queue(variables, data);
    let events = Rc::new(RefCell::new(EventCollector::new()));
    let sink = Rc::clone(&events);
    worker.set_listener(move |event| sink.borrow_mut().push(event));

    let mut grid = GridAdapter::new(handle, settings);
    let mut rejected = Vec::new();
    let steps = script.steps.len();

    for (index, step) in script.steps.into_iter().enumerate() {
        debug!("step {}: {}", index, step.name());
        let snapshot = worker.snapshot();
        match step {
            Step::Edit { source, edits } => {
                grid.before_change(&snapshot, &edits, source);
                match grid.last_outcome() {
                    Some(ChangeOutcome::Rejected(cells)) => {
                        rejected.push(RejectedStep { step: index, cells: cells.clone() })
                    }
                    Some(ChangeOutcome::QueueClosed) => return Err(queue_closed(index)),
                    _ => {}
                }
            }
            Step::Select { row, col, row2, col2 } => grid.after_selection_end(row, col, row2, col2),
            Step::Deselect => grid.deselect(),
            Step::Menu { action } => {
                grid.run_context_action(&snapshot, action).map_err(|_| queue_closed(index))?;
            }
            Step::Resize { column, width } => {
                grid.after_column_resize(&snapshot, column, width)
                    .map_err(|_| queue_closed(index))?;
            }
            Step::Variable { column, update } => {
                grid.update_variable(column, update).map_err(|_| queue_closed(index))?;
            }
        }
        worker.drain().await;
    }

    let snapshot = worker.snapshot();
    let collected = events.borrow();
    let failed: Vec<OperationFailed> = collected.failed().into_iter().cloned().collect();
    let applied = collected.applied().len();
    info!(
        "replayed {} steps: {} operations applied, {} failed, {} batches rejected",
        steps,
        applied,
        failed.len(),
        rejected.len()
    );

    Ok(ReplayResult { snapshot, steps, applied, failed, rejected })
}

/// Build stores from the script's initial state. Data narrower than the
/// variables is widened; data wider than the variables gets default ones.
async fn seed_stores(
    descriptors: Vec<VariableDescriptor>,
    rows: Vec<Vec<CellValue>>,
    settings: TableSettings,
) -> Result<(MemoryVariableStore, MemoryDataStore), CliError> {
    let variables: Vec<Variable> = descriptors
        .into_iter()
        .enumerate()
        .map(|(position, descriptor)| {
            let index = descriptor.column_index.unwrap_or(position);
            Variable::from_descriptor(descriptor, index)
        })
        .collect();

    let mut var_store = MemoryVariableStore::from_variables(variables, settings);
    let mut data_store = MemoryDataStore::from_rows(rows);

    let var_extent = var_store
        .variables()
        .iter()
        .map(|v| v.column_index + 1)
        .max()
        .unwrap_or(0);
    let cols = var_extent.max(data_store.column_count());
    let seed_error = |e: StoreError| CliError {
        code: EXIT_REPLAY_PARSE,
        message: format!("invalid initial state: {}", e),
        hint: None,
    };

    if cols > 0 {
        var_store.ensure_complete_variables(cols - 1).await.map_err(seed_error)?;
    }
    let row_count = data_store.row_count();
    data_store.ensure_matrix_dimensions(row_count, cols).await.map_err(seed_error)?;

    Ok((var_store, data_store))
}

fn queue_closed(step: usize) -> CliError {
    CliError {
        code: EXIT_REPLAY_QUEUE,
        message: format!("operation queue closed at step {}", step),
        hint: None,
    }
}

// ============================================================================
// Output
// ============================================================================

/// Header text for every committed column.
pub fn column_headers(snapshot: &TableSnapshot) -> Vec<String> {
    (0..snapshot.actual_cols())
        .map(|col| match snapshot.variable_at(col) {
            Some(var) => var.name.clone(),
            None => Variable::default_name(col),
        })
        .collect()
}

/// Write the committed data as CSV with a header row of variable names.
pub fn write_csv<W: std::io::Write>(snapshot: &TableSnapshot, out: W) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_writer(out);
    let to_cli = |e: csv::Error| CliError::io(e.to_string());

    writer.write_record(column_headers(snapshot)).map_err(to_cli)?;
    for row in 0..snapshot.actual_rows() {
        let record: Vec<String> = (0..snapshot.actual_cols())
            .map(|col| snapshot.cell(row, col).map(CellValue::raw_display).unwrap_or_default())
            .collect();
        writer.write_record(&record).map_err(to_cli)?;
    }
    writer.flush().map_err(|e| CliError::io(e.to_string()))
}

/// Full replay result as JSON.
pub fn to_json(result: &ReplayResult) -> serde_json::Value {
    serde_json::json!({
        "steps": result.steps,
        "applied": result.applied,
        "failed": result.failed.iter().map(|f| serde_json::json!({
            "seq": f.seq,
            "kind": f.kind.as_str(),
            "error": f.error.to_string(),
        })).collect::<Vec<_>>(),
        "rejected": result.rejected.iter().map(|r| serde_json::json!({
            "step": r.step,
            "cells": r.cells,
        })).collect::<Vec<_>>(),
        "variables": result.snapshot.variables,
        "rows": result.snapshot.rows,
    })
}
