// End-to-end flows: widget callbacks -> reconciler -> queue -> stores ->
// structure builder.

use statgrid_engine::cell::{CellValue, GridCell};
use statgrid_engine::context_menu::MenuAction;
use statgrid_engine::grid::{ChangeOutcome, GridAdapter};
use statgrid_engine::memory::{MemoryDataStore, MemoryVariableStore};
use statgrid_engine::queue::{operation_queue, QueueWorker};
use statgrid_engine::reconcile::{ChangeSource, RawEdit};
use statgrid_engine::store::{DataStore, VariableStore};
use statgrid_engine::structure::{build_table_structure, ColumnKind};
use statgrid_engine::table::TableSettings;
use statgrid_engine::variable::{Alignment, VariableField, VariableType};

type Worker = QueueWorker<MemoryVariableStore, MemoryDataStore>;

fn setup() -> (GridAdapter, Worker) {
    let settings = TableSettings { min_rows: 5, min_columns: 4, ..TableSettings::default() };
    let (handle, worker) = operation_queue(MemoryVariableStore::with_settings(settings), MemoryDataStore::new());
    (GridAdapter::new(handle, settings), worker)
}

fn edit(grid: &mut GridAdapter, worker: &mut Worker, edits: &[RawEdit]) {
    let snapshot = worker.snapshot();
    assert!(!grid.before_change(&snapshot, edits, ChangeSource::CopyPaste));
    smol::block_on(worker.drain());
}

#[test]
fn paste_into_empty_grid_creates_schema() {
    let (mut grid, mut worker) = setup();

    // Two rows by three columns; the middle column has text in it
    edit(
        &mut grid,
        &mut worker,
        &[
            RawEdit::set(0, 0, "12"),
            RawEdit::set(0, 1, "12"),
            RawEdit::set(0, 2, "1,000"),
            RawEdit::set(1, 0, "3.5"),
            RawEdit::set(1, 1, "abc"),
            RawEdit::set(1, 2, "-7"),
        ],
    );

    let vars = worker.variables().variables();
    assert_eq!(vars.len(), 3);
    assert_eq!(vars[0].var_type, VariableType::Numeric);
    assert_eq!(vars[1].var_type, VariableType::String);
    assert_eq!(vars[1].width, 8);
    assert_eq!(vars[2].var_type, VariableType::Numeric);
    assert_eq!(
        worker.data().rows(),
        vec![
            vec![CellValue::Number(12.0), CellValue::Text("12".into()), CellValue::Number(1000.0)],
            vec![CellValue::Number(3.5), CellValue::Text("abc".into()), CellValue::Number(-7.0)],
        ]
    );

    let structure = build_table_structure(&worker.snapshot(), grid.settings());
    assert_eq!(structure.headers[..3], ["var1", "var2", "var3"]);
    assert_eq!(structure.columns[1].kind, ColumnKind::Text);
    assert_eq!(structure.cell(2, 0), Some(&GridCell::Spare));
}

#[test]
fn typing_in_spare_row_then_spare_column() {
    let (mut grid, mut worker) = setup();
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 0, 1.0)]);
    edit(&mut grid, &mut worker, &[RawEdit::set(1, 0, 2.0)]);
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 1, "x")]);

    assert_eq!(worker.data().row_count(), 2);
    assert_eq!(worker.data().column_count(), 2);
    assert_eq!(worker.variables().variables()[1].var_type, VariableType::String);
    assert_eq!(worker.data().rows()[1], vec![CellValue::Number(2.0), CellValue::Empty]);
}

#[test]
fn paste_past_spare_column_pads_gap_variables() {
    let (mut grid, mut worker) = setup();
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 0, 1.0)]);
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 3, "label")]);

    let vars = worker.variables().variables();
    let types: Vec<_> = vars.iter().map(|v| (v.column_index, v.var_type)).collect();
    assert_eq!(
        types,
        vec![
            (0, VariableType::Numeric),
            (1, VariableType::Numeric),
            (2, VariableType::Numeric),
            (3, VariableType::String),
        ]
    );
    assert_eq!(worker.data().rows()[0][3], CellValue::Text("label".into()));
}

#[test]
fn rejected_date_leaves_stores_untouched() {
    let (mut grid, mut worker) = setup();
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 0, 1.0), RawEdit::set(0, 1, 2.0)]);
    grid.update_variable(
        1,
        VariableField::Type { var_type: VariableType::Date, width: 10, decimals: 0 },
    )
    .unwrap();
    smol::block_on(worker.drain());

    let before = worker.snapshot();
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 0, 5.0), RawEdit::set(0, 1, "14-10-1582")]);
    assert_eq!(worker.snapshot(), before);
    assert!(matches!(grid.last_outcome(), Some(ChangeOutcome::Rejected(cells)) if cells.len() == 1));
    assert!(grid.is_invalid(0, 1));

    edit(&mut grid, &mut worker, &[RawEdit::set(0, 1, "15-10-1582")]);
    assert_eq!(worker.data().rows()[0][1], CellValue::Text("15-10-1582".into()));
    assert!(!grid.is_invalid(0, 1));
}

#[test]
fn context_menu_insert_and_delete_column() {
    let (mut grid, mut worker) = setup();
    edit(
        &mut grid,
        &mut worker,
        &[RawEdit::set(0, 0, 1.0), RawEdit::set(0, 1, "b"), RawEdit::set(0, 2, 3.0)],
    );

    // Column header click on column 1
    grid.after_selection_end(-1, 1, 4, 1);
    let queued = grid.run_context_action(&worker.snapshot(), MenuAction::InsertColumnLeft).unwrap();
    assert_eq!(queued, 1);
    smol::block_on(worker.drain());

    let vars = worker.variables().variables();
    assert_eq!(vars.len(), 4);
    assert_eq!(vars[2].var_type, VariableType::String);
    assert_eq!(vars[2].column_index, 2);
    assert_eq!(
        worker.data().rows()[0],
        vec![CellValue::Number(1.0), CellValue::Empty, CellValue::Text("b".into()), CellValue::Number(3.0)]
    );

    grid.after_selection_end(0, 1, 0, 2);
    grid.run_context_action(&worker.snapshot(), MenuAction::DeleteColumns).unwrap();
    smol::block_on(worker.drain());
    assert_eq!(worker.data().rows()[0], vec![CellValue::Number(1.0), CellValue::Number(3.0)]);
    assert_eq!(worker.variables().variables().len(), 2);
    assert_eq!(worker.variables().variable_by_column_index(1).unwrap().name, "var3");
}

#[test]
fn context_menu_rows_and_alignment() {
    let (mut grid, mut worker) = setup();
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 0, 1.0), RawEdit::set(1, 0, 2.0)]);

    grid.after_selection_end(1, 0, 1, 0);
    grid.run_context_action(&worker.snapshot(), MenuAction::InsertRowAbove).unwrap();
    grid.run_context_action(&worker.snapshot(), MenuAction::AlignCenter).unwrap();
    smol::block_on(worker.drain());

    assert_eq!(
        worker.data().rows(),
        vec![vec![CellValue::Number(1.0)], vec![CellValue::Empty], vec![CellValue::Number(2.0)]]
    );
    assert_eq!(worker.variables().variables()[0].align, Alignment::Center);

    grid.after_selection_end(0, 0, 1, 0);
    grid.run_context_action(&worker.snapshot(), MenuAction::DeleteRows).unwrap();
    smol::block_on(worker.drain());
    assert_eq!(worker.data().rows(), vec![vec![CellValue::Number(2.0)]]);
}

#[test]
fn column_resize_is_persisted() {
    let (mut grid, mut worker) = setup();
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 0, 1.0)]);
    grid.after_column_resize(&worker.snapshot(), 0, 140).unwrap();
    smol::block_on(worker.drain());

    assert_eq!(worker.variables().variables()[0].columns, 140);
    let structure = build_table_structure(&worker.snapshot(), grid.settings());
    assert_eq!(structure.columns[0].width, 140);
}

// ---------------------------------------------------------------------------
// Several batches queued before the worker drains
// ---------------------------------------------------------------------------

fn queue_only(grid: &mut GridAdapter, snapshot: &statgrid_engine::table::TableSnapshot, edits: &[RawEdit]) {
    assert!(!grid.before_change(snapshot, edits, ChangeSource::Edit));
    assert!(matches!(grid.last_outcome(), Some(ChangeOutcome::Queued(_))));
}

#[test]
fn back_to_back_writes_to_spare_column_keep_variables_aligned() {
    let (mut grid, mut worker) = setup();
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 0, 1.0), RawEdit::set(1, 0, 2.0)]);

    // Both batches see column 1 as spare
    let snapshot = worker.snapshot();
    queue_only(&mut grid, &snapshot, &[RawEdit::set(0, 1, "a")]);
    queue_only(&mut grid, &snapshot, &[RawEdit::set(1, 1, 5.0)]);
    smol::block_on(worker.drain());

    let vars = worker.variables().variables();
    assert_eq!(vars.len(), worker.data().column_count());
    let layout: Vec<_> = vars.iter().map(|v| (v.column_index, v.name.as_str(), v.var_type)).collect();
    assert_eq!(layout, vec![(0, "var1", VariableType::Numeric), (1, "var2", VariableType::String)]);
    assert_eq!(
        worker.data().rows(),
        vec![
            vec![CellValue::Number(1.0), CellValue::Text("a".into())],
            vec![CellValue::Number(2.0), CellValue::Number(5.0)],
        ]
    );
}

#[test]
fn back_to_back_row_appends_from_one_snapshot() {
    let (mut grid, mut worker) = setup();
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 0, 1.0)]);

    let snapshot = worker.snapshot();
    queue_only(&mut grid, &snapshot, &[RawEdit::set(1, 0, 2.0)]);
    queue_only(&mut grid, &snapshot, &[RawEdit::set(2, 0, 3.0)]);
    queue_only(&mut grid, &snapshot, &[RawEdit::set(1, 0, 4.0)]);
    smol::block_on(worker.drain());

    assert_eq!(worker.variables().variables().len(), 1);
    assert_eq!(
        worker.data().rows(),
        vec![vec![CellValue::Number(1.0)], vec![CellValue::Number(4.0)], vec![CellValue::Number(3.0)]]
    );
}

#[test]
fn grown_column_gets_unused_default_name() {
    let (mut grid, mut worker) = setup();
    edit(
        &mut grid,
        &mut worker,
        &[RawEdit::set(0, 0, 1.0), RawEdit::set(0, 1, 2.0), RawEdit::set(0, 2, 3.0)],
    );

    grid.after_selection_end(-1, 0, 4, 0);
    grid.run_context_action(&worker.snapshot(), MenuAction::DeleteColumns).unwrap();
    smol::block_on(worker.drain());

    // Column 2 is spare again; its positional default is still in use
    edit(&mut grid, &mut worker, &[RawEdit::set(0, 2, 9.0)]);
    let names: Vec<_> = worker.variables().variables().into_iter().map(|v| v.name).collect();
    assert_eq!(names, vec!["var2", "var3", "var4"]);
}
