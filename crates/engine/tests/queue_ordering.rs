// Queue ordering and store call-order tests.
//
// The recording stores wrap the in-memory ones, log every call to a shared
// trace and suspend once per call so that producers get a chance to run
// while an operation is in flight.

use std::cell::RefCell;
use std::rc::Rc;

use smol::future::yield_now;
use smol::LocalExecutor;
use statgrid_engine::cell::CellValue;
use statgrid_engine::error::StoreError;
use statgrid_engine::events::{EventCollector, QueueEvent};
use statgrid_engine::memory::{MemoryDataStore, MemoryVariableStore};
use statgrid_engine::operation::{Dimensions, PendingOperation};
use statgrid_engine::queue::{operation_queue, QueueHandle, QueueWorker};
use statgrid_engine::store::{CellUpdate, DataStore, VariableStore};
use statgrid_engine::variable::{Variable, VariableDescriptor, VariableField};

// ---------------------------------------------------------------------------
// Recording stores
// ---------------------------------------------------------------------------

type Trace = Rc<RefCell<Vec<String>>>;

struct RecordingVariables {
    inner: MemoryVariableStore,
    trace: Trace,
}

struct RecordingData {
    inner: MemoryDataStore,
    trace: Trace,
}

async fn record(trace: &Trace, entry: String) {
    trace.borrow_mut().push(entry);
    yield_now().await;
}

impl VariableStore for RecordingVariables {
    async fn add_variable(&mut self, descriptor: VariableDescriptor) -> Result<Variable, StoreError> {
        record(&self.trace, format!("add_variable({:?})", descriptor.column_index)).await;
        self.inner.add_variable(descriptor).await
    }

    async fn add_multiple_variables(&mut self, descriptors: Vec<VariableDescriptor>) -> Result<(), StoreError> {
        record(&self.trace, format!("add_multiple_variables({})", descriptors.len())).await;
        self.inner.add_multiple_variables(descriptors).await
    }

    async fn delete_variable(&mut self, column_index: usize) -> Result<(), StoreError> {
        record(&self.trace, format!("delete_variable({column_index})")).await;
        self.inner.delete_variable(column_index).await
    }

    async fn update_variable(&mut self, column_index: usize, field: VariableField) -> Result<(), StoreError> {
        record(&self.trace, format!("update_variable({column_index}, {})", field.name())).await;
        self.inner.update_variable(column_index, field).await
    }

    async fn ensure_complete_variables(&mut self, max_index: usize) -> Result<(), StoreError> {
        record(&self.trace, format!("ensure_complete_variables({max_index})")).await;
        self.inner.ensure_complete_variables(max_index).await
    }

    fn variable_by_column_index(&self, column_index: usize) -> Option<Variable> {
        self.inner.variable_by_column_index(column_index)
    }

    fn variables(&self) -> Vec<Variable> {
        self.inner.variables()
    }
}

impl DataStore for RecordingData {
    async fn add_row(&mut self, index: usize) -> Result<(), StoreError> {
        record(&self.trace, format!("add_row({index})")).await;
        self.inner.add_row(index).await
    }

    async fn add_column(&mut self, index: usize) -> Result<(), StoreError> {
        record(&self.trace, format!("add_column({index})")).await;
        self.inner.add_column(index).await
    }

    async fn delete_row(&mut self, index: usize) -> Result<(), StoreError> {
        record(&self.trace, format!("delete_row({index})")).await;
        self.inner.delete_row(index).await
    }

    async fn delete_rows(&mut self, indices: Vec<usize>) -> Result<(), StoreError> {
        record(&self.trace, format!("delete_rows({indices:?})")).await;
        self.inner.delete_rows(indices).await
    }

    async fn delete_column(&mut self, index: usize) -> Result<(), StoreError> {
        record(&self.trace, format!("delete_column({index})")).await;
        self.inner.delete_column(index).await
    }

    async fn delete_columns(&mut self, indices: Vec<usize>) -> Result<(), StoreError> {
        record(&self.trace, format!("delete_columns({indices:?})")).await;
        self.inner.delete_columns(indices).await
    }

    async fn update_bulk_cells(&mut self, updates: Vec<CellUpdate>) -> Result<(), StoreError> {
        record(&self.trace, format!("update_bulk_cells({})", updates.len())).await;
        self.inner.update_bulk_cells(updates).await
    }

    async fn ensure_matrix_dimensions(&mut self, rows: usize, cols: usize) -> Result<(), StoreError> {
        record(&self.trace, format!("ensure_matrix_dimensions({rows}, {cols})")).await;
        self.inner.ensure_matrix_dimensions(rows, cols).await
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        self.inner.rows()
    }
}

/// A queue over recording stores whose events also land in the trace.
fn recording_queue(
    variables: MemoryVariableStore,
    data: MemoryDataStore,
) -> (QueueHandle, QueueWorker<RecordingVariables, RecordingData>, Trace) {
    let trace: Trace = Rc::new(RefCell::new(Vec::new()));
    let (handle, mut worker) = operation_queue(
        RecordingVariables { inner: variables, trace: Rc::clone(&trace) },
        RecordingData { inner: data, trace: Rc::clone(&trace) },
    );
    let sink = Rc::clone(&trace);
    worker.set_listener(move |event| {
        let entry = match event {
            QueueEvent::Applied(e) => format!("done #{}", e.seq),
            QueueEvent::Failed(e) => format!("failed #{}", e.seq),
        };
        sink.borrow_mut().push(entry);
    });
    (handle, worker, trace)
}

fn num(n: f64) -> CellValue {
    CellValue::Number(n)
}

/// `n` rows x `cols` columns of numbers with default variables.
async fn seeded(rows: usize, cols: usize) -> (MemoryVariableStore, MemoryDataStore) {
    let mut vars = MemoryVariableStore::new();
    if cols > 0 {
        vars.ensure_complete_variables(cols - 1).await.unwrap();
    }
    let data = MemoryDataStore::from_rows(
        (0..rows)
            .map(|r| (0..cols).map(|c| num((r * 10 + c) as f64)).collect())
            .collect(),
    );
    (vars, data)
}

// ---------------------------------------------------------------------------
// FIFO and isolation
// ---------------------------------------------------------------------------

#[test]
fn operations_never_interleave_with_concurrent_producers() {
    let ex = LocalExecutor::new();
    smol::block_on(ex.run(async {
        let (vars, data) = seeded(2, 2).await;
        let (handle, worker, trace) = recording_queue(vars, data);

        // Two producers enqueue while the worker is mid-operation
        let producers: Vec<_> = (0..2)
            .map(|p| {
                let handle = handle.clone();
                ex.spawn(async move {
                    for i in 0..5 {
                        let op = if (p + i) % 2 == 0 {
                            PendingOperation::InsertRow { at: 0 }
                        } else {
                            PendingOperation::UpdateCells {
                                updates: vec![CellUpdate::new(0, 0, num(i as f64))],
                                dimensions: Some(Dimensions::new(2, 3)),
                            }
                        };
                        handle.enqueue(op).unwrap();
                        yield_now().await;
                    }
                })
            })
            .collect();
        drop(handle);

        let run = ex.spawn(worker.run());
        for producer in producers {
            producer.await;
        }
        let (_, data) = run.await;
        assert_eq!(data.row_count(), 7);

        // Between two completion markers lie only the calls of one operation,
        // and completion markers arrive in enqueue order
        let trace = trace.borrow();
        let done: Vec<u64> = trace
            .iter()
            .filter_map(|e| e.strip_prefix("done #"))
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(done, (0..10).collect::<Vec<_>>());

        let mut calls_since_marker = Vec::new();
        for entry in trace.iter() {
            if entry.starts_with("done #") {
                let is_insert = calls_since_marker == ["add_row(0)"];
                let is_update = calls_since_marker == ["ensure_matrix_dimensions(2, 3)", "update_bulk_cells(1)"];
                assert!(is_insert || is_update, "interleaved calls: {calls_since_marker:?}");
                calls_since_marker.clear();
            } else {
                calls_since_marker.push(entry.as_str());
            }
        }
        assert!(calls_since_marker.is_empty());
    }));
}

#[test]
fn enqueue_during_drain_is_picked_up_in_same_pass() {
    smol::block_on(async {
        let (vars, data) = seeded(0, 0).await;
        let (handle, mut worker, trace) = recording_queue(vars, data);

        let late = handle.clone();
        worker.set_listener(move |event| {
            // Follow up the first operation with another one
            if event.seq() == 0 {
                late.enqueue(PendingOperation::InsertRow { at: 1 }).unwrap();
            }
        });
        handle.enqueue(PendingOperation::InsertRow { at: 0 }).unwrap();

        let report = worker.drain().await;
        assert_eq!(report.applied, 2);
        assert_eq!(worker.data().row_count(), 2);
        assert_eq!(*trace.borrow(), vec!["add_row(0)", "add_row(1)"]);
    });
}

#[test]
fn failed_operation_is_skipped_without_rollback() {
    smol::block_on(async {
        let (vars, data) = seeded(1, 1).await;
        let (handle, mut worker, trace) = recording_queue(vars, data);

        // Grows the matrix, then fails writing outside it
        handle
            .enqueue(PendingOperation::UpdateCells {
                updates: vec![CellUpdate::new(5, 5, num(1.0))],
                dimensions: Some(Dimensions::new(2, 2)),
            })
            .unwrap();
        handle.enqueue(PendingOperation::InsertRow { at: 0 }).unwrap();

        let report = worker.drain().await;
        assert_eq!((report.applied, report.failed), (1, 1));
        assert_eq!(
            *trace.borrow(),
            vec![
                "ensure_matrix_dimensions(2, 2)",
                "update_bulk_cells(1)",
                "failed #0",
                "add_row(0)",
                "done #1",
            ]
        );
        // The dimension growth of the failed operation stays
        assert_eq!(worker.data().row_count(), 3);
        assert_eq!(worker.data().column_count(), 2);
    });
}

#[test]
fn events_report_failures_to_collector() {
    smol::block_on(async {
        let (handle, mut worker) = operation_queue(MemoryVariableStore::new(), MemoryDataStore::new());
        let events = Rc::new(RefCell::new(EventCollector::new()));
        let sink = Rc::clone(&events);
        worker.set_listener(move |e| sink.borrow_mut().push(e));

        handle.enqueue(PendingOperation::DeleteRows { rows: vec![0] }).unwrap();
        handle.enqueue(PendingOperation::InsertRow { at: 0 }).unwrap();
        worker.drain().await;

        let events = events.borrow();
        assert_eq!(events.failed().len(), 1);
        assert!(matches!(events.failed()[0].error, StoreError::RowOutOfBounds { row: 0, rows: 0 }));
        assert_eq!(events.applied()[0].seq, 1);
    });
}

// ---------------------------------------------------------------------------
// Column insert / delete ordering
// ---------------------------------------------------------------------------

#[test]
fn column_insert_creates_variable_before_data_column() {
    smol::block_on(async {
        let (vars, data) = seeded(2, 3).await;
        let (handle, mut worker, trace) = recording_queue(vars, data);

        handle.enqueue(PendingOperation::InsertColumn { at: 1 }).unwrap();
        worker.drain().await;

        assert_eq!(*trace.borrow(), vec!["add_variable(Some(1))", "add_column(1)", "done #0"]);

        // The variable that was at 1 moved to 2, and so did its data
        let moved = worker.variables().variable_by_column_index(2).unwrap();
        assert_eq!(moved.name, "var2");
        assert_eq!(worker.variables().variable_by_column_index(1).unwrap().name, "var4");
        assert_eq!(worker.data().rows()[0], vec![num(0.0), CellValue::Empty, num(1.0), num(2.0)]);
        assert_eq!(worker.data().rows()[1], vec![num(10.0), CellValue::Empty, num(11.0), num(12.0)]);
    });
}

#[test]
fn column_delete_removes_all_variables_before_data() {
    smol::block_on(async {
        let (vars, data) = seeded(1, 4).await;
        let (handle, mut worker, trace) = recording_queue(vars, data);

        handle.enqueue(PendingOperation::DeleteColumns { columns: vec![1, 3] }).unwrap();
        worker.drain().await;

        assert_eq!(
            *trace.borrow(),
            vec!["delete_variable(3)", "delete_variable(1)", "delete_columns([3, 1])", "done #0"]
        );
        let names: Vec<_> = worker.variables().variables().into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["var1", "var3"]);
        assert_eq!(worker.data().rows()[0], vec![num(0.0), num(2.0)]);
    });
}

#[test]
fn column_growth_call_sequence() {
    smol::block_on(async {
        let (vars, data) = seeded(1, 1).await;
        let (handle, mut worker, trace) = recording_queue(vars, data);

        handle
            .enqueue(PendingOperation::AddColAndUpdate {
                variables: vec![VariableDescriptor::at(3)],
                dimensions: Dimensions::new(1, 4),
                updates: vec![CellUpdate::new(0, 3, num(7.0))],
            })
            .unwrap();
        worker.drain().await;

        assert_eq!(
            *trace.borrow(),
            vec![
                "add_multiple_variables(1)",
                "ensure_complete_variables(3)",
                "ensure_matrix_dimensions(1, 4)",
                "update_bulk_cells(1)",
                "done #0",
            ]
        );
        let indices: Vec<_> = worker.variables().variables().iter().map(|v| v.column_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    });
}
