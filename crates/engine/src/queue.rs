//! Operation queue.
//!
//! A single worker owns both stores and consumes operations from a channel,
//! one at a time and in FIFO order. Producers hold cheap [`QueueHandle`]
//! clones and never touch the stores directly, so no two operations'
//! store calls can interleave.
//!
//! ```text
//! GridAdapter ─┐
//! ContextMenu ─┼─ QueueHandle ── channel ──> QueueWorker ──> VariableStore
//! dialogs ─────┘                                          └─> DataStore
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use smol::channel::{self, Receiver, Sender};

use crate::error::QueueError;
use crate::events::{EventCallback, OperationApplied, OperationFailed, QueueEvent};
use crate::operation::PendingOperation;
use crate::store::{snapshot, DataStore, VariableStore};
use crate::table::TableSnapshot;

/// An operation tagged with its enqueue order.
#[derive(Debug)]
struct Queued {
    seq: u64,
    op: PendingOperation,
}

/// Create a queue over the given stores.
pub fn operation_queue<V, D>(variables: V, data: D) -> (QueueHandle, QueueWorker<V, D>)
where
    V: VariableStore,
    D: DataStore,
{
    let (sender, receiver) = channel::unbounded();
    let handle = QueueHandle { sender, next_seq: Arc::new(AtomicU64::new(0)) };
    let worker = QueueWorker { receiver, variables, data, listener: None };
    (handle, worker)
}

// ============================================================================
// Producer side
// ============================================================================

/// Enqueues operations. Cloning shares the same queue.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    sender: Sender<Queued>,
    next_seq: Arc<AtomicU64>,
}

impl QueueHandle {
    /// Append an operation. Returns its sequence number.
    ///
    /// Never blocks; the queue is unbounded.
    pub fn enqueue(&self, op: PendingOperation) -> Result<u64, QueueError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        debug!("enqueue #{seq} {}", op.kind());
        self.sender.try_send(Queued { seq, op }).map_err(|_| QueueError::Closed)?;
        Ok(seq)
    }

    /// Append several operations in order.
    pub fn enqueue_all<I>(&self, ops: I) -> Result<Vec<u64>, QueueError>
    where
        I: IntoIterator<Item = PendingOperation>,
    {
        ops.into_iter().map(|op| self.enqueue(op)).collect()
    }

    /// Operations waiting for the worker.
    pub fn pending(&self) -> usize {
        self.sender.len()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

// ============================================================================
// Consumer side
// ============================================================================

/// Outcome counts of one [`QueueWorker::drain`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub applied: usize,
    pub failed: usize,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.applied + self.failed
    }
}

/// The single consumer. Owns the stores for its whole lifetime.
pub struct QueueWorker<V, D> {
    receiver: Receiver<Queued>,
    variables: V,
    data: D,
    listener: Option<EventCallback>,
}

impl<V, D> QueueWorker<V, D>
where
    V: VariableStore,
    D: DataStore,
{
    /// Receive an event after every processed operation.
    pub fn set_listener(&mut self, listener: impl FnMut(QueueEvent) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn variables(&self) -> &V {
        &self.variables
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    /// Both stores as they stand between operations.
    pub fn snapshot(&self) -> TableSnapshot {
        snapshot(&self.variables, &self.data)
    }

    /// Process everything queued so far, including operations enqueued while
    /// draining. Yields to the executor between operations.
    pub async fn drain(&mut self) -> DrainReport {
        let mut report = DrainReport::default();
        while let Ok(item) = self.receiver.try_recv() {
            if self.process(item).await {
                report.applied += 1;
            } else {
                report.failed += 1;
            }
            smol::future::yield_now().await;
        }
        report
    }

    /// Process operations until every [`QueueHandle`] is dropped, then hand
    /// the stores back.
    pub async fn run(mut self) -> (V, D) {
        while let Ok(item) = self.receiver.recv().await {
            self.process(item).await;
        }
        debug!("operation queue closed");
        self.into_stores()
    }

    pub fn into_stores(self) -> (V, D) {
        (self.variables, self.data)
    }

    /// Apply one operation. A failure is logged and reported, never raised.
    async fn process(&mut self, item: Queued) -> bool {
        let Queued { seq, op } = item;
        let kind = op.kind();
        let event = match op.apply(&mut self.variables, &mut self.data).await {
            Ok(()) => {
                debug!("#{seq} {kind} applied");
                QueueEvent::Applied(OperationApplied { seq, kind })
            }
            Err(error) => {
                warn!("#{seq} {kind} failed: {error}");
                QueueEvent::Failed(OperationFailed { seq, kind, error })
            }
        };
        let ok = matches!(event, QueueEvent::Applied(_));
        if let Some(listener) = self.listener.as_mut() {
            listener(event);
        }
        ok
    }
}
