//! Event types for queue progress notifications.
//!
//! The queue worker reports every operation it finishes, successfully or
//! not. Consumers use these to refresh views; tests use them to verify
//! ordering and failure isolation.

use crate::error::StoreError;
use crate::operation::OperationKind;

/// Events emitted by the queue worker.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// An operation ran every one of its store calls.
    Applied(OperationApplied),

    /// A store call failed; the rest of that operation was skipped.
    Failed(OperationFailed),
}

impl QueueEvent {
    /// Sequence number of the operation this event is about.
    pub fn seq(&self) -> u64 {
        match self {
            QueueEvent::Applied(e) => e.seq,
            QueueEvent::Failed(e) => e.seq,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationApplied {
    /// Assigned at enqueue time, strictly increasing per queue.
    pub seq: u64,
    pub kind: OperationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationFailed {
    pub seq: u64,
    pub kind: OperationKind,
    pub error: StoreError,
}

/// Callback type for receiving queue events.
pub type EventCallback = Box<dyn FnMut(QueueEvent)>;

/// Simple event collector for testing.
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<QueueEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: QueueEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[QueueEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Filter to only Applied events.
    pub fn applied(&self) -> Vec<&OperationApplied> {
        self.events
            .iter()
            .filter_map(|e| match e {
                QueueEvent::Applied(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    /// Filter to only Failed events.
    pub fn failed(&self) -> Vec<&OperationFailed> {
        self.events
            .iter()
            .filter_map(|e| match e {
                QueueEvent::Failed(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    /// Sequence numbers in the order events arrived.
    pub fn sequence(&self) -> Vec<u64> {
        self.events.iter().map(QueueEvent::seq).collect()
    }
}
