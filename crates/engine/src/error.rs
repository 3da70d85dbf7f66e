use std::fmt;

use crate::missing::MissingSpecError;

/// Failure raised by a store call.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A cell update addressed a position outside the matrix.
    CellOutOfBounds { row: usize, col: usize, rows: usize, cols: usize },
    /// A row index past the end of the matrix.
    RowOutOfBounds { row: usize, rows: usize },
    /// A column index past the end of the matrix.
    ColumnOutOfBounds { col: usize, cols: usize },
    /// No variable is registered at this column index.
    UnknownVariable(usize),
    /// A missing-values update that does not fit the variable's type.
    InvalidMissing { column: usize, source: MissingSpecError },
    /// Anything a backing store reports that has no structured form.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CellOutOfBounds { row, col, rows, cols } => {
                write!(f, "cell ({row}, {col}) is outside the {rows}x{cols} matrix")
            }
            Self::RowOutOfBounds { row, rows } => write!(f, "row {row} is out of bounds ({rows} rows)"),
            Self::ColumnOutOfBounds { col, cols } => {
                write!(f, "column {col} is out of bounds ({cols} columns)")
            }
            Self::UnknownVariable(idx) => write!(f, "no variable at column index {idx}"),
            Self::InvalidMissing { column, source } => {
                write!(f, "variable at column {column}: {source}")
            }
            Self::Backend(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidMissing { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure to hand an operation to the queue worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The worker has been dropped; nothing will drain the queue.
    Closed,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "operation queue is closed"),
        }
    }
}

impl std::error::Error for QueueError {}
