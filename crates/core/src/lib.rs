//! `statgrid-core`: grid selection primitives shared by the engine and CLI.

pub mod selection;

pub use selection::{Range, Selection};
