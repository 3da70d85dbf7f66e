pub mod cell;
pub mod context_menu;
pub mod error;
pub mod events;
pub mod grid;
pub mod inference;
pub mod memory;
pub mod missing;
pub mod operation;
pub mod queue;
pub mod reconcile;
pub mod store;
pub mod structure;
pub mod table;
pub mod validation;
pub mod variable;
