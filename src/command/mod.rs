// Command Pattern for Undo/Redo functionality
//
// Every state-changing leadsheet operation goes through an UndoableEdit.
//
// Architecture:
// - Mutation: smallest reversible step (insert, remove, move, replace, resize)
// - SheetState: item store + derived section index + size, what mutations modify
// - UndoableEdit trait: execute(), undo(), description(), change()
// - SheetEdit: an ordered batch of mutations plus its change descriptor
// - UndoManager: undo/redo stacks with a bounded history
//
// Undo replays the inverse mutations in reverse order, so removed items come
// back under their original handles.

pub mod commands;
pub mod manager;
pub mod mutation;
pub mod state;
pub mod trait_def;

pub use commands::SheetEdit;
pub use manager::{DEFAULT_MAX_HISTORY, UndoManager};
pub use mutation::Mutation;
pub use state::SheetState;
pub use trait_def::UndoableEdit;
