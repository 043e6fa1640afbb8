// UndoableEdit trait definition

use crate::command::state::SheetState;
use crate::error::Result;
use crate::events::Change;

/// Trait for edits that support undo/redo
///
/// Every committed leadsheet operation is recorded as exactly one undoable
/// edit, however many low-level mutations it is made of.
///
/// # Thread Safety
/// Edits must be Send as the owning leadsheet may be moved between threads.
///
/// # Example
/// ```no_run
/// use leadsheet::command::{SheetState, UndoableEdit};
/// use leadsheet::error::Result;
/// use leadsheet::events::Change;
///
/// struct ResizeEdit {
///     new_size: u32,
///     old_size: Option<u32>,
///     change: Change,
/// }
///
/// impl UndoableEdit for ResizeEdit {
///     fn execute(&mut self, state: &mut SheetState) -> Result<()> {
///         // Mutate the state, remembering what is needed to revert it
///         Ok(())
///     }
///
///     fn undo(&mut self, state: &mut SheetState) -> Result<()> {
///         Ok(())
///     }
///
///     fn description(&self) -> String {
///         format!("Set size to {} bars", self.new_size)
///     }
///
///     fn change(&self) -> &Change {
///         &self.change
///     }
/// }
/// ```
pub trait UndoableEdit: Send {
    /// Apply the edit
    ///
    /// Called once when the operation commits and again on every redo.
    fn execute(&mut self, state: &mut SheetState) -> Result<()>;

    /// Revert the edit
    ///
    /// Restores the state to what it was before execute() was called,
    /// including the handles of removed items.
    fn undo(&mut self, state: &mut SheetState) -> Result<()>;

    /// Get a human-readable description of the edit
    ///
    /// Used for UI display (e.g., "Undo: Add section Verse at bar 4")
    fn description(&self) -> String;

    /// Descriptor of the committed change, replayed to listeners on undo/redo
    fn change(&self) -> &Change;
}
