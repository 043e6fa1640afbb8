// UndoManager - Manages undo/redo stacks

use crate::command::state::SheetState;
use crate::command::trait_def::UndoableEdit;
use crate::error::{LeadsheetError, Result};
use crate::events::Change;
use std::collections::VecDeque;

/// Default maximum number of edits to keep in history
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Undo log of a leadsheet
///
/// Every committed operation is one entry, however many items it touched.
/// Undone entries wait on the redo stack until the next new edit discards
/// them. Only the newest `max_history` entries are kept.
pub struct UndoManager {
    /// Stack of edits that can be undone (most recent at the back)
    undo_stack: VecDeque<Box<dyn UndoableEdit>>,

    /// Stack of edits that can be redone (most recent at the back)
    redo_stack: VecDeque<Box<dyn UndoableEdit>>,

    /// Maximum number of edits to keep in history
    max_history: usize,
}

impl UndoManager {
    /// Create a new UndoManager with default settings
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_HISTORY)
    }

    /// Create a new UndoManager with a custom history limit
    pub fn with_capacity(max_history: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_history),
            redo_stack: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Run an edit against the state and record it.
    ///
    /// A failed edit leaves both stacks untouched, and the edits recorded by
    /// the leadsheet roll their own partial changes back before failing.
    pub fn execute(&mut self, mut edit: Box<dyn UndoableEdit>, state: &mut SheetState) -> Result<()> {
        edit.execute(state)?;

        self.undo_stack.push_back(edit);
        self.redo_stack.clear();

        if self.undo_stack.len() > self.max_history {
            self.undo_stack.pop_front();
        }

        Ok(())
    }

    /// Revert the newest edit and return the change it had made
    ///
    /// # Errors
    /// `NothingToUndo` on an empty log, or the error of the revert itself,
    /// in which case the edit stays on the undo stack.
    pub fn undo(&mut self, state: &mut SheetState) -> Result<Change> {
        let mut edit = self.undo_stack.pop_back().ok_or(LeadsheetError::NothingToUndo)?;

        if let Err(error) = edit.undo(state) {
            self.undo_stack.push_back(edit);
            return Err(error);
        }
        let change = edit.change().clone();

        self.redo_stack.push_back(edit);

        Ok(change)
    }

    /// Re-apply the most recently undone edit
    pub fn redo(&mut self, state: &mut SheetState) -> Result<Change> {
        let mut edit = self.redo_stack.pop_back().ok_or(LeadsheetError::NothingToRedo)?;

        if let Err(error) = edit.execute(state) {
            self.redo_stack.push_back(edit);
            return Err(error);
        }
        let change = edit.change().clone();

        self.undo_stack.push_back(edit);

        Ok(change)
    }

    /// Check if there are edits that can be undone
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if there are edits that can be redone
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get a description of the edit that would be undone
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|edit| edit.description())
    }

    /// Get a description of the edit that would be redone
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.back().map(|edit| edit.description())
    }

    /// Clear all edit history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Get the number of edits in the undo stack
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of edits in the redo stack
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UndoManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoManager")
            .field("undo_count", &self.undo_count())
            .field("redo_count", &self.redo_count())
            .field("max_history", &self.max_history)
            .finish()
    }
}
