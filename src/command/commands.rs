// Concrete edit implementation

use crate::command::mutation::{Mutation, ensure_not_empty};
use crate::command::state::SheetState;
use crate::command::trait_def::UndoableEdit;
use crate::error::Result;
use crate::events::Change;

/// Edit made of an ordered batch of mutations
///
/// This is what every leadsheet operation records: the planner produces the
/// mutations and the change descriptor, the edit replays them forward on
/// execute/redo and backward on undo.
#[derive(Debug, Clone)]
pub struct SheetEdit {
    mutations: Vec<Mutation>,
    change: Change,
}

impl SheetEdit {
    /// Create a new SheetEdit
    ///
    /// # Errors
    /// Fails when `mutations` is empty: no-op operations are never recorded.
    pub fn new(mutations: Vec<Mutation>, change: Change) -> Result<Self> {
        ensure_not_empty(&mutations)?;
        Ok(Self { mutations, change })
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }
}

impl UndoableEdit for SheetEdit {
    fn execute(&mut self, state: &mut SheetState) -> Result<()> {
        state.apply_all(&self.mutations)
    }

    fn undo(&mut self, state: &mut SheetState) -> Result<()> {
        state.revert_all(&self.mutations)
    }

    fn description(&self) -> String {
        self.change.description()
    }

    fn change(&self) -> &Change {
        &self.change
    }
}
