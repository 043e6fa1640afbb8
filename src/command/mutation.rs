// Mutation - smallest reversible change applied to a SheetState

use crate::command::state::SheetState;
use crate::error::{LeadsheetError, Result};
use crate::leadsheet::item::{Item, ItemData};
use crate::leadsheet::store::ItemHandle;
use crate::timeline::Position;

/// One low-level step of an edit
///
/// Each variant carries both sides of the change so that it can be applied
/// and reverted without looking anything up.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Insert {
        handle: ItemHandle,
        item: Item,
        seq: u64,
    },
    Remove {
        handle: ItemHandle,
        item: Item,
        seq: u64,
    },
    Move {
        handle: ItemHandle,
        from: Position,
        to: Position,
    },
    Replace {
        handle: ItemHandle,
        old: ItemData,
        new: ItemData,
    },
    Resize {
        from: u32,
        to: u32,
    },
}

impl Mutation {
    /// Apply the mutation forward
    pub fn apply(&self, state: &mut SheetState) -> Result<()> {
        tracing::trace!(mutation = ?self, "apply");
        match self {
            Mutation::Insert { handle, item, seq } => {
                state.store.restore(*handle, item.clone(), *seq)
            }
            Mutation::Remove { handle, .. } => state.store.remove(*handle).map(|_| ()),
            Mutation::Move { handle, to, .. } => state.store.move_to(*handle, *to).map(|_| ()),
            Mutation::Replace { handle, new, .. } => {
                state.store.replace(*handle, new.clone()).map(|_| ())
            }
            Mutation::Resize { to, .. } => {
                state.size_in_bars = *to;
                Ok(())
            }
        }
    }

    /// Apply the inverse of the mutation
    pub fn revert(&self, state: &mut SheetState) -> Result<()> {
        tracing::trace!(mutation = ?self, "revert");
        match self {
            Mutation::Insert { handle, .. } => state.store.remove(*handle).map(|_| ()),
            Mutation::Remove { handle, item, seq } => {
                state.store.restore(*handle, item.clone(), *seq)
            }
            Mutation::Move { handle, from, .. } => {
                state.store.move_to(*handle, *from).map(|_| ())
            }
            Mutation::Replace { handle, old, .. } => {
                state.store.replace(*handle, old.clone()).map(|_| ())
            }
            Mutation::Resize { from, .. } => {
                state.size_in_bars = *from;
                Ok(())
            }
        }
    }
}

impl SheetState {
    /// Apply a batch of mutations in order, then rebuild the section index.
    ///
    /// The batch is all or nothing: when one mutation fails, the ones already
    /// applied are reverted before the error is returned.
    pub fn apply_all(&mut self, mutations: &[Mutation]) -> Result<()> {
        for (applied, mutation) in mutations.iter().enumerate() {
            if let Err(error) = mutation.apply(self) {
                tracing::warn!(%error, applied, "mutation batch failed, rolling back");
                for done in mutations[..applied].iter().rev() {
                    if let Err(rollback) = done.revert(self) {
                        tracing::error!(error = %rollback, mutation = ?done, "rollback failed");
                    }
                }
                self.reindex();
                return Err(error);
            }
        }
        self.reindex();
        Ok(())
    }

    /// Revert a batch of mutations in reverse order, then rebuild the section index.
    ///
    /// Like [`SheetState::apply_all`], a failure puts back what was already reverted.
    pub fn revert_all(&mut self, mutations: &[Mutation]) -> Result<()> {
        for (index, mutation) in mutations.iter().enumerate().rev() {
            if let Err(error) = mutation.revert(self) {
                tracing::warn!(%error, failed_at = index, "revert batch failed, rolling back");
                for done in &mutations[index + 1..] {
                    if let Err(rollback) = done.apply(self) {
                        tracing::error!(error = %rollback, mutation = ?done, "rollback failed");
                    }
                }
                self.reindex();
                return Err(error);
            }
        }
        self.reindex();
        Ok(())
    }
}

/// Mutations that would leave the sheet unchanged are rejected when recorded
pub(crate) fn ensure_not_empty(mutations: &[Mutation]) -> Result<()> {
    if mutations.is_empty() {
        return Err(LeadsheetError::InvalidArgument(
            "an edit needs at least one mutation".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leadsheet::item::Section;
    use crate::timeline::TimeSignature;

    fn sheet() -> SheetState {
        SheetState::new(Section::new("A", TimeSignature::FOUR_FOUR), 4)
    }

    #[test]
    fn test_apply_and_revert_batch() {
        let mut state = sheet();
        let before = state.clone();
        let handle = state.store.next_handle();
        let seq = state.store.next_seq();
        let chord = Item::new(Position::at_bar(1), ItemData::chord("G7").unwrap());
        let mutations = vec![
            Mutation::Insert {
                handle,
                item: chord.clone(),
                seq,
            },
            Mutation::Move {
                handle,
                from: Position::at_bar(1),
                to: Position::beats(5, 2, 1),
            },
            Mutation::Resize { from: 4, to: 6 },
            Mutation::Replace {
                handle,
                old: chord.data.clone(),
                new: ItemData::chord("G9").unwrap(),
            },
        ];

        state.apply_all(&mutations).unwrap();
        assert_eq!(state.size_in_bars(), 6);
        let item = state.store().get(handle).unwrap();
        assert_eq!(item.position, Position::beats(5, 2, 1));
        assert_eq!(item.data.to_string(), "G9");
        assert_eq!(state.check_invariants(), Ok(()));

        state.revert_all(&mutations).unwrap();
        assert!(state == before);
        assert!(state.store().get(handle).is_none());

        // Redo brings back the very same handle
        state.apply_all(&mutations).unwrap();
        assert!(state.store().contains(handle));
    }

    #[test]
    fn test_remove_reverts_to_same_handle() {
        let mut state = sheet();
        let handle = state
            .store
            .insert(Item::new(Position::at_bar(2), ItemData::annotation("coda")));
        let (item, seq) = (state.store.get(handle).unwrap().clone(), 1);
        let removal = Mutation::Remove { handle, item, seq };
        removal.apply(&mut state).unwrap();
        assert!(!state.store().contains(handle));
        removal.revert(&mut state).unwrap();
        assert!(state.store().contains(handle));
    }

    #[test]
    fn test_failed_batch_is_rolled_back() {
        let mut state = sheet();
        let before = state.clone();
        let missing = state.store.next_handle();
        let mutations = vec![
            Mutation::Resize { from: 4, to: 6 },
            Mutation::Move {
                handle: missing,
                from: Position::at_bar(1),
                to: Position::at_bar(2),
            },
        ];

        assert_eq!(
            state.apply_all(&mutations),
            Err(LeadsheetError::StaleHandle(missing))
        );
        assert_eq!(state.size_in_bars(), 4);
        assert!(state == before);
        assert_eq!(state.check_invariants(), Ok(()));
    }

    #[test]
    fn test_failed_revert_is_rolled_back() {
        let mut state = sheet();
        let handle = state
            .store
            .insert(Item::new(Position::at_bar(1), ItemData::chord("C").unwrap()));
        let missing = state.store.next_handle();
        let mutations = vec![
            Mutation::Move {
                handle: missing,
                from: Position::at_bar(0),
                to: Position::at_bar(1),
            },
            Mutation::Move {
                handle,
                from: Position::at_bar(2),
                to: Position::at_bar(1),
            },
            Mutation::Resize { from: 3, to: 4 },
        ];
        let before = state.clone();

        assert_eq!(
            state.revert_all(&mutations),
            Err(LeadsheetError::StaleHandle(missing))
        );
        assert!(state == before);
        assert_eq!(state.store().get(handle).unwrap().position, Position::at_bar(1));
        assert_eq!(state.check_invariants(), Ok(()));
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(ensure_not_empty(&[]).is_err());
        assert!(ensure_not_empty(&[Mutation::Resize { from: 1, to: 2 }]).is_ok());
    }
}
