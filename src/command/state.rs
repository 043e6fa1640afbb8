// SheetState - Centralized mutable state of a leadsheet
//
// This struct holds everything edits can modify: the item store, the derived
// section index and the sheet size. Undoable edits apply and revert
// `Mutation`s against it; the section index is rebuilt after every batch so it
// is never observed out of sync.

use crate::leadsheet::item::{Item, ItemData, ItemKind, ItemKinds, Section};
use crate::leadsheet::sections::SectionIndex;
use crate::leadsheet::store::ItemStore;
use crate::timeline::Position;
use std::collections::HashSet;

/// Central state of a leadsheet that can be modified by edits
#[derive(Debug, Clone)]
pub struct SheetState {
    pub(crate) store: ItemStore,
    pub(crate) sections: SectionIndex,
    pub(crate) size_in_bars: u32,
}

impl SheetState {
    /// Create a sheet holding only its initial section
    pub fn new(initial_section: Section, size_in_bars: u32) -> Self {
        let mut store = ItemStore::new();
        store.insert(Item::new(
            Position::zero(),
            ItemData::Section(initial_section),
        ));
        Self::from_store(store, size_in_bars)
    }

    /// Wrap an already filled store
    pub fn from_store(store: ItemStore, size_in_bars: u32) -> Self {
        let sections = SectionIndex::build(&store, size_in_bars);
        Self {
            store,
            sections,
            size_in_bars,
        }
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn sections(&self) -> &SectionIndex {
        &self.sections
    }

    pub fn size_in_bars(&self) -> u32 {
        self.size_in_bars
    }

    /// Recompute the derived section index
    pub fn reindex(&mut self) {
        self.sections = SectionIndex::build(&self.store, self.size_in_bars);
    }

    /// Check every document invariant, describing the first violation found
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.size_in_bars == 0 {
            return Err("size_in_bars must be at least 1".into());
        }

        let mut previous_bar: Option<u32> = None;
        let mut names: HashSet<String> = HashSet::new();
        for (handle, item) in self.store.query_range(0, u32::MAX, ItemKinds::SECTION) {
            let Some(section) = item.as_section() else {
                return Err(format!("{} is filtered as a section but is not one", handle));
            };
            if previous_bar.is_none() && item.position != Position::zero() {
                return Err(format!("first section '{}' is not at bar 0", section.name));
            }
            if !item.position.is_first_beat() {
                return Err(format!("section '{}' is not on beat 0", section.name));
            }
            if previous_bar.is_some_and(|bar| bar >= item.position.bar) {
                return Err(format!("two sections share bar {}", item.position.bar));
            }
            if item.position.bar >= self.size_in_bars {
                return Err(format!("section '{}' is beyond the last bar", section.name));
            }
            if section.name.trim().is_empty() {
                return Err("blank section name".into());
            }
            if !section.time_signature.is_valid() {
                return Err(format!(
                    "section '{}' has an invalid time signature {}",
                    section.name, section.time_signature
                ));
            }
            if !names.insert(section.name.to_lowercase()) {
                return Err(format!("duplicate section name '{}'", section.name));
            }
            previous_bar = Some(item.position.bar);
        }
        if previous_bar.is_none() {
            return Err("no initial section".into());
        }

        if SectionIndex::build(&self.store, self.size_in_bars) != self.sections {
            return Err("section index out of sync with the item store".into());
        }

        let mut occupied: HashSet<(ItemKind, Position)> = HashSet::new();
        for (handle, item) in self.store.query_range(0, u32::MAX, ItemKinds::EVENTS) {
            let position = item.position;
            if position.bar >= self.size_in_bars {
                return Err(format!("{} {} is beyond the last bar", handle, item));
            }
            let Some(span) = self.sections.span_of_bar(position.bar) else {
                return Err(format!("{} {} has no owning section", handle, item));
            };
            if !span.time_signature().is_valid_beat(position.beat) {
                return Err(format!(
                    "{} {} has an invalid beat for {}",
                    handle,
                    item,
                    span.time_signature()
                ));
            }
            if let ItemData::TimeSignatureMarker(signature) = &item.data {
                if !signature.is_valid() {
                    return Err(format!("{} has an invalid time signature {}", handle, signature));
                }
            }
            if !item.kind().is_beat_based() && !position.is_first_beat() {
                return Err(format!("{} {} must sit on beat 0", handle, item));
            }
            if !occupied.insert((item.kind(), position)) {
                return Err(format!("two {:?} items at {}", item.kind(), position));
            }
        }
        Ok(())
    }
}

impl PartialEq for SheetState {
    /// Structural equality: same size and same items at the same handles
    fn eq(&self, other: &Self) -> bool {
        self.size_in_bars == other.size_in_bars
            && self.sections == other.sections
            && self.store.iter().eq(other.store.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::TimeSignature;

    fn sheet() -> SheetState {
        SheetState::new(Section::new("Intro", TimeSignature::FOUR_FOUR), 4)
    }

    #[test]
    fn test_new_sheet_is_valid() {
        let state = sheet();
        assert_eq!(state.check_invariants(), Ok(()));
        assert_eq!(state.sections().len(), 1);
        assert_eq!(state.sections().initial().unwrap().end_bar, 3);
    }

    #[test]
    fn test_detects_out_of_bounds_item() {
        let mut state = sheet();
        state
            .store
            .insert(Item::new(Position::at_bar(4), ItemData::chord("C").unwrap()));
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn test_detects_invalid_time_signature() {
        let zero = TimeSignature {
            numerator: 0,
            denominator: 4,
        };
        let state = SheetState::new(Section::new("Intro", zero), 4);
        assert!(state.check_invariants().unwrap_err().contains("invalid time signature"));

        let mut state = sheet();
        state.store.insert(Item::new(
            Position::at_bar(1),
            ItemData::TimeSignatureMarker(zero),
        ));
        assert!(state.check_invariants().is_err());
    }

    #[test]
    fn test_detects_stale_index() {
        let mut state = sheet();
        state.store.insert(Item::new(
            Position::at_bar(2),
            ItemData::Section(Section::new("Verse", TimeSignature::THREE_FOUR)),
        ));
        assert!(state.check_invariants().is_err());
        state.reindex();
        assert_eq!(state.check_invariants(), Ok(()));
    }

    #[test]
    fn test_detects_invalid_beat_and_duplicates() {
        let mut state = sheet();
        state.store.insert(Item::new(
            Position::beats(1, 4, 1),
            ItemData::chord("C").unwrap(),
        ));
        assert!(state.check_invariants().unwrap_err().contains("invalid beat"));

        let mut state = sheet();
        state
            .store
            .insert(Item::new(Position::at_bar(1), ItemData::chord("C").unwrap()));
        state
            .store
            .insert(Item::new(Position::at_bar(1), ItemData::chord("D").unwrap()));
        assert!(state.check_invariants().unwrap_err().contains("two"));
    }
}
