// ItemStore - arena of leadsheet items ordered by position
//
// Items live in generation-checked slots. Callers only ever hold an
// `ItemHandle`; once an item is removed its handle stops resolving, even if
// the slot is reused by a later insertion.

use crate::error::{LeadsheetError, Result};
use crate::leadsheet::item::{Item, ItemData, ItemKinds};
use crate::timeline::Position;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

/// Opaque reference to an item of a leadsheet
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ItemHandle {
    index: u32,
    generation: u32,
}

impl ItemHandle {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    item: Item,
    seq: u64,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    /// Highest generation ever handed out for this slot
    max_generation: u32,
    entry: Option<Entry>,
}

/// Ordering key: position first, insertion order for ties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OrderKey {
    position: Position,
    seq: u64,
}

/// Ordered container of positioned items
///
/// The store does not enforce any musical rule (bounds, duplicates, sections):
/// those are checked by the leadsheet before it mutates the store.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: BTreeMap<OrderKey, ItemHandle>,
    next_seq: u64,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live items
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Handle the next call to [`ItemStore::insert`] will return
    pub fn next_handle(&self) -> ItemHandle {
        match self.free.last() {
            Some(&index) => ItemHandle {
                index,
                generation: self.slots[index as usize].max_generation + 1,
            },
            None => ItemHandle {
                index: self.slots.len() as u32,
                generation: 1,
            },
        }
    }

    /// Insertion sequence number the next inserted item will get
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Insert an item, returning its new handle
    pub fn insert(&mut self, item: Item) -> ItemHandle {
        let handle = self.next_handle();
        let seq = self.next_seq;
        self.place(handle, item, seq);
        handle
    }

    /// Put an item back under a handle it owned before (undo/redo of a removal or an insertion).
    ///
    /// The slot must be free. The item keeps its original insertion sequence so
    /// ties keep their original order.
    pub fn restore(&mut self, handle: ItemHandle, item: Item, seq: u64) -> Result<()> {
        let index = handle.index as usize;
        if let Some(slot) = self.slots.get(index) {
            if slot.entry.is_some() {
                return Err(LeadsheetError::InvalidArgument(format!(
                    "slot of {} is already in use",
                    handle
                )));
            }
        }
        self.place(handle, item, seq);
        Ok(())
    }

    fn place(&mut self, handle: ItemHandle, item: Item, seq: u64) {
        let index = handle.index as usize;
        while self.slots.len() <= index {
            self.free.insert(0, self.slots.len() as u32);
            self.slots.push(Slot::default());
        }
        self.free.retain(|&i| i != handle.index);

        let slot = &mut self.slots[index];
        slot.generation = handle.generation;
        slot.max_generation = slot.max_generation.max(handle.generation);
        self.order.insert(
            OrderKey {
                position: item.position,
                seq,
            },
            handle,
        );
        slot.entry = Some(Entry { item, seq });
        self.next_seq = self.next_seq.max(seq + 1);
    }

    fn entry(&self, handle: ItemHandle) -> Option<&Entry> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, handle: ItemHandle) -> Result<&mut Entry> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(LeadsheetError::StaleHandle(handle))
    }

    /// Resolve a handle, `None` when it is stale
    pub fn get(&self, handle: ItemHandle) -> Option<&Item> {
        self.entry(handle).map(|entry| &entry.item)
    }

    /// Resolve a handle or fail with [`LeadsheetError::StaleHandle`]
    pub fn resolve(&self, handle: ItemHandle) -> Result<&Item> {
        self.get(handle).ok_or(LeadsheetError::StaleHandle(handle))
    }

    pub fn contains(&self, handle: ItemHandle) -> bool {
        self.entry(handle).is_some()
    }

    /// Insertion sequence number of a live item
    pub fn seq_of(&self, handle: ItemHandle) -> Result<u64> {
        self.entry(handle)
            .map(|entry| entry.seq)
            .ok_or(LeadsheetError::StaleHandle(handle))
    }

    /// Remove an item, returning it with its insertion sequence number
    pub fn remove(&mut self, handle: ItemHandle) -> Result<(Item, u64)> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.entry.is_some())
            .ok_or(LeadsheetError::StaleHandle(handle))?;
        let Some(entry) = slot.entry.take() else {
            return Err(LeadsheetError::StaleHandle(handle));
        };
        self.order.remove(&OrderKey {
            position: entry.item.position,
            seq: entry.seq,
        });
        self.free.push(handle.index);
        Ok((entry.item, entry.seq))
    }

    /// Move an item, returning its previous position
    pub fn move_to(&mut self, handle: ItemHandle, position: Position) -> Result<Position> {
        let entry = self.entry_mut(handle)?;
        let old = entry.item.position;
        let seq = entry.seq;
        entry.item.position = position;
        self.order.remove(&OrderKey { position: old, seq });
        self.order.insert(OrderKey { position, seq }, handle);
        Ok(old)
    }

    /// Replace the payload of an item, returning the previous one
    pub fn replace(&mut self, handle: ItemHandle, data: ItemData) -> Result<ItemData> {
        let entry = self.entry_mut(handle)?;
        Ok(std::mem::replace(&mut entry.item.data, data))
    }

    /// All items in position order
    pub fn iter(&self) -> impl Iterator<Item = (ItemHandle, &Item)> + Clone + '_ {
        self.order.values().filter_map(move |&h| self.get(h).map(|item| (h, item)))
    }

    /// Items whose bar lies in `bar_from..=bar_to`, filtered by kind, in position order.
    ///
    /// The returned iterator is lazy and can be cloned to restart the traversal.
    pub fn query_range(
        &self,
        bar_from: u32,
        bar_to: u32,
        kinds: ItemKinds,
    ) -> impl Iterator<Item = (ItemHandle, &Item)> + Clone + '_ {
        let lower = OrderKey {
            position: Position::at_bar(bar_from),
            seq: 0,
        };
        let upper = if bar_from > bar_to {
            Bound::Excluded(lower)
        } else {
            match bar_to.checked_add(1) {
                Some(next) => Bound::Excluded(OrderKey {
                    position: Position::at_bar(next),
                    seq: 0,
                }),
                None => Bound::Unbounded,
            }
        };
        let range = self.order.range((Bound::Included(lower), upper));
        range.filter_map(move |(_, &h)| {
            self.get(h)
                .filter(|item| kinds.matches(item.kind()))
                .map(|item| (h, item))
        })
    }

    /// Items of the given kinds sitting exactly at `position`
    pub fn items_at(
        &self,
        position: Position,
        kinds: ItemKinds,
    ) -> impl Iterator<Item = (ItemHandle, &Item)> + '_ {
        self.query_range(position.bar, position.bar, kinds)
            .filter(move |(_, item)| item.position == position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leadsheet::item::{ItemData, ItemKind, Section};
    use crate::timeline::TimeSignature;

    fn chord(bar: u32, text: &str) -> Item {
        Item::new(Position::at_bar(bar), ItemData::chord(text).unwrap())
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = ItemStore::new();
        let h = store.insert(chord(2, "C7"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(h).unwrap().position, Position::at_bar(2));
    }

    #[test]
    fn test_stale_handle_after_removal() {
        let mut store = ItemStore::new();
        let h = store.insert(chord(0, "C"));
        store.remove(h).unwrap();
        assert!(store.get(h).is_none());
        assert_eq!(store.remove(h), Err(LeadsheetError::StaleHandle(h)));

        // Slot reuse must not revive the old handle
        let h2 = store.insert(chord(1, "D"));
        assert_eq!(h2.index(), h.index());
        assert_ne!(h2.generation(), h.generation());
        assert!(store.get(h).is_none());
        assert!(store.get(h2).is_some());
    }

    #[test]
    fn test_restore_keeps_handle_and_order() {
        let mut store = ItemStore::new();
        let a = store.insert(chord(1, "A"));
        let b = store.insert(chord(1, "B"));
        let (item, seq) = store.remove(a).unwrap();
        store.restore(a, item, seq).unwrap();

        let order: Vec<_> = store.iter().map(|(h, _)| h).collect();
        assert_eq!(order, vec![a, b]);
        assert!(store.restore(a, chord(3, "E"), 99).is_err());
    }

    #[test]
    fn test_restore_after_slot_reuse_undone() {
        let mut store = ItemStore::new();
        let a = store.insert(chord(0, "A"));
        let (item_a, seq_a) = store.remove(a).unwrap();
        let b = store.insert(chord(0, "B"));
        // Undo the insertion of b, then the removal of a
        let (item_b, seq_b) = store.remove(b).unwrap();
        store.restore(a, item_a, seq_a).unwrap();
        assert!(store.get(b).is_none());
        assert_eq!(store.get(a).unwrap().data.as_chord().unwrap().to_string(), "A");
        // Redo
        store.remove(a).unwrap();
        store.restore(b, item_b, seq_b).unwrap();
        assert!(store.get(a).is_none());
        // A fresh insertion gets a generation never handed out before
        store.remove(b).unwrap();
        let c = store.insert(chord(0, "C"));
        assert!(c.generation() > b.generation());
    }

    #[test]
    fn test_move_keeps_insertion_order_for_ties() {
        let mut store = ItemStore::new();
        let a = store.insert(chord(3, "A"));
        let b = store.insert(chord(1, "B"));
        store.move_to(b, Position::at_bar(3)).unwrap();
        let at3: Vec<_> = store.query_range(3, 3, ItemKinds::all()).map(|(h, _)| h).collect();
        assert_eq!(at3, vec![a, b]);
    }

    #[test]
    fn test_query_range_filters_and_restarts() {
        let mut store = ItemStore::new();
        store.insert(Item::new(
            Position::at_bar(0),
            ItemData::Section(Section::new("A", TimeSignature::FOUR_FOUR)),
        ));
        store.insert(chord(0, "C"));
        store.insert(chord(2, "F"));
        store.insert(chord(5, "G"));
        store.insert(Item::new(Position::beats(2, 1, 2), ItemData::annotation("fill")));

        let query = store.query_range(0, 2, ItemKinds::CHORD_SYMBOL);
        let first: Vec<_> = query.clone().map(|(_, i)| i.to_string()).collect();
        let second: Vec<_> = query.map(|(_, i)| i.to_string()).collect();
        assert_eq!(first, vec!["C[0:0]", "F[2:0]"]);
        assert_eq!(first, second);

        let kinds: Vec<_> = store.query_range(0, 10, ItemKinds::all()).map(|(_, i)| i.kind()).collect();
        assert_eq!(kinds[0], ItemKind::Section);
        assert_eq!(kinds.len(), 5);

        assert_eq!(store.query_range(3, 1, ItemKinds::all()).count(), 0);
        assert_eq!(store.query_range(0, u32::MAX, ItemKinds::all()).count(), 5);
    }

    #[test]
    fn test_replace_payload() {
        let mut store = ItemStore::new();
        let h = store.insert(chord(0, "C"));
        let old = store.replace(h, ItemData::chord("Cm").unwrap()).unwrap();
        assert_eq!(old, ItemData::chord("C").unwrap());
        assert_eq!(store.get(h).unwrap().data, ItemData::chord("Cm").unwrap());
    }
}
