// Change descriptors - what an edit does, in a form listeners can match on

use crate::leadsheet::item::{Item, ItemData, ItemKind, Section};
use crate::leadsheet::sections::SectionSpan;
use crate::leadsheet::store::ItemHandle;
use crate::timeline::{Position, TimeSignature};
use std::fmt;

/// Side effect of an edit on an item it did not target directly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjustment {
    /// Beat snapped to the grid of the section now owning the item
    Requantized {
        handle: ItemHandle,
        kind: ItemKind,
        from: Position,
        to: Position,
    },
    /// Item removed because its snapped position was already taken
    Dropped { handle: ItemHandle, item: Item },
}

impl Adjustment {
    pub fn handle(&self) -> ItemHandle {
        match self {
            Adjustment::Requantized { handle, .. } | Adjustment::Dropped { handle, .. } => *handle,
        }
    }
}

/// Section layout before and after an edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutChange {
    pub before: Vec<SectionSpan>,
    pub after: Vec<SectionSpan>,
}

impl LayoutChange {
    pub fn new(before: Vec<SectionSpan>, after: Vec<SectionSpan>) -> Self {
        Self { before, after }
    }

    pub fn is_unchanged(&self) -> bool {
        self.before == self.after
    }
}

/// Whether a section move crosses other sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionMoveKind {
    /// Only the ranges of the two neighbouring sections change
    Small,
    /// The section is taken out and re-inserted past at least one other section
    Big,
}

/// Descriptor of one leadsheet operation
///
/// The same value is delivered to vetoable listeners before the edit is
/// applied and to change listeners once it is committed. It carries enough
/// before/after data for a listener to simulate the edit on its own model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    ItemAdded {
        handle: ItemHandle,
        item: Item,
    },
    ItemRemoved {
        handle: ItemHandle,
        item: Item,
    },
    ItemMoved {
        handle: ItemHandle,
        kind: ItemKind,
        from: Position,
        to: Position,
    },
    ItemChanged {
        handle: ItemHandle,
        position: Position,
        old: ItemData,
        new: ItemData,
    },
    SectionAdded {
        handle: ItemHandle,
        section: Section,
        bar: u32,
        adjustments: Vec<Adjustment>,
        layout: LayoutChange,
    },
    SectionRemoved {
        handle: ItemHandle,
        section: Section,
        bar: u32,
        adjustments: Vec<Adjustment>,
        layout: LayoutChange,
    },
    SectionMoved {
        handle: ItemHandle,
        section: Section,
        from_bar: u32,
        to_bar: u32,
        kind: SectionMoveKind,
        adjustments: Vec<Adjustment>,
        layout: LayoutChange,
    },
    SectionRenamed {
        handle: ItemHandle,
        old_name: String,
        new_name: String,
    },
    SectionTimeSignatureChanged {
        handle: ItemHandle,
        name: String,
        old: TimeSignature,
        new: TimeSignature,
        adjustments: Vec<Adjustment>,
        layout: LayoutChange,
    },
    BarsInserted {
        at_bar: u32,
        count: u32,
        /// Section created to keep bar 0 covered when inserting before the first bar
        new_initial_section: Option<ItemHandle>,
        layout: LayoutChange,
    },
    BarsDeleted {
        from: u32,
        to: u32,
        removed: Vec<(ItemHandle, Item)>,
        adjustments: Vec<Adjustment>,
        layout: LayoutChange,
    },
    SizeChanged {
        old_size: u32,
        new_size: u32,
        removed: Vec<(ItemHandle, Item)>,
        adjustments: Vec<Adjustment>,
        layout: LayoutChange,
    },
}

impl Change {
    /// Human-readable summary, used as the undo entry description
    pub fn description(&self) -> String {
        match self {
            Change::ItemAdded { item, .. } => format!("Add {}", item),
            Change::ItemRemoved { item, .. } => format!("Remove {}", item),
            Change::ItemMoved { kind, from, to, .. } => {
                format!("Move {:?} from {} to {}", kind, from, to)
            }
            Change::ItemChanged { old, new, .. } => format!("Change {} to {}", old, new),
            Change::SectionAdded { section, bar, .. } => {
                format!("Add section {} at bar {}", section.name, bar)
            }
            Change::SectionRemoved { section, .. } => format!("Remove section {}", section.name),
            Change::SectionMoved {
                section, to_bar, ..
            } => format!("Move section {} to bar {}", section.name, to_bar),
            Change::SectionRenamed {
                old_name, new_name, ..
            } => format!("Rename section {} to {}", old_name, new_name),
            Change::SectionTimeSignatureChanged { name, new, .. } => {
                format!("Set time signature of {} to {}", name, new)
            }
            Change::BarsInserted { at_bar, count, .. } => {
                format!("Insert {} bar(s) at bar {}", count, at_bar)
            }
            Change::BarsDeleted { from, to, .. } => format!("Delete bars {} to {}", from, to),
            Change::SizeChanged { new_size, .. } => format!("Set size to {} bars", new_size),
        }
    }

    /// Section layout transition, for changes that may alter it
    pub fn layout(&self) -> Option<&LayoutChange> {
        match self {
            Change::SectionAdded { layout, .. }
            | Change::SectionRemoved { layout, .. }
            | Change::SectionMoved { layout, .. }
            | Change::SectionTimeSignatureChanged { layout, .. }
            | Change::BarsInserted { layout, .. }
            | Change::BarsDeleted { layout, .. }
            | Change::SizeChanged { layout, .. } => Some(layout),
            _ => None,
        }
    }

    /// Items relocated or dropped as a side effect
    pub fn adjustments(&self) -> &[Adjustment] {
        match self {
            Change::SectionAdded { adjustments, .. }
            | Change::SectionRemoved { adjustments, .. }
            | Change::SectionMoved { adjustments, .. }
            | Change::SectionTimeSignatureChanged { adjustments, .. }
            | Change::BarsDeleted { adjustments, .. }
            | Change::SizeChanged { adjustments, .. } => adjustments,
            _ => &[],
        }
    }

    /// True for changes made of several steps that listeners see bracketed by
    /// `change_started` and `change_completed`: inserting bars before bar 0,
    /// which shifts the old initial section and pins a new one.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Change::BarsInserted {
                new_initial_section: Some(_),
                ..
            }
        )
    }

    /// Items removed because their bars were deleted
    pub fn removed_items(&self) -> &[(ItemHandle, Item)] {
        match self {
            Change::BarsDeleted { removed, .. } | Change::SizeChanged { removed, .. } => removed,
            _ => &[],
        }
    }

    /// Handle of the item the operation targeted, if it targeted one
    pub fn target(&self) -> Option<ItemHandle> {
        match self {
            Change::ItemAdded { handle, .. }
            | Change::ItemRemoved { handle, .. }
            | Change::ItemMoved { handle, .. }
            | Change::ItemChanged { handle, .. }
            | Change::SectionAdded { handle, .. }
            | Change::SectionRemoved { handle, .. }
            | Change::SectionMoved { handle, .. }
            | Change::SectionRenamed { handle, .. }
            | Change::SectionTimeSignatureChanged { handle, .. } => Some(*handle),
            Change::BarsInserted {
                new_initial_section,
                ..
            } => *new_initial_section,
            Change::BarsDeleted { .. } | Change::SizeChanged { .. } => None,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Why a committed change is being broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// A fresh operation
    Edit,
    /// The change was reverted by undo
    Undo,
    /// The change was re-applied by redo
    Redo,
}

/// Committed-phase notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub change: Change,
    pub origin: ChangeOrigin,
}

impl ChangeEvent {
    pub fn new(change: Change, origin: ChangeOrigin) -> Self {
        Self { change, origin }
    }

    /// True while undo or redo replays history.
    ///
    /// Listeners that keep their own undo log must not record anything for
    /// replayed events.
    pub fn is_replay(&self) -> bool {
        self.origin != ChangeOrigin::Edit
    }

    /// Section layout in effect once this event has been applied
    pub fn resulting_layout(&self) -> Option<&[SectionSpan]> {
        self.change.layout().map(|layout| match self.origin {
            ChangeOrigin::Undo => layout.before.as_slice(),
            ChangeOrigin::Edit | ChangeOrigin::Redo => layout.after.as_slice(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leadsheet::store::ItemStore;

    fn span(handle: ItemHandle, name: &str, start_bar: u32, end_bar: u32) -> SectionSpan {
        SectionSpan {
            handle,
            section: Section::new(name, TimeSignature::FOUR_FOUR),
            start_bar,
            end_bar,
        }
    }

    #[test]
    fn test_descriptions() {
        let handle = ItemStore::new().next_handle();
        let added = Change::ItemAdded {
            handle,
            item: Item::new(Position::at_bar(1), ItemData::chord("F#7").unwrap()),
        };
        assert_eq!(added.description(), "Add F#7[1:0]");
        assert_eq!(added.target(), Some(handle));
        assert!(added.layout().is_none());

        let inserted = Change::BarsInserted {
            at_bar: 0,
            count: 3,
            new_initial_section: None,
            layout: LayoutChange::default(),
        };
        assert_eq!(inserted.to_string(), "Insert 3 bar(s) at bar 0");
        assert!(inserted.adjustments().is_empty());
    }

    #[test]
    fn test_resulting_layout_follows_origin() {
        let handle = ItemStore::new().next_handle();
        let change = Change::SectionRemoved {
            handle,
            section: Section::new("B", TimeSignature::FOUR_FOUR),
            bar: 2,
            adjustments: Vec::new(),
            layout: LayoutChange::new(
                vec![span(handle, "A", 0, 1), span(handle, "B", 2, 3)],
                vec![span(handle, "A", 0, 3)],
            ),
        };

        let edit = ChangeEvent::new(change.clone(), ChangeOrigin::Edit);
        assert!(!edit.is_replay());
        assert_eq!(edit.resulting_layout().unwrap().len(), 1);

        let undo = ChangeEvent::new(change, ChangeOrigin::Undo);
        assert!(undo.is_replay());
        assert_eq!(undo.resulting_layout().unwrap().len(), 2);
    }
}
