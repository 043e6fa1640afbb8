// EditRequest - data form of every leadsheet operation

use crate::leadsheet::item::ItemData;
use crate::leadsheet::store::ItemHandle;
use crate::timeline::{Position, TimeSignature};
use std::fmt;

/// An edit operation and its arguments
///
/// Used for dry-run authorization, for follow-up edits queued by listeners
/// and by [`Leadsheet::apply`](crate::leadsheet::Leadsheet::apply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRequest {
    AddItem {
        data: ItemData,
        position: Position,
    },
    RemoveItem {
        handle: ItemHandle,
    },
    MoveItem {
        handle: ItemHandle,
        position: Position,
    },
    ChangeItem {
        handle: ItemHandle,
        data: ItemData,
    },
    AddSection {
        name: String,
        time_signature: TimeSignature,
        bar: u32,
    },
    RemoveSection {
        handle: ItemHandle,
    },
    MoveSection {
        handle: ItemHandle,
        bar: u32,
    },
    RenameSection {
        handle: ItemHandle,
        name: String,
    },
    SetSectionTimeSignature {
        handle: ItemHandle,
        time_signature: TimeSignature,
    },
    InsertBars {
        at_bar: u32,
        count: u32,
    },
    DeleteBars {
        from: u32,
        to: u32,
    },
    SetSize {
        size_in_bars: u32,
    },
}

impl fmt::Display for EditRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditRequest::AddItem { data, position } => write!(f, "add {} at {}", data, position),
            EditRequest::RemoveItem { handle } => write!(f, "remove {}", handle),
            EditRequest::MoveItem { handle, position } => {
                write!(f, "move {} to {}", handle, position)
            }
            EditRequest::ChangeItem { handle, data } => write!(f, "change {} to {}", handle, data),
            EditRequest::AddSection {
                name,
                time_signature,
                bar,
            } => write!(f, "add section {} ({}) at bar {}", name, time_signature, bar),
            EditRequest::RemoveSection { handle } => write!(f, "remove section {}", handle),
            EditRequest::MoveSection { handle, bar } => {
                write!(f, "move section {} to bar {}", handle, bar)
            }
            EditRequest::RenameSection { handle, name } => {
                write!(f, "rename section {} to {}", handle, name)
            }
            EditRequest::SetSectionTimeSignature {
                handle,
                time_signature,
            } => write!(f, "set time signature of {} to {}", handle, time_signature),
            EditRequest::InsertBars { at_bar, count } => {
                write!(f, "insert {} bar(s) at bar {}", count, at_bar)
            }
            EditRequest::DeleteBars { from, to } => write!(f, "delete bars {} to {}", from, to),
            EditRequest::SetSize { size_in_bars } => write!(f, "set size to {}", size_in_bars),
        }
    }
}
