// Types for leadsheet persistence

use serde::{Deserialize, Serialize};

use crate::leadsheet::item::Item;

/// Snapshot format version
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotVersion {
    pub major: u32,
    pub minor: u32,
}

impl SnapshotVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn current() -> Self {
        Self::new(1, 0)
    }
}

impl Default for SnapshotVersion {
    fn default() -> Self {
        Self::current()
    }
}

impl std::fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Everything needed to rebuild a leadsheet: its items and its size
///
/// Handles are not part of a snapshot; a restored leadsheet hands out new ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetSnapshot {
    #[serde(default)]
    pub version: SnapshotVersion,
    pub size_in_bars: u32,
    /// Items in position order, sections included
    pub items: Vec<Item>,
}

impl SheetSnapshot {
    pub fn new(size_in_bars: u32, items: Vec<Item>) -> Self {
        Self {
            version: SnapshotVersion::current(),
            size_in_bars,
            items,
        }
    }
}
