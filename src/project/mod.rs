// Leadsheet persistence helpers
// Snapshots hold the item list plus the size; RON is the default format, JSON is also accepted.

pub mod serialization;
pub mod types;

use crate::command::SheetState;
use crate::error::{LeadsheetError, Result};
use crate::leadsheet::item::ItemData;
use crate::leadsheet::store::ItemStore;

pub use serialization::{
    deserialize_from_json, deserialize_from_ron, load_snapshot, save_snapshot, serialize_to_json,
    serialize_to_ron,
};
pub use types::{SheetSnapshot, SnapshotVersion};

/// Helper function to validate snapshot structure
pub fn validate_snapshot(snapshot: &SheetSnapshot) -> Result<()> {
    state_from_snapshot(snapshot).map(|_| ())
}

/// Rebuild a sheet state, checking every document invariant
pub(crate) fn state_from_snapshot(snapshot: &SheetSnapshot) -> Result<SheetState> {
    if snapshot.version.major != SnapshotVersion::current().major {
        return Err(LeadsheetError::Serialization(format!(
            "Unsupported snapshot version {}",
            snapshot.version
        )));
    }

    let mut store = ItemStore::new();
    for item in &snapshot.items {
        if let ItemData::Annotation(text) = &item.data {
            if text.trim().is_empty() {
                return Err(LeadsheetError::InvalidArgument(format!(
                    "blank annotation at {}",
                    item.position
                )));
            }
        }
        store.insert(item.clone());
    }

    let state = SheetState::from_store(store, snapshot.size_in_bars);
    state
        .check_invariants()
        .map_err(|violation| LeadsheetError::InvalidArgument(format!("Invalid snapshot: {}", violation)))?;
    Ok(state)
}
