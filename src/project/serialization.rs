// Serialization utilities for leadsheet snapshots

use crate::error::{LeadsheetError, Result};
use crate::project::types::SheetSnapshot;
use ron::{from_str as ron_from_str, to_string as ron_to_string};
use std::fs;
use std::path::Path;

/// Serialize a snapshot to RON format
pub fn serialize_to_ron(snapshot: &SheetSnapshot) -> Result<String> {
    ron_to_string(snapshot).map_err(|e| {
        LeadsheetError::Serialization(format!("Failed to serialize to RON: {}", e))
    })
}

/// Deserialize a snapshot from RON format
pub fn deserialize_from_ron(ron_data: &str) -> Result<SheetSnapshot> {
    ron_from_str(ron_data).map_err(|e| {
        LeadsheetError::Serialization(format!("Failed to deserialize from RON: {}", e))
    })
}

/// Serialize a snapshot to JSON format
pub fn serialize_to_json(snapshot: &SheetSnapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).map_err(|e| {
        LeadsheetError::Serialization(format!("Failed to serialize to JSON: {}", e))
    })
}

/// Deserialize a snapshot from JSON format
pub fn deserialize_from_json(json_data: &str) -> Result<SheetSnapshot> {
    serde_json::from_str(json_data).map_err(|e| {
        LeadsheetError::Serialization(format!("Failed to deserialize from JSON: {}", e))
    })
}

/// Write a snapshot as RON, or as JSON when the extension is `.json`
pub fn save_snapshot(snapshot: &SheetSnapshot, path: &Path) -> Result<()> {
    let text = if is_json(path) {
        serialize_to_json(snapshot)?
    } else {
        serialize_to_ron(snapshot)?
    };
    fs::write(path, text)?;
    Ok(())
}

/// Read a snapshot written by [`save_snapshot`]
pub fn load_snapshot(path: &Path) -> Result<SheetSnapshot> {
    let text = fs::read_to_string(path)?;
    if is_json(path) {
        deserialize_from_json(&text)
    } else {
        deserialize_from_ron(&text)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leadsheet::item::{Item, ItemData, Section};
    use crate::timeline::{Position, TimeSignature};
    use tempfile::tempdir;

    fn snapshot() -> SheetSnapshot {
        SheetSnapshot::new(
            8,
            vec![
                Item::new(
                    Position::zero(),
                    ItemData::Section(Section::new("Intro", TimeSignature::FOUR_FOUR)),
                ),
                Item::new(Position::beats(1, 3, 2), ItemData::chord("Bb7/F").unwrap()),
                Item::new(Position::at_bar(2), ItemData::annotation("fine")),
            ],
        )
    }

    #[test]
    fn test_ron_round_trip() {
        let ron = serialize_to_ron(&snapshot()).unwrap();
        assert_eq!(deserialize_from_ron(&ron).unwrap(), snapshot());
    }

    #[test]
    fn test_json_round_trip() {
        let json = serialize_to_json(&snapshot()).unwrap();
        assert!(json.contains("Intro"));
        assert_eq!(deserialize_from_json(&json).unwrap(), snapshot());
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            deserialize_from_json("{\"size_in_bars\": }"),
            Err(LeadsheetError::Serialization(_))
        ));
    }

    #[test]
    fn test_save_and_load_by_extension() {
        let dir = tempdir().unwrap();
        for name in ["sheet.ron", "sheet.json"] {
            let path = dir.path().join(name);
            save_snapshot(&snapshot(), &path).unwrap();
            assert_eq!(load_snapshot(&path).unwrap(), snapshot());
        }
        let json = fs::read_to_string(dir.path().join("sheet.json")).unwrap();
        assert!(json.trim_start().starts_with('{'));
    }
}
