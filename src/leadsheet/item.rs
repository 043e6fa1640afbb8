// Leadsheet items - sections, chord symbols, annotations and time signature markers

use crate::leadsheet::chord::ChordSymbol;
use crate::timeline::{Position, TimeSignature};
use bitflags::bitflags;
use std::fmt;

/// A section marker: names the bar range it starts and sets its time signature
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Section {
    pub name: String,
    pub time_signature: TimeSignature,
}

impl Section {
    pub fn new(name: impl Into<String>, time_signature: TimeSignature) -> Self {
        Self {
            name: name.into(),
            time_signature,
        }
    }

    /// Case-insensitive name comparison used for uniqueness checks
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.time_signature)
    }
}

/// Payload-free tag of an item, also its uniqueness class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ItemKind {
    Section,
    ChordSymbol,
    Annotation,
    TimeSignatureMarker,
}

impl ItemKind {
    /// Beat-based kinds are snapped to the quantization grid,
    /// the others always sit on the first beat of their bar
    pub fn is_beat_based(&self) -> bool {
        matches!(self, ItemKind::ChordSymbol | ItemKind::Annotation)
    }
}

bitflags! {
    /// Item type filter for range queries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ItemKinds: u8 {
        const SECTION = 1 << 0;
        const CHORD_SYMBOL = 1 << 1;
        const ANNOTATION = 1 << 2;
        const TIME_SIGNATURE_MARKER = 1 << 3;
        /// Every item except sections
        const EVENTS = Self::CHORD_SYMBOL.bits() | Self::ANNOTATION.bits() | Self::TIME_SIGNATURE_MARKER.bits();
    }
}

impl ItemKinds {
    pub fn matches(&self, kind: ItemKind) -> bool {
        self.contains(ItemKinds::from(kind))
    }
}

impl From<ItemKind> for ItemKinds {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Section => ItemKinds::SECTION,
            ItemKind::ChordSymbol => ItemKinds::CHORD_SYMBOL,
            ItemKind::Annotation => ItemKinds::ANNOTATION,
            ItemKind::TimeSignatureMarker => ItemKinds::TIME_SIGNATURE_MARKER,
        }
    }
}

/// Variant-specific payload of an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ItemData {
    Section(Section),
    ChordSymbol(ChordSymbol),
    Annotation(String),
    /// Cautionary time signature shown at the start of a bar
    TimeSignatureMarker(TimeSignature),
}

impl ItemData {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemData::Section(_) => ItemKind::Section,
            ItemData::ChordSymbol(_) => ItemKind::ChordSymbol,
            ItemData::Annotation(_) => ItemKind::Annotation,
            ItemData::TimeSignatureMarker(_) => ItemKind::TimeSignatureMarker,
        }
    }

    /// Parse a chord symbol payload
    pub fn chord(text: &str) -> crate::error::Result<Self> {
        Ok(ItemData::ChordSymbol(ChordSymbol::parse(text)?))
    }

    pub fn annotation(text: impl Into<String>) -> Self {
        ItemData::Annotation(text.into())
    }

    pub fn as_section(&self) -> Option<&Section> {
        match self {
            ItemData::Section(section) => Some(section),
            _ => None,
        }
    }

    pub fn as_chord(&self) -> Option<&ChordSymbol> {
        match self {
            ItemData::ChordSymbol(chord) => Some(chord),
            _ => None,
        }
    }
}

impl fmt::Display for ItemData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemData::Section(section) => write!(f, "{}", section),
            ItemData::ChordSymbol(chord) => write!(f, "{}", chord),
            ItemData::Annotation(text) => write!(f, "\"{}\"", text),
            ItemData::TimeSignatureMarker(ts) => write!(f, "<{}>", ts),
        }
    }
}

/// A positioned leadsheet element
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub position: Position,
    pub data: ItemData,
}

impl Item {
    pub fn new(position: Position, data: ItemData) -> Self {
        Self { position, data }
    }

    pub fn kind(&self) -> ItemKind {
        self.data.kind()
    }

    pub fn as_section(&self) -> Option<&Section> {
        self.data.as_section()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.data, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_filter() {
        assert!(ItemKinds::EVENTS.matches(ItemKind::ChordSymbol));
        assert!(ItemKinds::EVENTS.matches(ItemKind::TimeSignatureMarker));
        assert!(!ItemKinds::EVENTS.matches(ItemKind::Section));
        assert!(ItemKinds::all().matches(ItemKind::Section));
        assert!((ItemKinds::SECTION | ItemKinds::ANNOTATION).matches(ItemKind::Annotation));
    }

    #[test]
    fn test_section_name_comparison() {
        let section = Section::new("Verse", TimeSignature::FOUR_FOUR);
        assert!(section.has_name("verse"));
        assert!(section.has_name(" VERSE "));
        assert!(!section.has_name("Chorus"));
    }

    #[test]
    fn test_item_display() {
        let item = Item::new(Position::at_bar(1), ItemData::chord("Dm7").unwrap());
        assert_eq!(item.to_string(), "Dm7[1:0]");
        assert_eq!(item.kind(), ItemKind::ChordSymbol);
        assert!(item.kind().is_beat_based());
    }
}
