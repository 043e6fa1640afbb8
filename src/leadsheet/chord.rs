// Chord symbols - "Dm7", "F#7", "Bb7/F"
// Only the spelling is modelled; voicing and rendering live elsewhere.

use crate::error::{LeadsheetError, Result};
use std::fmt;
use std::str::FromStr;

/// Accidental attached to a note letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Accidental {
    Natural,
    Sharp,
    Flat,
}

/// A spelled note name (letter + accidental), e.g. "F#" or "Bb"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct NoteName {
    letter: char,
    accidental: Accidental,
}

const LETTERS: [char; 7] = ['C', 'D', 'E', 'F', 'G', 'A', 'B'];
const LETTER_PITCH: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const SHARP_NAMES: [(char, Accidental); 12] = [
    ('C', Accidental::Natural),
    ('C', Accidental::Sharp),
    ('D', Accidental::Natural),
    ('D', Accidental::Sharp),
    ('E', Accidental::Natural),
    ('F', Accidental::Natural),
    ('F', Accidental::Sharp),
    ('G', Accidental::Natural),
    ('G', Accidental::Sharp),
    ('A', Accidental::Natural),
    ('A', Accidental::Sharp),
    ('B', Accidental::Natural),
];
const FLAT_NAMES: [(char, Accidental); 12] = [
    ('C', Accidental::Natural),
    ('D', Accidental::Flat),
    ('D', Accidental::Natural),
    ('E', Accidental::Flat),
    ('E', Accidental::Natural),
    ('F', Accidental::Natural),
    ('G', Accidental::Flat),
    ('G', Accidental::Natural),
    ('A', Accidental::Flat),
    ('A', Accidental::Natural),
    ('B', Accidental::Flat),
    ('B', Accidental::Natural),
];

impl NoteName {
    /// Parse a note name at the start of `text`, returning it and the unparsed rest
    fn parse_prefix(text: &str) -> Option<(Self, &str)> {
        let mut chars = text.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if !LETTERS.contains(&letter) {
            return None;
        }
        let rest = chars.as_str();
        let (accidental, rest) = match rest.chars().next() {
            Some('#') => (Accidental::Sharp, &rest[1..]),
            Some('b') => (Accidental::Flat, &rest[1..]),
            _ => (Accidental::Natural, rest),
        };
        Some((Self { letter, accidental }, rest))
    }

    /// Pitch class, 0 = C
    pub fn pitch_class(&self) -> u8 {
        let index = LETTERS.iter().position(|&l| l == self.letter).unwrap_or(0);
        let base = LETTER_PITCH[index] + 12;
        match self.accidental {
            Accidental::Natural => base % 12,
            Accidental::Sharp => (base + 1) % 12,
            Accidental::Flat => (base - 1) % 12,
        }
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn accidental(&self) -> Accidental {
        self.accidental
    }

    /// Transpose by semitones, keeping flats spelled as flats
    pub fn transposed(&self, semitones: i32) -> Self {
        let pitch = (i32::from(self.pitch_class()) + semitones).rem_euclid(12) as usize;
        let (letter, accidental) = if self.accidental == Accidental::Flat {
            FLAT_NAMES[pitch]
        } else {
            SHARP_NAMES[pitch]
        };
        Self { letter, accidental }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.accidental {
            Accidental::Natural => write!(f, "{}", self.letter),
            Accidental::Sharp => write!(f, "{}#", self.letter),
            Accidental::Flat => write!(f, "{}b", self.letter),
        }
    }
}

/// A chord symbol: root, quality suffix and optional slash bass
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ChordSymbol {
    root: NoteName,
    quality: String,
    bass: Option<NoteName>,
}

impl ChordSymbol {
    /// Parse a chord symbol such as "Cmaj7", "F#m7b5" or "Bb7/F"
    pub fn parse(text: &str) -> Result<Self> {
        text.parse()
    }

    pub fn root(&self) -> NoteName {
        self.root
    }

    /// Everything between the root and the slash bass, e.g. "m7" in "Dm7"
    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn bass(&self) -> Option<NoteName> {
        self.bass
    }

    /// Same chord transposed by `semitones`
    pub fn transposed(&self, semitones: i32) -> Self {
        Self {
            root: self.root.transposed(semitones),
            quality: self.quality.clone(),
            bass: self.bass.map(|b| b.transposed(semitones)),
        }
    }
}

impl FromStr for ChordSymbol {
    type Err = LeadsheetError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let invalid = || LeadsheetError::InvalidArgument(format!("invalid chord symbol '{}'", s));
        if text.is_empty() || text.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        let (root, rest) = NoteName::parse_prefix(text).ok_or_else(invalid)?;
        let (quality, bass) = match rest.rsplit_once('/') {
            // "C6/9" is a quality, not a slash chord
            Some((_, tail)) if tail.starts_with(|c: char| c.is_ascii_digit()) => (rest, None),
            Some((quality, bass_text)) => {
                let (bass, tail) = NoteName::parse_prefix(bass_text).ok_or_else(invalid)?;
                if !tail.is_empty() {
                    return Err(invalid());
                }
                (quality, Some(bass))
            }
            None => (rest, None),
        };
        Ok(Self {
            root,
            quality: quality.to_string(),
            bass,
        })
    }
}

impl fmt::Display for ChordSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root, self.quality)?;
        if let Some(bass) = self.bass {
            write!(f, "/{}", bass)?;
        }
        Ok(())
    }
}
