// Position - bar/beat location of an item in the leadsheet

use crate::error::{LeadsheetError, Result};
use num_rational::Ratio;
use std::fmt;

/// Beat offset within a bar, stored as an exact fraction of a beat
pub type Beat = Ratio<u32>;

/// Immutable (bar, beat) position
///
/// Positions are totally ordered by bar, then by beat. Bars are 0-based.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Position {
    pub bar: u32,
    pub beat: Beat,
}

impl Position {
    /// Creates a new position
    pub fn new(bar: u32, beat: Beat) -> Self {
        Self { bar, beat }
    }

    /// Start of a bar
    pub fn at_bar(bar: u32) -> Self {
        Self::new(bar, Beat::from_integer(0))
    }

    /// Convenience constructor for whole or fractional beats: `Position::beats(3, 3, 4)` is bar 3, beat 0.75
    ///
    /// # Panics
    /// When `denom` is zero. Use [`Position::try_beats`] for untrusted input.
    pub fn beats(bar: u32, numer: u32, denom: u32) -> Self {
        Self::new(bar, Beat::new(numer, denom))
    }

    /// Like [`Position::beats`], but a zero denominator is an `InvalidArgument`
    pub fn try_beats(bar: u32, numer: u32, denom: u32) -> Result<Self> {
        if denom == 0 {
            return Err(LeadsheetError::InvalidArgument(format!(
                "beat {}/0 has a zero denominator",
                numer
            )));
        }
        Ok(Self::beats(bar, numer, denom))
    }

    /// Zero position (bar 0, beat 0)
    pub fn zero() -> Self {
        Self::at_bar(0)
    }

    /// Same beat, different bar
    pub fn with_bar(&self, bar: u32) -> Self {
        Self::new(bar, self.beat)
    }

    /// Same bar, different beat
    pub fn with_beat(&self, beat: Beat) -> Self {
        Self::new(self.bar, beat)
    }

    /// Shift the bar by a signed amount, `None` when it would go below bar 0
    pub fn shifted(&self, delta: i64) -> Option<Self> {
        let bar = i64::from(self.bar) + delta;
        u32::try_from(bar).ok().map(|bar| self.with_bar(bar))
    }

    /// True at the very start of the bar
    pub fn is_first_beat(&self) -> bool {
        self.beat == Beat::from_integer(0)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.beat.is_integer() {
            write!(f, "[{}:{}]", self.bar, self.beat.to_integer())
        } else {
            let beat = *self.beat.numer() as f64 / *self.beat.denom() as f64;
            write!(f, "[{}:{}]", self.bar, beat)
        }
    }
}
