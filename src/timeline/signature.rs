// Time signature of a section

use crate::error::{LeadsheetError, Result};
use crate::timeline::position::Beat;
use std::fmt;
use std::str::FromStr;

/// Time signature (numerator/denominator)
/// Example: 4/4 time = TimeSignature { numerator: 4, denominator: 4 }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,   // Beats per bar (typically 2, 3, 4, 5, 6, 7, 12)
    pub denominator: u8, // Note value (4 = quarter note, 8 = eighth note)
}

impl TimeSignature {
    pub const TWO_FOUR: TimeSignature = TimeSignature::from_parts(2, 4);
    pub const THREE_FOUR: TimeSignature = TimeSignature::from_parts(3, 4);
    pub const FOUR_FOUR: TimeSignature = TimeSignature::from_parts(4, 4);
    pub const FIVE_FOUR: TimeSignature = TimeSignature::from_parts(5, 4);
    pub const SIX_EIGHT: TimeSignature = TimeSignature::from_parts(6, 8);
    pub const SEVEN_EIGHT: TimeSignature = TimeSignature::from_parts(7, 8);
    pub const TWELVE_EIGHT: TimeSignature = TimeSignature::from_parts(12, 8);

    const fn from_parts(numerator: u8, denominator: u8) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Creates a new time signature
    ///
    /// Panics on a zero numerator or a denominator that is not a power of two,
    /// use [`TimeSignature::try_new`] for untrusted input.
    pub fn new(numerator: u8, denominator: u8) -> Self {
        assert!(numerator > 0, "Time signature numerator must be > 0");
        assert!(
            denominator.is_power_of_two(),
            "Time signature denominator must be power of 2"
        );
        Self::from_parts(numerator, denominator)
    }

    /// Creates a time signature, rejecting invalid values
    pub fn try_new(numerator: u8, denominator: u8) -> Result<Self> {
        Self::from_parts(numerator, denominator).validate()
    }

    /// False for a zero numerator or a denominator that is not a power of two.
    ///
    /// The fields are public, so a value built literally or deserialized may fail this.
    pub fn is_valid(&self) -> bool {
        self.numerator > 0 && self.denominator.is_power_of_two()
    }

    /// Returns the signature itself when valid, `InvalidArgument` otherwise
    pub fn validate(self) -> Result<Self> {
        if !self.is_valid() {
            return Err(LeadsheetError::InvalidArgument(format!(
                "invalid time signature {}",
                self
            )));
        }
        Ok(self)
    }

    /// Common 4/4 time signature
    pub fn four_four() -> Self {
        Self::FOUR_FOUR
    }

    /// Common 3/4 time signature (waltz)
    pub fn three_four() -> Self {
        Self::THREE_FOUR
    }

    /// Common 6/8 time signature
    pub fn six_eight() -> Self {
        Self::SIX_EIGHT
    }

    /// Number of beats per bar
    pub fn beats_per_bar(&self) -> u32 {
        self.numerator as u32
    }

    /// Length of a bar expressed in beats
    pub fn bar_length(&self) -> Beat {
        Beat::from_integer(self.beats_per_bar())
    }

    /// A beat is valid when it falls inside the bar
    pub fn is_valid_beat(&self, beat: Beat) -> bool {
        beat < self.bar_length()
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::four_four()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = LeadsheetError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LeadsheetError::InvalidArgument(format!("invalid time signature '{}'", s));
        let (upper, lower) = s.trim().split_once('/').ok_or_else(invalid)?;
        let numerator = upper.trim().parse::<u8>().map_err(|_| invalid())?;
        let denominator = lower.trim().parse::<u8>().map_err(|_| invalid())?;
        Self::try_new(numerator, denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_signature() {
        let ts = TimeSignature::four_four();
        assert_eq!(ts.numerator, 4);
        assert_eq!(ts.denominator, 4);
        assert_eq!(ts.beats_per_bar(), 4);
        assert_eq!(ts.to_string(), "4/4");
    }

    #[test]
    fn test_valid_beats() {
        let ts = TimeSignature::three_four();
        assert!(ts.is_valid_beat(Beat::from_integer(2)));
        assert!(ts.is_valid_beat(Beat::new(5, 2)));
        assert!(!ts.is_valid_beat(Beat::from_integer(3)));
    }

    #[test]
    fn test_is_valid() {
        assert!(TimeSignature::SEVEN_EIGHT.is_valid());
        let zero = TimeSignature {
            numerator: 0,
            denominator: 4,
        };
        assert!(!zero.is_valid());
        assert!(matches!(zero.validate(), Err(LeadsheetError::InvalidArgument(_))));
        let odd = TimeSignature {
            numerator: 3,
            denominator: 6,
        };
        assert!(!odd.is_valid());
        assert!(TimeSignature::try_new(3, 0).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("6/8".parse::<TimeSignature>().unwrap(), TimeSignature::SIX_EIGHT);
        assert_eq!(" 3 / 4 ".parse::<TimeSignature>().unwrap(), TimeSignature::THREE_FOUR);
        assert!("0/4".parse::<TimeSignature>().is_err());
        assert!("4/3".parse::<TimeSignature>().is_err());
        assert!("waltz".parse::<TimeSignature>().is_err());
    }

    #[test]
    #[should_panic]
    fn test_invalid_denominator_panics() {
        TimeSignature::new(4, 6);
    }
}
