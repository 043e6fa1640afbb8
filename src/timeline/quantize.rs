// Quantization - snapping beat-based items onto a beat grid

use crate::timeline::position::{Beat, Position};
use crate::timeline::signature::TimeSignature;
use std::fmt;

/// Grid used to snap chord symbols and annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Quantization {
    /// No grid, any in-bar beat is accepted
    Off,
    /// Two grid points per bar
    HalfBar,
    /// One grid point per beat
    #[default]
    Beat,
    HalfBeat,
    OneThirdBeat,
    OneQuarterBeat,
}

impl Quantization {
    /// Grid step in beats for the given time signature, `None` when quantization is off.
    /// An empty bar has no half-bar grid either.
    pub fn unit(&self, time_signature: TimeSignature) -> Option<Beat> {
        match self {
            Quantization::Off => None,
            Quantization::HalfBar if time_signature.beats_per_bar() == 0 => None,
            Quantization::HalfBar => Some(Beat::new(time_signature.beats_per_bar(), 2)),
            Quantization::Beat => Some(Beat::from_integer(1)),
            Quantization::HalfBeat => Some(Beat::new(1, 2)),
            Quantization::OneThirdBeat => Some(Beat::new(1, 3)),
            Quantization::OneQuarterBeat => Some(Beat::new(1, 4)),
        }
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantization::Off => "off",
            Quantization::HalfBar => "1/2 bar",
            Quantization::Beat => "beat",
            Quantization::HalfBeat => "1/2 beat",
            Quantization::OneThirdBeat => "1/3 beat",
            Quantization::OneQuarterBeat => "1/4 beat",
        };
        f.write_str(name)
    }
}

/// Round `beat` to the nearest multiple of `unit`, ties going to the later point
fn round_to_grid(beat: Beat, unit: Beat) -> Beat {
    // beat / unit = (bn * ud) / (bd * un); floor(x + 1/2) = (2n + d) / 2d
    let n = u64::from(*beat.numer()) * u64::from(*unit.denom());
    let d = u64::from(*beat.denom()) * u64::from(*unit.numer());
    let index = (2 * n + d) / (2 * d);
    let index = u32::try_from(index).unwrap_or(u32::MAX);
    unit * Beat::from_integer(index)
}

/// Last grid point strictly inside a bar
pub fn last_grid_beat(time_signature: TimeSignature, quantization: Quantization) -> Beat {
    let beats = time_signature.beats_per_bar();
    match quantization.unit(time_signature) {
        None => Beat::from_integer(beats.saturating_sub(1)),
        Some(unit) => {
            // ceil(beats / unit) - 1 grid steps
            let n = u64::from(beats) * u64::from(*unit.denom());
            let d = u64::from(*unit.numer());
            let steps = ((n + d - 1) / d).saturating_sub(1);
            unit * Beat::from_integer(steps as u32)
        }
    }
}

/// True when the beat is inside the bar and sits on the grid
pub fn is_on_grid(beat: Beat, time_signature: TimeSignature, quantization: Quantization) -> bool {
    if !time_signature.is_valid_beat(beat) {
        return false;
    }
    match quantization.unit(time_signature) {
        None => true,
        Some(unit) => round_to_grid(beat, unit) == beat,
    }
}

/// Snap a position onto the grid of its section.
///
/// `last_bar` is the last bar of the section owning the position: rounding may
/// carry an item onto the first beat of the next bar, but never out of its section.
/// Beats beyond the bar length are clamped to the last grid point of the bar.
pub fn quantize(
    position: Position,
    time_signature: TimeSignature,
    quantization: Quantization,
    last_bar: u32,
) -> Position {
    if !time_signature.is_valid_beat(position.beat) {
        return position.with_beat(last_grid_beat(time_signature, quantization));
    }
    let Some(unit) = quantization.unit(time_signature) else {
        return position;
    };
    let snapped = round_to_grid(position.beat, unit);
    if time_signature.is_valid_beat(snapped) {
        position.with_beat(snapped)
    } else if position.bar < last_bar {
        Position::at_bar(position.bar + 1)
    } else {
        position.with_beat(last_grid_beat(time_signature, quantization))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_ties_go_later() {
        let half = Beat::new(1, 2);
        assert_eq!(round_to_grid(half, Beat::from_integer(1)), Beat::from_integer(1));
        assert_eq!(round_to_grid(Beat::new(1, 4), Beat::new(1, 2)), Beat::new(1, 2));
        assert_eq!(round_to_grid(Beat::new(1, 5), Beat::new(1, 2)), Beat::from_integer(0));
    }

    #[test]
    fn test_last_grid_beat() {
        let q = Quantization::Beat;
        assert_eq!(last_grid_beat(TimeSignature::FOUR_FOUR, q), Beat::from_integer(3));
        assert_eq!(last_grid_beat(TimeSignature::THREE_FOUR, q), Beat::from_integer(2));
        assert_eq!(
            last_grid_beat(TimeSignature::THREE_FOUR, Quantization::OneQuarterBeat),
            Beat::new(11, 4)
        );
        assert_eq!(
            last_grid_beat(TimeSignature::THREE_FOUR, Quantization::HalfBar),
            Beat::new(3, 2)
        );
        assert_eq!(
            last_grid_beat(TimeSignature::FOUR_FOUR, Quantization::OneThirdBeat),
            Beat::new(11, 3)
        );
        assert_eq!(last_grid_beat(TimeSignature::FIVE_FOUR, Quantization::Off), Beat::from_integer(4));
    }

    #[test]
    fn test_empty_bar_does_not_underflow() {
        let empty = TimeSignature {
            numerator: 0,
            denominator: 4,
        };
        assert_eq!(Quantization::HalfBar.unit(empty), None);
        for q in [Quantization::Off, Quantization::HalfBar, Quantization::Beat] {
            assert_eq!(last_grid_beat(empty, q), Beat::from_integer(0));
        }
        let pos = Position::beats(2, 1, 2);
        assert_eq!(quantize(pos, empty, Quantization::HalfBar, 4), Position::at_bar(2));
    }

    #[test]
    fn test_quantize_clamps_out_of_bar_beats() {
        // Beat 3 does not exist in 3/4
        let pos = Position::beats(3, 3, 1);
        let q = quantize(pos, TimeSignature::THREE_FOUR, Quantization::Beat, 10);
        assert_eq!(q, Position::beats(3, 2, 1));

        // Beat 3 is the last beat of 4/4
        let q = quantize(pos, TimeSignature::FOUR_FOUR, Quantization::Beat, 10);
        assert_eq!(q, pos);
    }

    #[test]
    fn test_quantize_rounds_to_nearest() {
        let ts = TimeSignature::THREE_FOUR;
        let q = quantize(Position::beats(5, 3, 4), ts, Quantization::Beat, 7);
        assert_eq!(q, Position::beats(5, 1, 1));

        let q = quantize(Position::beats(5, 1, 3), ts, Quantization::HalfBeat, 7);
        assert_eq!(q, Position::beats(5, 1, 2));
    }

    #[test]
    fn test_quantize_overflow_moves_to_next_bar_inside_section() {
        let ts = TimeSignature::FOUR_FOUR;
        let pos = Position::beats(2, 15, 4); // 3.75
        assert_eq!(quantize(pos, ts, Quantization::Beat, 5), Position::at_bar(3));
        // Last bar of the section: stay inside it
        assert_eq!(quantize(pos, ts, Quantization::Beat, 2), Position::beats(2, 3, 1));
    }

    #[test]
    fn test_quantize_is_idempotent_on_grid() {
        let ts = TimeSignature::SIX_EIGHT;
        for q in [
            Quantization::Beat,
            Quantization::HalfBar,
            Quantization::HalfBeat,
            Quantization::OneThirdBeat,
            Quantization::OneQuarterBeat,
        ] {
            let unit = q.unit(ts).unwrap();
            let mut beat = Beat::from_integer(0);
            while ts.is_valid_beat(beat) {
                let pos = Position::new(1, beat);
                assert!(is_on_grid(beat, ts, q));
                assert_eq!(quantize(pos, ts, q, 1), pos);
                beat += unit;
            }
        }
    }

    #[test]
    fn test_quantization_off() {
        let ts = TimeSignature::FOUR_FOUR;
        let pos = Position::beats(0, 7, 5);
        assert_eq!(quantize(pos, ts, Quantization::Off, 0), pos);
        assert!(is_on_grid(pos.beat, ts, Quantization::Off));
        assert!(!is_on_grid(Beat::from_integer(4), ts, Quantization::Off));
    }
}
