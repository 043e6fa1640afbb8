// Timeline - Bar/beat positions, time signatures and beat quantization
// Positions are exact rationals so beats like 1/3 never drift.

pub mod position;
pub mod quantize;
pub mod signature;

pub use position::{Beat, Position};
pub use quantize::{Quantization, is_on_grid, last_grid_beat, quantize};
pub use signature::TimeSignature;
