//! Signed 8-bit sine lookup table.
//!
//! One full cycle in 256 entries, amplitude +/-127, so that index 0 = 0 deg,
//! 64 = 90 deg, 128 = 180 deg and 192 = 270 deg. Both the tone synthesizer and
//! the FM/IQ modulator read from this table using the top bits of their phase
//! accumulators.

use crate::consts::{PHASE_INDEX_MASK, PHASE_SHIFT, TABLE_LEN};

/// `round(127 * sin(2 * pi * i / 256))`
pub static SINE_TABLE_I8: [i8; TABLE_LEN] = [
    0, 3, 6, 9, 12, 16, 19, 22, 25, 28, 31, 34, 37, 40, 43, 46,
    49, 51, 54, 57, 60, 63, 65, 68, 71, 73, 76, 78, 81, 83, 85, 88,
    90, 92, 94, 96, 98, 100, 102, 104, 106, 107, 109, 111, 112, 113, 115, 116,
    117, 118, 120, 121, 122, 122, 123, 124, 125, 125, 126, 126, 126, 127, 127, 127,
    127, 127, 127, 127, 126, 126, 126, 125, 125, 124, 123, 122, 122, 121, 120, 118,
    117, 116, 115, 113, 112, 111, 109, 107, 106, 104, 102, 100, 98, 96, 94, 92,
    90, 88, 85, 83, 81, 78, 76, 73, 71, 68, 65, 63, 60, 57, 54, 51,
    49, 46, 43, 40, 37, 34, 31, 28, 25, 22, 19, 16, 12, 9, 6, 3,
    0, -3, -6, -9, -12, -16, -19, -22, -25, -28, -31, -34, -37, -40, -43, -46,
    -49, -51, -54, -57, -60, -63, -65, -68, -71, -73, -76, -78, -81, -83, -85, -88,
    -90, -92, -94, -96, -98, -100, -102, -104, -106, -107, -109, -111, -112, -113, -115, -116,
    -117, -118, -120, -121, -122, -122, -123, -124, -125, -125, -126, -126, -126, -127, -127, -127,
    -127, -127, -127, -127, -126, -126, -126, -125, -125, -124, -123, -122, -122, -121, -120, -118,
    -117, -116, -115, -113, -112, -111, -109, -107, -106, -104, -102, -100, -98, -96, -94, -92,
    -90, -88, -85, -83, -81, -78, -76, -73, -71, -68, -65, -63, -60, -57, -54, -51,
    -49, -46, -43, -40, -37, -34, -31, -28, -25, -22, -19, -16, -12, -9, -6, -3,
];

/// Returns the table index selected by a phase accumulator.
#[inline(always)]
pub const fn phase_index(phase: u32) -> usize {
    ((phase & PHASE_INDEX_MASK) >> PHASE_SHIFT) as usize
}

/// Looks up the sine value for a phase accumulator.
#[inline(always)]
pub fn sine_at(phase: u32) -> i8 {
    SINE_TABLE_I8[phase_index(phase)]
}
