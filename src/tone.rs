//! Phase-accumulator tone synthesizer.
//!
//! A direct digital synthesis oscillator: a wrapping `u32` accumulator is
//! advanced by a per-tick increment and its index bits select an entry of
//! [`SINE_TABLE_I8`](crate::sine::SINE_TABLE_I8). The output frequency is
//!
//! ```text
//! F = increment / 2^ACCUMULATOR_BITS * tick_rate
//! ```
//!
//! Wraparound of the accumulator is what makes the output periodic, so all
//! arithmetic here is `wrapping_*`.

use crate::sine::sine_at;

/// Tone oscillator switching between the mark and space increments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToneSynth {
    phase: u32,
}

impl ToneSynth {
    /// Creates an oscillator at phase zero.
    pub const fn new() -> Self {
        Self { phase: 0 }
    }

    /// Advances the accumulator by `increment`, wrapping modulo 2^32.
    #[inline(always)]
    pub fn advance(&mut self, increment: u32) {
        self.phase = self.phase.wrapping_add(increment);
    }

    /// Advances by the increment selected by `bit` (mark for `true`).
    #[inline(always)]
    pub fn advance_bit(&mut self, bit: bool, mark: u32, space: u32) {
        self.advance(if bit { mark } else { space });
    }

    /// Current tone sample, without advancing.
    #[inline(always)]
    pub fn sample(&self) -> i8 {
        sine_at(self.phase)
    }

    /// Advances by `increment` and returns the new sample.
    #[inline(always)]
    pub fn step(&mut self, increment: u32) -> i8 {
        self.advance(increment);
        self.sample()
    }

    /// Raw accumulator value.
    pub fn phase(&self) -> u32 {
        self.phase
    }
}
