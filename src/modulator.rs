//! FM modulation of the tone onto a complex baseband carrier.
//!
//! Each tone sample is scaled into a frequency deviation and integrated into
//! a second wrapping phase accumulator. Two reads of the same sine table, a
//! quarter cycle apart, give the cosine and sine of the carrier phase.

use crate::consts::QUARTER_CYCLE;
use crate::sine::sine_at;

/// One complex baseband sample, laid out as the radio's DMA expects.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct IqSample {
    /// In-phase component (cosine of the carrier phase)
    pub re: i8,
    /// Quadrature component (sine of the carrier phase)
    pub im: i8,
}

impl IqSample {
    /// Creates a sample.
    pub const fn new(re: i8, im: i8) -> Self {
        Self { re, im }
    }
}

/// Carrier phase integrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FmModulator {
    phase: u32,
}

impl FmModulator {
    /// Creates a modulator at carrier phase zero.
    pub const fn new() -> Self {
        Self { phase: 0 }
    }

    /// Integrates `tone_sample * bandwidth_scale` into the carrier phase and
    /// returns the resulting I/Q pair.
    #[inline(always)]
    pub fn modulate(&mut self, tone_sample: i8, bandwidth_scale: i32) -> IqSample {
        let deviation = i32::from(tone_sample).wrapping_mul(bandwidth_scale);
        self.phase = self.phase.wrapping_add_signed(deviation);
        IqSample {
            re: sine_at(self.phase.wrapping_add(QUARTER_CYCLE)),
            im: sine_at(self.phase),
        }
    }

    /// Raw carrier accumulator.
    pub fn phase(&self) -> u32 {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_deviation_holds_phase() {
        let mut fm = FmModulator::new();
        for _ in 0..16 {
            assert_eq!(fm.modulate(100, 0), IqSample::new(127, 0));
        }
        assert_eq!(fm.phase(), 0);
    }

    #[test]
    fn test_deviation_is_tone_times_scale() {
        let mut fm = FmModulator::new();
        let _ = fm.modulate(-3, 1000);
        assert_eq!(fm.phase(), 0u32.wrapping_sub(3000));
        let _ = fm.modulate(2, 1000);
        assert_eq!(fm.phase(), 0u32.wrapping_sub(1000));
    }

    #[test]
    fn test_quadrature_is_quarter_cycle_ahead() {
        let mut fm = FmModulator::new();
        // 64 table steps is a quarter turn: cos = 0, sin = peak
        let sample = fm.modulate(1, QUARTER_CYCLE as i32);
        assert_eq!(sample, IqSample::new(0, 127));
        let sample = fm.modulate(1, QUARTER_CYCLE as i32);
        assert_eq!(sample, IqSample::new(-127, 0));
    }

    #[test]
    fn test_carrier_phase_wraps() {
        let mut fm = FmModulator::new();
        let _ = fm.modulate(127, i32::MAX / 127);
        let _ = fm.modulate(127, i32::MAX / 127);
        let _ = fm.modulate(127, i32::MAX / 127);
        assert_eq!(fm.phase(), ((i32::MAX / 127 * 127) as u32).wrapping_mul(3));
    }
}
