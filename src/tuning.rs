//! Conversions from physical units to pipeline parameters.
//!
//! The sample callback only understands integers: accumulator increments,
//! tick counts and a deviation scale. These helpers turn tone frequencies,
//! baud rates and FM deviation into those integers, with a runtime
//! (`f32`, via `libm`) and a compile-time (`const fn`, integer) variant of
//! each.
//!
//! | Quantity        | Clocked at                | Formula |
//! |-----------------|---------------------------|---------|
//! | tone increment  | [`TONE_SAMPLE_RATE`]      | `f * 2^26 / 228_000` |
//! | samples per bit | [`TONE_SAMPLE_RATE`]      | `228_000 / baud` |
//! | bandwidth scale | [`BASEBAND_SAMPLE_RATE`]  | `dev * 2^26 / (2_280_000 * 127)` |

use libm::roundf;

use crate::consts::{ACCUMULATOR_BITS, BASEBAND_SAMPLE_RATE, PAYLOAD_LEN, TONE_SAMPLE_RATE};
use crate::framing::FrameFormat;
use crate::message::ConfigureMessage;

/// Peak magnitude of a tone sample.
const TONE_PEAK: u32 = 127;

/// Full accumulator cycle as a float.
const CYCLE: f32 = (1u64 << ACCUMULATOR_BITS) as f32;

/// Computes the tone accumulator increment for `freq_hz`.
///
/// # Arguments
/// - `freq_hz`: tone frequency in Hz (e.g. 1200.0 for a Bell 202 mark)
///
/// # Returns
/// - Increment per tone tick, rounded to nearest
pub fn phase_increment(freq_hz: f32) -> u32 {
    roundf(freq_hz * CYCLE / TONE_SAMPLE_RATE as f32) as u32
}

/// Compile-time tone accumulator increment.
pub const fn const_phase_increment(freq_hz: u32) -> u32 {
    let rate = TONE_SAMPLE_RATE as u64;
    ((((freq_hz as u64) << ACCUMULATOR_BITS) + rate / 2) / rate) as u32
}

/// Computes the number of tone ticks per bit for `baud`.
///
/// Returns `0` for a zero baud rate, which a configuration rejects.
///
/// Each bit lasts exactly this many tone ticks. Firmware that holds a bit
/// for `samples_per_bit + 1` ticks runs one tick per bit slower than this
/// crate given the same value.
pub fn samples_per_bit(baud: f32) -> u32 {
    if baud <= 0.0 {
        return 0;
    }
    roundf(TONE_SAMPLE_RATE as f32 / baud) as u32
}

/// Compile-time tone ticks per bit.
pub const fn const_samples_per_bit(baud: u32) -> u32 {
    if baud == 0 {
        return 0;
    }
    (TONE_SAMPLE_RATE + baud / 2) / baud
}

/// Computes the carrier deviation scale for a peak deviation of
/// `deviation_hz`.
///
/// A full-scale tone sample (127) multiplied by the result moves the carrier
/// by `deviation_hz` at the baseband sample rate.
pub fn bandwidth_scale(deviation_hz: f32) -> i32 {
    roundf(deviation_hz * CYCLE / (BASEBAND_SAMPLE_RATE as f32 * TONE_PEAK as f32)) as i32
}

/// Compile-time carrier deviation scale.
pub const fn const_bandwidth_scale(deviation_hz: u32) -> i32 {
    let den = BASEBAND_SAMPLE_RATE as u64 * TONE_PEAK as u64;
    ((((deviation_hz as u64) << ACCUMULATOR_BITS) + den / 2) / den) as i32
}

/// Physical description of an AFSK transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AfskParams {
    /// Bit rate in baud
    pub baud: f32,
    /// Tone for a `1` bit, in Hz
    pub mark_hz: f32,
    /// Tone for a `0` bit, in Hz
    pub space_hz: f32,
    /// Peak FM deviation of the carrier, in Hz
    pub deviation_hz: f32,
    /// Total number of transmissions of the payload
    pub repeat: u32,
    /// Byte framing
    pub format: FrameFormat,
}

impl AfskParams {
    /// Bell 202: 1200 baud, 1200 Hz mark, 2200 Hz space.
    pub const BELL_202: Self = Self {
        baud: 1200.0,
        mark_hz: 1200.0,
        space_hz: 2200.0,
        deviation_hz: 5000.0,
        repeat: 1,
        format: FrameFormat::SevenBitParityStop,
    };

    /// Builds a configure message carrying `payload`.
    ///
    /// The payload is truncated to [`PAYLOAD_LEN`] bytes and zero-filled, so
    /// any payload shorter than `PAYLOAD_LEN - 1` is terminated automatically.
    pub fn configure(&self, payload: &[u8]) -> ConfigureMessage {
        let mut data = [0u8; PAYLOAD_LEN];
        let len = payload.len().min(PAYLOAD_LEN);
        data[..len].copy_from_slice(&payload[..len]);
        ConfigureMessage {
            payload: data,
            samples_per_bit: samples_per_bit(self.baud),
            phase_inc_mark: phase_increment(self.mark_hz),
            phase_inc_space: phase_increment(self.space_hz),
            repeat: self.repeat,
            bandwidth_scale: bandwidth_scale(self.deviation_hz),
            alternate_format: self.format == FrameFormat::EightBitParity,
        }
    }
}

impl Default for AfskParams {
    fn default() -> Self {
        Self::BELL_202
    }
}
