//! Constants shared by the synthesis pipeline and the message transport.
//!
//! This module fixes the numeric geometry the rest of the crate depends on:
//! accumulator widths, lookup table size, payload and message bounds, and the
//! divider between the baseband sample rate and the tone/bit rate.
//!
//! ## Key Concepts
//!
//! - **Phase accumulators** are `u32` values that wrap freely. Only bits
//!   `18..=25` are used to index the sine table, which makes the effective
//!   accumulator width 26 bits.
//! - **Tone rate**: the framing and tone logic run once every
//!   [`TONE_DIVIDER`] output samples; the FM carrier runs on every sample.
//! - **Messages** are bounded by [`MAX_MESSAGE_SIZE`] once encoded, and every
//!   record in the cross-core ring carries a [`RECORD_HEADER_LEN`] byte length
//!   prefix.

/// Capacity (in bytes) of the transmitted payload buffer.
///
/// A payload ends at the first pair of consecutive zero bytes.
pub const PAYLOAD_LEN: usize = 512;

/// Number of bits of the accumulator used as the table index.
pub const TABLE_BITS: u32 = 8;

/// Number of entries in the sine lookup table.
pub const TABLE_LEN: usize = 1 << TABLE_BITS;

/// Right shift applied to an accumulator to obtain the table index.
pub const PHASE_SHIFT: u32 = 18;

/// Effective width of the phase accumulators, in bits.
///
/// `F = increment / 2^ACCUMULATOR_BITS * sample_rate`.
pub const ACCUMULATOR_BITS: u32 = PHASE_SHIFT + TABLE_BITS;

/// Mask selecting the index bits of an accumulator.
pub const PHASE_INDEX_MASK: u32 = ((TABLE_LEN as u32) - 1) << PHASE_SHIFT;

/// One quarter of the accumulator cycle (90 degrees).
pub const QUARTER_CYCLE: u32 = ((TABLE_LEN as u32) / 4) << PHASE_SHIFT;

/// Baseband output sample rate, in Hz.
pub const BASEBAND_SAMPLE_RATE: u32 = 2_280_000;

/// Number of output samples per tone/bit tick.
pub const TONE_DIVIDER: u32 = 10;

/// Rate at which the tone accumulator and the bit clock advance, in Hz.
pub const TONE_SAMPLE_RATE: u32 = BASEBAND_SAMPLE_RATE / TONE_DIVIDER;

/// Number of bits emitted per framed byte (start, eight, trailer).
pub const FRAME_BITS: u8 = 10;

/// Largest encoded size (in bytes) of any message kind.
///
/// The configure message is the largest kind at 534 bytes.
pub const MAX_MESSAGE_SIZE: usize = 544;

/// Length of the little-endian length prefix stored in front of every
/// message inside the cross-core ring.
pub const RECORD_HEADER_LEN: usize = 2;

/// Depth of the single-producer/single-consumer snapshot handoff between the
/// control context and the sample callback.
///
/// The queue holds `HANDOFF_DEPTH - 1` snapshots.
pub const HANDOFF_DEPTH: usize = 4;
