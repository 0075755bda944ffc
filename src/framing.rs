//! Byte framing and the repeat/terminate transmission protocol.
//!
//! [`FrameEncoder`] turns a zero-terminated payload into a serial bit stream,
//! ten bits per byte, most significant bit first after the start bit:
//!
//! ```text
//! SevenBitParityStop   0 b7 b6 b5 b4 b3 b2 b1 b0 1      stride 1 byte
//! EightBitParity       0 b7 b6 b5 b4 b3 b2 b1 b0 p      stride 2 bytes, p = next & 1
//! ```
//!
//! In the seven-bit format the caller packs seven data bits and the parity
//! bit into each payload byte. In the eight-bit format payload bytes come in
//! pairs of data byte and parity byte.
//!
//! The encoder is clocked once per tone tick and assembles a new bit every
//! `samples_per_bit` ticks. Before each bit it looks at the two-byte window at
//! the current byte position. Two zero bytes terminate the pass: the encoder
//! then either restarts from the top of the payload and reports
//! `StatusMessage { n }` for repeat `n`, or reports `StatusMessage { n: 0 }`
//! and stops.
//!
//! Reads past the end of the payload return zero, so a payload without a
//! terminator ends at the buffer bound.

use crate::consts::{FRAME_BITS, PAYLOAD_LEN};
use crate::message::StatusMessage;

/// Receives progress reports emitted while a payload is consumed.
pub trait StatusSink {
    /// Called at every repeat restart and once at completion. Must not block.
    fn report(&mut self, status: StatusMessage);
}

impl<const N: usize> StatusSink for heapless::Vec<StatusMessage, N> {
    fn report(&mut self, status: StatusMessage) {
        let _ = self.push(status);
    }
}

/// Layout of one framed byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum FrameFormat {
    /// Start bit, the payload byte (seven data bits and parity), stop bit
    #[default]
    SevenBitParityStop,
    /// Start bit, eight data bits, then the low bit of the following byte
    EightBitParity,
}

impl FrameFormat {
    /// Maps the `alternate_format` flag of a configure message.
    pub fn from_alternate(alternate: bool) -> Self {
        if alternate {
            Self::EightBitParity
        } else {
            Self::SevenBitParityStop
        }
    }

    /// Assembles the ten-bit frame for `current`, with `next` the byte after it.
    #[inline]
    pub fn frame(self, current: u8, next: u8) -> u16 {
        let shifted = u16::from(current) << 1;
        match self {
            Self::SevenBitParityStop => shifted | 1,
            Self::EightBitParity => shifted | u16::from(next & 1),
        }
    }

    /// Payload bytes consumed per frame.
    #[inline]
    pub fn stride(self) -> usize {
        match self {
            Self::SevenBitParityStop => 1,
            Self::EightBitParity => 2,
        }
    }
}

/// Coarse state of the encoder, updated once per bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum EncoderState {
    /// No transmission configured
    #[default]
    Idle,
    /// Emitting the bits of the current byte
    Framing,
    /// The last bit of a byte was emitted and the cursor moved on
    Advancing,
    /// A terminator was seen and the payload restarted
    Repeating,
    /// The repeat budget is exhausted
    Done,
}

/// Position of the encoder within the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderCursor {
    /// Bit within the current frame, `0..=9`
    pub bit_position: u8,
    /// Index of the current byte in the payload
    pub byte_position: usize,
    /// Byte being framed
    pub current_byte: u8,
    /// Byte following `current_byte`
    pub next_byte: u8,
    /// Bit currently on air
    pub current_bit: bool,
    /// Tone ticks since the last bit was assembled
    pub sample_counter: u32,
    /// Repeats started so far
    pub repeat_counter: u32,
}

impl EncoderCursor {
    /// A cursor at the top of the payload, primed so that the first tick
    /// assembles a bit.
    pub fn new(samples_per_bit: u32) -> Self {
        Self {
            sample_counter: samples_per_bit,
            ..Self::default()
        }
    }
}

/// Bit-level state machine over a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEncoder {
    cursor: EncoderCursor,
    format: FrameFormat,
    samples_per_bit: u32,
    repeat_count: u32,
    state: EncoderState,
}

impl FrameEncoder {
    /// Creates an encoder at the start of a fresh transmission.
    ///
    /// # Arguments
    /// - `samples_per_bit`: tone ticks per bit
    /// - `repeat_count`: restarts after the first pass
    /// - `format`: byte framing
    pub fn new(samples_per_bit: u32, repeat_count: u32, format: FrameFormat) -> Self {
        Self {
            cursor: EncoderCursor::new(samples_per_bit),
            format,
            samples_per_bit,
            repeat_count,
            state: EncoderState::Framing,
        }
    }

    /// Advances the encoder by one tone tick and returns the bit on air.
    ///
    /// A new bit is assembled when `sample_counter` has reached
    /// `samples_per_bit`; status reports go to `sink` as a side effect.
    #[inline]
    pub fn tick<S: StatusSink>(&mut self, payload: &[u8; PAYLOAD_LEN], sink: &mut S) -> bool {
        if self.cursor.sample_counter >= self.samples_per_bit {
            self.cursor.sample_counter = 0;
            self.assemble_bit(payload, sink);
        }
        self.cursor.sample_counter += 1;
        self.cursor.current_bit
    }

    fn assemble_bit<S: StatusSink>(&mut self, payload: &[u8; PAYLOAD_LEN], sink: &mut S) {
        if self.is_active() {
            self.load_window(payload);
            if (self.cursor.current_byte | self.cursor.next_byte) == 0 {
                self.end_of_pass(payload, sink);
            } else {
                self.state = EncoderState::Framing;
            }
        }

        let framed = self.format.frame(self.cursor.current_byte, self.cursor.next_byte);
        let shift = FRAME_BITS - 1 - self.cursor.bit_position;
        self.cursor.current_bit = (framed >> shift) & 1 != 0;

        if self.cursor.bit_position == FRAME_BITS - 1 {
            self.cursor.bit_position = 0;
            self.cursor.byte_position = self
                .cursor
                .byte_position
                .saturating_add(self.format.stride());
            if self.state == EncoderState::Framing {
                self.state = EncoderState::Advancing;
            }
        } else {
            self.cursor.bit_position += 1;
        }
    }

    fn end_of_pass<S: StatusSink>(&mut self, payload: &[u8; PAYLOAD_LEN], sink: &mut S) {
        if self.cursor.repeat_counter < self.repeat_count {
            self.cursor.bit_position = 0;
            self.cursor.byte_position = 0;
            self.load_window(payload);
            sink.report(StatusMessage {
                n: self.cursor.repeat_counter + 1,
            });
            self.cursor.repeat_counter += 1;
            self.state = EncoderState::Repeating;
        } else {
            sink.report(StatusMessage::COMPLETE);
            self.cursor.current_byte = 0;
            self.cursor.next_byte = 0;
            self.state = EncoderState::Done;
        }
    }

    fn load_window(&mut self, payload: &[u8; PAYLOAD_LEN]) {
        let at = self.cursor.byte_position;
        self.cursor.current_byte = payload.get(at).copied().unwrap_or(0);
        self.cursor.next_byte = at
            .checked_add(1)
            .and_then(|i| payload.get(i))
            .copied()
            .unwrap_or(0);
    }

    fn is_active(&self) -> bool {
        !matches!(self.state, EncoderState::Idle | EncoderState::Done)
    }

    /// Whether the final status report has been emitted.
    pub fn is_done(&self) -> bool {
        self.state == EncoderState::Done
    }

    /// Current state.
    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Current cursor.
    pub fn cursor(&self) -> &EncoderCursor {
        &self.cursor
    }

    /// Byte framing in use.
    pub fn format(&self) -> FrameFormat {
        self.format
    }
}
