//! Messages exchanged between the control core and the baseband core.
//!
//! Every message is a discriminant byte ([`MessageId`]) followed by a fixed,
//! little-endian body. Encoding and decoding are explicit and checked: a
//! record whose length does not match its kind is rejected rather than
//! reinterpreted.
//!
//! ## Wire layout
//!
//! ```text
//! AfskConfigure (534 bytes)
//!   [0]        id = 0x01
//!   [1..513]   payload
//!   [513..517] samples_per_bit  u32
//!   [517..521] phase_inc_mark   u32
//!   [521..525] phase_inc_space  u32
//!   [525..529] repeat           u32
//!   [529..533] bandwidth_scale  i32
//!   [533]      alternate_format u8 (0 or 1)
//!
//! TxProgress (5 bytes)
//!   [0]        id = 0x02
//!   [1..5]     n                u32
//! ```
//!
//! Only the kinds implementing the sealed [`QueueMessage`] trait can be pushed
//! onto a [`MessageQueue`](crate::queue::MessageQueue).

use crate::consts::PAYLOAD_LEN;
use crate::error::MessageError;

/// Discriminant carried in the first byte of every message.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum MessageId {
    /// [`ConfigureMessage`]
    AfskConfigure = 0x01,
    /// [`StatusMessage`]
    TxProgress = 0x02,
}

impl TryFrom<u8> for MessageId {
    type Error = MessageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::AfskConfigure),
            0x02 => Ok(Self::TxProgress),
            other => Err(MessageError::UnknownId(other)),
        }
    }
}

/// A full transmission request: payload plus every timing and format
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigureMessage {
    /// Bytes to transmit, terminated by two consecutive zero bytes
    pub payload: [u8; PAYLOAD_LEN],
    /// Tone ticks per transmitted bit
    pub samples_per_bit: u32,
    /// Tone accumulator increment for a `1` bit
    pub phase_inc_mark: u32,
    /// Tone accumulator increment for a `0` bit
    pub phase_inc_space: u32,
    /// Total number of transmissions requested; the payload is repeated
    /// `repeat - 1` times after the first pass
    pub repeat: u32,
    /// Tone sample to carrier deviation factor
    pub bandwidth_scale: i32,
    /// Selects 8 data bits with a trailing parity bit taken from the next byte
    pub alternate_format: bool,
}

impl Default for ConfigureMessage {
    fn default() -> Self {
        Self {
            payload: [0; PAYLOAD_LEN],
            samples_per_bit: 0,
            phase_inc_mark: 0,
            phase_inc_space: 0,
            repeat: 0,
            bandwidth_scale: 0,
            alternate_format: false,
        }
    }
}

/// Transmission progress report.
///
/// `n == 0` means the transmission completed; `n >= 1` means repeat `n` is
/// starting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct StatusMessage {
    /// Repeat index, or `0` on completion
    pub n: u32,
}

impl StatusMessage {
    /// The final report of a transmission.
    pub const COMPLETE: Self = Self { n: 0 };

    /// Whether this report signals completion.
    pub fn is_complete(&self) -> bool {
        self.n == 0
    }
}

/// Any message that can travel through the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Reconfigure the transmitter
    Configure(ConfigureMessage),
    /// Report progress to the control core
    Status(StatusMessage),
}

impl Message {
    /// Discriminant of this message.
    pub fn id(&self) -> MessageId {
        match self {
            Message::Configure(_) => MessageId::AfskConfigure,
            Message::Status(_) => MessageId::TxProgress,
        }
    }

    /// Decodes a message from a complete record.
    ///
    /// # Errors
    /// - [`MessageError::Empty`] for a zero-length record
    /// - [`MessageError::UnknownId`] for an unrecognised discriminant
    /// - [`MessageError::LengthMismatch`] if the record is not exactly the
    ///   encoded size of its kind
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        let &first = bytes.first().ok_or(MessageError::Empty)?;
        let id = MessageId::try_from(first)?;
        let expected = match id {
            MessageId::AfskConfigure => ConfigureMessage::ENCODED_LEN,
            MessageId::TxProgress => StatusMessage::ENCODED_LEN,
        };
        if bytes.len() != expected {
            return Err(MessageError::LengthMismatch {
                id,
                expected,
                actual: bytes.len(),
            });
        }
        Ok(match id {
            MessageId::AfskConfigure => Message::Configure(ConfigureMessage::decode_body(bytes)),
            MessageId::TxProgress => Message::Status(StatusMessage {
                n: read_u32(bytes, 1),
            }),
        })
    }
}

impl From<ConfigureMessage> for Message {
    fn from(value: ConfigureMessage) -> Self {
        Message::Configure(value)
    }
}

impl From<StatusMessage> for Message {
    fn from(value: StatusMessage) -> Self {
        Message::Status(value)
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::ConfigureMessage {}
    impl Sealed for super::StatusMessage {}
}

/// A message kind that may be pushed onto a queue.
///
/// This trait is sealed: the set of message kinds is closed.
pub trait QueueMessage: sealed::Sealed {
    /// Discriminant written in the first byte
    const ID: MessageId;
    /// Exact encoded size, discriminant included
    const ENCODED_LEN: usize;

    /// Writes the encoded message into `out`, which is exactly
    /// [`ENCODED_LEN`](QueueMessage::ENCODED_LEN) bytes long.
    fn encode(&self, out: &mut [u8]);
}

const CFG_PAYLOAD: usize = 1;
const CFG_SAMPLES_PER_BIT: usize = CFG_PAYLOAD + PAYLOAD_LEN;
const CFG_MARK: usize = CFG_SAMPLES_PER_BIT + 4;
const CFG_SPACE: usize = CFG_MARK + 4;
const CFG_REPEAT: usize = CFG_SPACE + 4;
const CFG_BANDWIDTH: usize = CFG_REPEAT + 4;
const CFG_ALT_FORMAT: usize = CFG_BANDWIDTH + 4;

impl QueueMessage for ConfigureMessage {
    const ID: MessageId = MessageId::AfskConfigure;
    const ENCODED_LEN: usize = CFG_ALT_FORMAT + 1;

    fn encode(&self, out: &mut [u8]) {
        out[0] = Self::ID as u8;
        out[CFG_PAYLOAD..CFG_SAMPLES_PER_BIT].copy_from_slice(&self.payload);
        out[CFG_SAMPLES_PER_BIT..CFG_MARK].copy_from_slice(&self.samples_per_bit.to_le_bytes());
        out[CFG_MARK..CFG_SPACE].copy_from_slice(&self.phase_inc_mark.to_le_bytes());
        out[CFG_SPACE..CFG_REPEAT].copy_from_slice(&self.phase_inc_space.to_le_bytes());
        out[CFG_REPEAT..CFG_BANDWIDTH].copy_from_slice(&self.repeat.to_le_bytes());
        out[CFG_BANDWIDTH..CFG_ALT_FORMAT].copy_from_slice(&self.bandwidth_scale.to_le_bytes());
        out[CFG_ALT_FORMAT] = u8::from(self.alternate_format);
    }
}

impl ConfigureMessage {
    fn decode_body(bytes: &[u8]) -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&bytes[CFG_PAYLOAD..CFG_SAMPLES_PER_BIT]);
        Self {
            payload,
            samples_per_bit: read_u32(bytes, CFG_SAMPLES_PER_BIT),
            phase_inc_mark: read_u32(bytes, CFG_MARK),
            phase_inc_space: read_u32(bytes, CFG_SPACE),
            repeat: read_u32(bytes, CFG_REPEAT),
            bandwidth_scale: read_u32(bytes, CFG_BANDWIDTH) as i32,
            alternate_format: bytes[CFG_ALT_FORMAT] != 0,
        }
    }
}

impl QueueMessage for StatusMessage {
    const ID: MessageId = MessageId::TxProgress;
    const ENCODED_LEN: usize = 5;

    fn encode(&self, out: &mut [u8]) {
        out[0] = Self::ID as u8;
        out[1..5].copy_from_slice(&self.n.to_le_bytes());
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(raw)
}
