//! Control interface: turning configure messages into transmission snapshots.
//!
//! The control context and the sample callback never share mutable state.
//! A configuration is validated and copied into a complete
//! [`TransmissionState`], which is then moved whole through a lock-free
//! single-producer/single-consumer [`ConfigHandoff`]. The sample callback
//! drains the handoff at the top of every buffer and adopts the newest
//! snapshot, so it can never observe a half-written configuration.
//!
//! ## Example
//!
//! ```rust
//! use afsk_baseband::control::{ConfigHandoff, ControlInterface};
//! use afsk_baseband::message::Message;
//! use afsk_baseband::tuning::AfskParams;
//!
//! let mut handoff = ConfigHandoff::new();
//! let (producer, mut consumer) = handoff.split();
//! let mut control = ControlInterface::new(producer);
//!
//! let message = Message::from(AfskParams::BELL_202.configure(b"HELLO"));
//! control.apply_configuration(&message).unwrap();
//! assert!(consumer.dequeue().is_some_and(|state| state.configured));
//! ```

use core::fmt;

use heapless::spsc::{Consumer, Producer, Queue};

use crate::consts::{HANDOFF_DEPTH, MAX_MESSAGE_SIZE, PAYLOAD_LEN};
use crate::error::ConfigError;
use crate::framing::{FrameEncoder, FrameFormat};
use crate::message::{ConfigureMessage, Message};
use crate::queue::{Doorbell, MessageQueue};

/// Everything the sample callback needs to run one transmission.
///
/// Replaced wholesale on reconfiguration; never partially updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionState {
    /// Bytes to transmit, terminated by two consecutive zero bytes
    pub payload: [u8; PAYLOAD_LEN],
    /// Tone ticks per bit
    pub samples_per_bit: u32,
    /// Tone increment for a `1` bit
    pub phase_increment_mark: u32,
    /// Tone increment for a `0` bit
    pub phase_increment_space: u32,
    /// Tone sample to carrier deviation factor
    pub bandwidth_scale: i32,
    /// Restarts of the payload after the first pass
    pub repeat_count: u32,
    /// Eight data bits with parity from the following byte
    pub alternate_format: bool,
    /// When false the sample callback leaves its buffer untouched
    pub configured: bool,
}

impl TransmissionState {
    /// The idle state: nothing to send.
    pub const fn unconfigured() -> Self {
        Self {
            payload: [0; PAYLOAD_LEN],
            samples_per_bit: 0,
            phase_increment_mark: 0,
            phase_increment_space: 0,
            bandwidth_scale: 0,
            repeat_count: 0,
            alternate_format: false,
            configured: false,
        }
    }

    /// Builds a configured state from a configure message.
    ///
    /// The message's `repeat` is a total transmission count, so the restart
    /// budget is `repeat - 1`; `0` and `1` both send the payload once.
    ///
    /// # Errors
    /// [`ConfigError::ZeroSamplesPerBit`] if the bit period is zero.
    pub fn from_message(message: &ConfigureMessage) -> Result<Self, ConfigError> {
        if message.samples_per_bit == 0 {
            return Err(ConfigError::ZeroSamplesPerBit);
        }
        Ok(Self {
            payload: message.payload,
            samples_per_bit: message.samples_per_bit,
            phase_increment_mark: message.phase_inc_mark,
            phase_increment_space: message.phase_inc_space,
            bandwidth_scale: message.bandwidth_scale,
            repeat_count: message.repeat.saturating_sub(1),
            alternate_format: message.alternate_format,
            configured: true,
        })
    }

    /// Byte framing selected by this state.
    pub fn format(&self) -> FrameFormat {
        FrameFormat::from_alternate(self.alternate_format)
    }

    /// A fresh encoder positioned at the top of the payload.
    pub fn encoder(&self) -> FrameEncoder {
        if self.configured {
            FrameEncoder::new(self.samples_per_bit, self.repeat_count, self.format())
        } else {
            FrameEncoder::default()
        }
    }
}

impl Default for TransmissionState {
    fn default() -> Self {
        Self::unconfigured()
    }
}

/// Lock-free snapshot handoff from the control context to the sample callback.
pub type ConfigHandoff = Queue<TransmissionState, HANDOFF_DEPTH>;
/// Control-side half of a [`ConfigHandoff`].
pub type ConfigProducer<'a> = Producer<'a, TransmissionState, HANDOFF_DEPTH>;
/// Callback-side half of a [`ConfigHandoff`].
pub type ConfigConsumer<'a> = Consumer<'a, TransmissionState, HANDOFF_DEPTH>;

/// The single writer of transmission configuration.
pub struct ControlInterface<'a> {
    handoff: ConfigProducer<'a>,
    applied: u32,
}

impl<'a> ControlInterface<'a> {
    /// Creates a control interface publishing into `handoff`.
    pub fn new(handoff: ConfigProducer<'a>) -> Self {
        Self {
            handoff,
            applied: 0,
        }
    }

    /// Validates `message` and publishes it as the next transmission.
    ///
    /// The new snapshot preempts any transmission in progress as soon as the
    /// sample callback next runs.
    ///
    /// # Errors
    /// - [`ConfigError::NotConfigure`] for any other message kind
    /// - [`ConfigError::ZeroSamplesPerBit`] for an unusable bit period
    /// - [`ConfigError::HandoffFull`] if the callback has not drained the
    ///   pending snapshots
    ///
    /// In every error case the active transmission is left alone.
    pub fn apply_configuration(&mut self, message: &Message) -> Result<(), ConfigError> {
        let Message::Configure(configure) = message else {
            debug!("ignoring non-configure message");
            return Err(ConfigError::NotConfigure(message.id()));
        };
        let state = TransmissionState::from_message(configure).inspect_err(|_| {
            warn!("rejected configuration with zero samples per bit");
        })?;
        let (samples_per_bit, repeat_count) = (state.samples_per_bit, state.repeat_count);
        self.handoff.enqueue(state).map_err(|_| {
            warn!("configuration handoff full");
            ConfigError::HandoffFull
        })?;
        self.applied = self.applied.wrapping_add(1);
        info!(
            "configured: {} samples/bit, {} repeats",
            samples_per_bit, repeat_count
        );
        Ok(())
    }

    /// Drains `queue`, applying every configure message found.
    ///
    /// Messages of other kinds and undecodable records are dropped.
    ///
    /// # Returns
    /// The number of configurations published.
    pub fn service<const K: usize, D: Doorbell>(&mut self, queue: &MessageQueue<K, D>) -> usize {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let mut published = 0;
        loop {
            match queue.pop(&mut buf) {
                Ok(message) => {
                    if self.apply_configuration(&message).is_ok() {
                        published += 1;
                    }
                }
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(_)) => {
                    warn!("dropped undecodable message");
                }
            }
        }
        published
    }

    /// Total configurations published so far (wrapping).
    pub fn applied(&self) -> u32 {
        self.applied
    }
}

impl fmt::Debug for ControlInterface<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlInterface")
            .field("applied", &self.applied)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::StatusMessage;
    use crate::queue::NoDoorbell;

    fn configure(samples_per_bit: u32, repeat: u32) -> ConfigureMessage {
        let mut msg = ConfigureMessage::default();
        msg.payload[0] = 0x41;
        msg.samples_per_bit = samples_per_bit;
        msg.phase_inc_mark = 100;
        msg.phase_inc_space = 200;
        msg.repeat = repeat;
        msg.bandwidth_scale = 7;
        msg
    }

    #[test]
    fn test_from_message_copies_everything() {
        let state = TransmissionState::from_message(&configure(4, 3)).unwrap();
        assert!(state.configured);
        assert_eq!(state.payload[0], 0x41);
        assert_eq!(state.samples_per_bit, 4);
        assert_eq!(state.phase_increment_mark, 100);
        assert_eq!(state.phase_increment_space, 200);
        assert_eq!(state.bandwidth_scale, 7);
        assert_eq!(state.repeat_count, 2);
        assert_eq!(state.format(), FrameFormat::SevenBitParityStop);
    }

    #[test]
    fn test_repeat_zero_sends_once() {
        let state = TransmissionState::from_message(&configure(4, 0)).unwrap();
        assert_eq!(state.repeat_count, 0);
    }

    #[test]
    fn test_zero_samples_per_bit_rejected() {
        assert_eq!(
            TransmissionState::from_message(&configure(0, 1)),
            Err(ConfigError::ZeroSamplesPerBit)
        );
    }

    #[test]
    fn test_unconfigured_encoder_is_idle() {
        let encoder = TransmissionState::unconfigured().encoder();
        assert_eq!(encoder.state(), crate::framing::EncoderState::Idle);
    }

    #[test]
    fn test_apply_rejects_status_message() {
        let mut handoff = ConfigHandoff::new();
        let (producer, mut consumer) = handoff.split();
        let mut control = ControlInterface::new(producer);
        let msg = Message::Status(StatusMessage { n: 1 });
        assert_eq!(
            control.apply_configuration(&msg),
            Err(ConfigError::NotConfigure(crate::message::MessageId::TxProgress))
        );
        assert!(consumer.dequeue().is_none());
        assert_eq!(control.applied(), 0);
    }

    #[test]
    fn test_apply_reports_full_handoff() {
        let mut handoff = ConfigHandoff::new();
        let (producer, _consumer) = handoff.split();
        let mut control = ControlInterface::new(producer);
        let msg = Message::Configure(configure(4, 1));
        for _ in 0..HANDOFF_DEPTH - 1 {
            assert!(control.apply_configuration(&msg).is_ok());
        }
        assert_eq!(control.apply_configuration(&msg), Err(ConfigError::HandoffFull));
    }

    #[test]
    fn test_service_drains_queue() {
        let queue: MessageQueue<2048> = MessageQueue::new(NoDoorbell);
        assert!(queue.push(&configure(4, 1)).is_ok());
        assert!(queue.push(&StatusMessage { n: 5 }).is_ok());
        assert!(queue.push(&configure(8, 2)).is_ok());

        let mut handoff = ConfigHandoff::new();
        let (producer, mut consumer) = handoff.split();
        let mut control = ControlInterface::new(producer);
        assert_eq!(control.service(&queue), 2);
        assert!(queue.is_empty());
        assert_eq!(consumer.dequeue().map(|s| s.samples_per_bit), Some(4));
        assert_eq!(consumer.dequeue().map(|s| s.samples_per_bit), Some(8));
    }
}
