//! Error types for the message transport and the control path.
//!
//! None of these are fatal: every caller is expected to handle them locally
//! and keep the radio running.

use crate::message::MessageId;
use thiserror::Error;

/// Failure to enqueue a message on a [`MessageQueue`](crate::queue::MessageQueue).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum QueueError {
    /// The ring does not have room for the whole record. Nothing was written.
    #[error("queue full: record needs {needed} bytes, {free} free")]
    Full {
        /// Bytes required, including the length prefix
        needed: usize,
        /// Bytes currently free in the ring
        free: usize,
    },
}

/// Failure to decode a message popped from the queue.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum MessageError {
    /// The record was empty, so there was no discriminant to read.
    #[error("empty message record")]
    Empty,
    /// The discriminant does not name a known message kind.
    #[error("unknown message id {0:#04x}")]
    UnknownId(u8),
    /// The record length does not match the encoded size of its kind.
    #[error("message {id:?} is {actual} bytes, expected {expected}")]
    LengthMismatch {
        /// Kind named by the discriminant
        id: MessageId,
        /// Encoded size of that kind
        expected: usize,
        /// Size of the record
        actual: usize,
    },
}

/// Reasons a configuration was not applied.
///
/// The previously active transmission, if any, stays in effect.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum ConfigError {
    /// The message is not a configure message.
    #[error("message {0:?} is not a configuration")]
    NotConfigure(MessageId),
    /// A bit period of zero samples cannot be clocked.
    #[error("samples per bit must be non-zero")]
    ZeroSamplesPerBit,
    /// The sample callback has not yet taken the pending snapshots.
    #[error("configuration handoff is full")]
    HandoffFull,
}
