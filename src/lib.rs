//! # afsk-baseband
//!
//! A portable, no_std AFSK transmitter core for software-defined-radio baseband
//! co-processors. It synthesises an audio frequency-shift keyed tone, frequency
//! modulates it onto a complex carrier, and writes signed 8-bit I/Q samples into
//! a caller-owned buffer from inside a fixed-rate interrupt.
//!
//! The crate is made of two halves:
//! - a **synthesis pipeline**: frame encoder, phase-accumulator tone synthesizer
//!   and FM/IQ modulator, run once per output sample by [`AfskProcessor`]
//! - a **cross-core transport**: a bounded, mutex-guarded [`MessageQueue`] of
//!   typed messages with a [`Doorbell`](queue::Doorbell) to wake the peer core
//!
//! Configuration travels from the control core as a [`ConfigureMessage`], is
//! validated by the [`ControlInterface`] and handed to the sample callback as a
//! whole [`TransmissionState`] snapshot. Progress travels back as
//! [`StatusMessage`]s: `n >= 1` when repeat `n` starts, `n == 0` on completion.
//!
//! ## Crate features
//! | Feature     | Description |
//! |-------------|-------------|
//! | `std`       | Disables `#![no_std]` and enables the `critical-section` std implementation |
//! | `defmt-0-3` | Uses `defmt` logging |
//! | `log`       | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust
//! use afsk_baseband::control::{ConfigHandoff, ControlInterface};
//! use afsk_baseband::message::Message;
//! use afsk_baseband::modulator::IqSample;
//! use afsk_baseband::processor::AfskProcessor;
//! use afsk_baseband::queue::{MessageQueue, NoDoorbell};
//! use afsk_baseband::tuning::AfskParams;
//!
//! static APPLICATION_QUEUE: MessageQueue<1024> = MessageQueue::new(NoDoorbell);
//!
//! let mut handoff = ConfigHandoff::new();
//! let (producer, consumer) = handoff.split();
//! let mut control = ControlInterface::new(producer);
//! let mut processor = AfskProcessor::new(consumer, &APPLICATION_QUEUE);
//!
//! let message = Message::from(AfskParams::BELL_202.configure(b"HELLO"));
//! control.apply_configuration(&message).unwrap();
//!
//! let mut buffer = [IqSample::default(); 2048];
//! processor.execute(&mut buffer); // Called from the baseband interrupt
//! ```
//!
//! ## Integration Notes
//!
//! - `execute` must not be re-entered; it owns the encoder and accumulators.
//! - The tone and bit logic run at 1/10 of the output sample rate
//!   (228 kHz for a 2.28 MHz baseband).
//! - Only one `ControlInterface` may feed a given processor.
//!
//! --
//! Designed for `#![no_std]` use on the signal-processing core of a dual-core MCU.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod fmt;

pub use critical_section;
pub use heapless;

pub mod consts;
pub mod control;
pub mod error;
pub mod framing;
pub mod message;
pub mod modulator;
pub mod processor;
pub mod queue;
pub mod sine;
pub mod tone;
pub mod tuning;

pub use control::{ControlInterface, TransmissionState};
pub use message::{ConfigureMessage, Message, StatusMessage};
pub use processor::AfskProcessor;
pub use queue::MessageQueue;
