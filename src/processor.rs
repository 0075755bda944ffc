//! The per-buffer sample callback.
//!
//! [`AfskProcessor::execute`] is meant to be called from the baseband
//! interrupt with a buffer of [`IqSample`]s to fill. Every output sample runs
//! the FM modulator; every [`TONE_DIVIDER`]th sample also clocks the frame
//! encoder and the tone oscillator.
//!
//! ```text
//!   ConfigHandoff ──▶ TransmissionState
//!                          │
//!   every 10th sample:  FrameEncoder ──bit──▶ ToneSynth
//!                          │ status                │ tone sample
//!                          ▼                       ▼
//!                     StatusSink             FmModulator ──▶ buffer[i]
//! ```
//!
//! The callback never blocks, allocates or takes a lock of its own. Status
//! reports are pushed through the [`StatusSink`], which for a
//! [`MessageQueue`](crate::queue::MessageQueue) holds its critical section only
//! for the few bytes of a status record.

use core::fmt;

use crate::consts::TONE_DIVIDER;
use crate::control::{ConfigConsumer, TransmissionState};
use crate::error::ConfigError;
use crate::framing::{EncoderCursor, EncoderState, FrameEncoder, StatusSink};
use crate::message::Message;
use crate::modulator::{FmModulator, IqSample};
use crate::tone::ToneSynth;

/// AFSK transmitter driven one buffer at a time.
pub struct AfskProcessor<'a, S: StatusSink> {
    handoff: ConfigConsumer<'a>,
    status: S,
    state: TransmissionState,
    encoder: FrameEncoder,
    tone: ToneSynth,
    fm: FmModulator,
    divider: u32,
}

impl<'a, S: StatusSink> AfskProcessor<'a, S> {
    /// Creates an unconfigured processor.
    ///
    /// # Arguments
    /// - `handoff`: consumer half of the configuration handoff
    /// - `status`: where progress reports go, usually the application queue
    pub fn new(handoff: ConfigConsumer<'a>, status: S) -> Self {
        Self {
            handoff,
            status,
            state: TransmissionState::unconfigured(),
            encoder: FrameEncoder::default(),
            tone: ToneSynth::new(),
            fm: FmModulator::new(),
            divider: TONE_DIVIDER - 1,
        }
    }

    /// Fills `buffer` with modulated samples.
    ///
    /// Adopts the newest pending configuration first. When nothing is
    /// configured the buffer is left untouched. If the transmission completes
    /// part way through, the rest of the buffer is still synthesised and the
    /// next call becomes a no-op.
    pub fn execute(&mut self, buffer: &mut [IqSample]) {
        self.adopt_pending();
        if !self.state.configured {
            return;
        }

        for sample in buffer.iter_mut() {
            if self.divider >= TONE_DIVIDER - 1 {
                self.divider = 0;
                let bit = self.encoder.tick(&self.state.payload, &mut self.status);
                if self.encoder.is_done() {
                    self.state.configured = false;
                }
                self.tone.advance_bit(
                    bit,
                    self.state.phase_increment_mark,
                    self.state.phase_increment_space,
                );
            } else {
                self.divider += 1;
            }
            *sample = self.fm.modulate(self.tone.sample(), self.state.bandwidth_scale);
        }
    }

    /// Applies a configure message directly, for dispatchers running in the
    /// same context as [`execute`](Self::execute).
    ///
    /// Snapshots still pending in the handoff are older than `message`, so
    /// they are discarded once it is accepted.
    ///
    /// # Errors
    /// See [`ControlInterface::apply_configuration`](crate::control::ControlInterface::apply_configuration);
    /// the handoff is bypassed so it never reports full. On error the pending
    /// snapshots are left alone.
    pub fn on_message(&mut self, message: &Message) -> Result<(), ConfigError> {
        let Message::Configure(configure) = message else {
            return Err(ConfigError::NotConfigure(message.id()));
        };
        let state = TransmissionState::from_message(configure)?;
        while self.handoff.dequeue().is_some() {}
        self.load(state);
        Ok(())
    }

    fn adopt_pending(&mut self) {
        let mut latest = None;
        while let Some(state) = self.handoff.dequeue() {
            latest = Some(state);
        }
        if let Some(state) = latest {
            self.load(state);
        }
    }

    fn load(&mut self, state: TransmissionState) {
        self.encoder = state.encoder();
        self.state = state;
        // First sample of the next buffer clocks the encoder
        self.divider = TONE_DIVIDER - 1;
    }

    /// Whether the configuration currently in use is still transmitting.
    ///
    /// Snapshots published through the handoff only take effect at the next
    /// [`execute`](Self::execute), so this stays false right after
    /// [`ControlInterface::apply_configuration`](crate::control::ControlInterface::apply_configuration)
    /// until the callback has run.
    pub fn is_configured(&self) -> bool {
        self.state.configured
    }

    /// State of the frame encoder.
    pub fn encoder_state(&self) -> EncoderState {
        self.encoder.state()
    }

    /// Position of the frame encoder.
    pub fn cursor(&self) -> &EncoderCursor {
        self.encoder.cursor()
    }

    /// The active transmission parameters.
    pub fn state(&self) -> &TransmissionState {
        &self.state
    }

    /// The status sink.
    pub fn status(&self) -> &S {
        &self.status
    }
}

impl<S: StatusSink> fmt::Debug for AfskProcessor<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AfskProcessor")
            .field("configured", &self.state.configured)
            .field("encoder", &self.encoder)
            .field("tone", &self.tone)
            .field("fm", &self.fm)
            .field("divider", &self.divider)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ConfigHandoff, ControlInterface};
    use crate::message::{ConfigureMessage, StatusMessage};
    use heapless::Vec;

    type Reports = Vec<StatusMessage, 16>;

    fn configure(payload: &[u8], samples_per_bit: u32, repeat: u32) -> Message {
        let mut msg = ConfigureMessage::default();
        msg.payload[..payload.len()].copy_from_slice(payload);
        msg.samples_per_bit = samples_per_bit;
        msg.phase_inc_mark = 1 << 22;
        msg.phase_inc_space = 1 << 23;
        msg.repeat = repeat;
        msg.bandwidth_scale = 100;
        Message::Configure(msg)
    }

    #[test]
    fn test_unconfigured_execute_leaves_buffer() {
        let mut handoff = ConfigHandoff::new();
        let (_producer, consumer) = handoff.split();
        let mut processor = AfskProcessor::new(consumer, Reports::new());
        let mut buffer = [IqSample::new(9, 9); 32];
        processor.execute(&mut buffer);
        assert!(buffer.iter().all(|&s| s == IqSample::new(9, 9)));
        assert!(!processor.is_configured());
    }

    #[test]
    fn test_first_sample_after_configure_clocks_encoder() {
        let mut handoff = ConfigHandoff::new();
        let (producer, consumer) = handoff.split();
        let mut control = ControlInterface::new(producer);
        let mut processor = AfskProcessor::new(consumer, Reports::new());

        control
            .apply_configuration(&configure(&[0x41], 4, 1))
            .unwrap();
        let mut buffer = [IqSample::default(); 1];
        processor.execute(&mut buffer);
        assert!(processor.is_configured());
        assert_eq!(processor.cursor().bit_position, 1);
        assert_eq!(processor.cursor().sample_counter, 1);
        assert_eq!(processor.encoder_state(), EncoderState::Framing);
    }

    #[test]
    fn test_encoder_clocked_every_tenth_sample() {
        let mut handoff = ConfigHandoff::new();
        let (_producer, consumer) = handoff.split();
        let mut processor = AfskProcessor::new(consumer, Reports::new());
        processor.on_message(&configure(&[0x41], 1, 1)).unwrap();

        let mut buffer = [IqSample::default(); 10];
        processor.execute(&mut buffer);
        assert_eq!(processor.cursor().bit_position, 1);
        let mut buffer = [IqSample::default(); 1];
        processor.execute(&mut buffer);
        assert_eq!(processor.cursor().bit_position, 2);
    }

    #[test]
    fn test_transmission_completes_and_goes_idle() {
        let mut handoff = ConfigHandoff::new();
        let (_producer, consumer) = handoff.split();
        let mut processor = AfskProcessor::new(consumer, Reports::new());
        processor.on_message(&configure(&[0x41], 1, 2)).unwrap();

        let mut buffer = [IqSample::default(); 64];
        for _ in 0..20 {
            processor.execute(&mut buffer);
        }
        assert!(!processor.is_configured());
        assert_eq!(
            processor.status().as_slice(),
            &[StatusMessage { n: 1 }, StatusMessage::COMPLETE]
        );

        let mut idle = [IqSample::new(1, 2); 8];
        processor.execute(&mut idle);
        assert!(idle.iter().all(|&s| s == IqSample::new(1, 2)));
    }

    #[test]
    fn test_new_configuration_preempts() {
        let mut handoff = ConfigHandoff::new();
        let (producer, consumer) = handoff.split();
        let mut control = ControlInterface::new(producer);
        let mut processor = AfskProcessor::new(consumer, Reports::new());

        control
            .apply_configuration(&configure(b"ABCDEFGH", 1, 1))
            .unwrap();
        let mut buffer = [IqSample::default(); 200];
        processor.execute(&mut buffer);
        assert!(processor.cursor().byte_position > 0);

        control
            .apply_configuration(&configure(b"Z", 3, 1))
            .unwrap();
        control
            .apply_configuration(&configure(b"Y", 5, 1))
            .unwrap();
        let mut buffer = [IqSample::default(); 1];
        processor.execute(&mut buffer);
        assert_eq!(processor.state().samples_per_bit, 5);
        assert_eq!(processor.state().payload[0], b'Y');
        assert_eq!(processor.cursor().byte_position, 0);
        assert!(processor.status().is_empty());
    }

    #[test]
    fn test_direct_configuration_supersedes_pending_snapshot() {
        let mut handoff = ConfigHandoff::new();
        let (producer, consumer) = handoff.split();
        let mut control = ControlInterface::new(producer);
        let mut processor = AfskProcessor::new(consumer, Reports::new());

        control.apply_configuration(&configure(b"A", 2, 1)).unwrap();
        processor.on_message(&configure(b"B", 3, 1)).unwrap();
        let mut buffer = [IqSample::default(); 1];
        processor.execute(&mut buffer);
        assert_eq!(processor.state().payload[0], b'B');
        assert_eq!(processor.state().samples_per_bit, 3);

        // Anything published afterwards is newer and wins again
        control.apply_configuration(&configure(b"C", 4, 1)).unwrap();
        processor.execute(&mut buffer);
        assert_eq!(processor.state().payload[0], b'C');
    }

    #[test]
    fn test_rejected_direct_message_keeps_pending_snapshot() {
        let mut handoff = ConfigHandoff::new();
        let (producer, consumer) = handoff.split();
        let mut control = ControlInterface::new(producer);
        let mut processor = AfskProcessor::new(consumer, Reports::new());

        control.apply_configuration(&configure(b"A", 2, 1)).unwrap();
        assert_eq!(
            processor.on_message(&configure(b"B", 0, 1)),
            Err(ConfigError::ZeroSamplesPerBit)
        );
        let mut buffer = [IqSample::default(); 1];
        processor.execute(&mut buffer);
        assert!(processor.is_configured());
        assert_eq!(processor.state().payload[0], b'A');
    }

    #[test]
    fn test_rejected_message_keeps_active_state() {
        let mut handoff = ConfigHandoff::new();
        let (_producer, consumer) = handoff.split();
        let mut processor = AfskProcessor::new(consumer, Reports::new());
        processor.on_message(&configure(b"AB", 2, 1)).unwrap();
        assert!(
            processor
                .on_message(&Message::Status(StatusMessage { n: 3 }))
                .is_err()
        );
        assert_eq!(
            processor.on_message(&configure(b"CD", 0, 1)),
            Err(ConfigError::ZeroSamplesPerBit)
        );
        assert!(processor.is_configured());
        assert_eq!(processor.state().payload[0], b'A');
    }
}
