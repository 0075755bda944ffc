//! Bounded cross-core message queue.
//!
//! [`MessageQueue`] is a fixed-capacity byte ring of `K` bytes holding
//! length-prefixed message records. Writers serialise on a
//! `critical_section` mutex held only while a record is copied in; readers
//! take the same lock only while a record is copied out, and decode after
//! releasing it.
//!
//! After every successful push the queue rings a [`Doorbell`] so the peer
//! context can wake up and drain. The doorbell is fire-and-forget: consumers
//! check occupancy themselves instead of counting rings.
//!
//! ## Record format
//!
//! ```text
//! [len lo][len hi][id][body ...]
//! ```
//!
//! A push either writes the whole record or nothing, so a full queue never
//! corrupts data already queued.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::OutputPin;
use heapless::Deque;

use crate::consts::{MAX_MESSAGE_SIZE, RECORD_HEADER_LEN};
use crate::error::{MessageError, QueueError};
use crate::framing::StatusSink;
use crate::message::{Message, QueueMessage, StatusMessage};

/// Wakes the peer execution context after a message was queued.
pub trait Doorbell {
    /// Raises the wakeup signal. Must not block.
    fn signal_peer(&self);
}

impl<D: Doorbell + ?Sized> Doorbell for &D {
    fn signal_peer(&self) {
        (**self).signal_peer();
    }
}

/// A doorbell that does nothing, for consumers that poll.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDoorbell;

impl Doorbell for NoDoorbell {
    fn signal_peer(&self) {}
}

/// A doorbell that pulses a GPIO line wired to the peer's interrupt input.
///
/// Pin errors are ignored: a lost pulse only delays the consumer until its
/// next occupancy check.
#[derive(Debug)]
pub struct PinDoorbell<P: OutputPin> {
    pin: Mutex<RefCell<P>>,
}

impl<P: OutputPin> PinDoorbell<P> {
    /// Wraps `pin`. The line is expected to idle low.
    pub const fn new(pin: P) -> Self {
        Self {
            pin: Mutex::new(RefCell::new(pin)),
        }
    }

    /// Returns the wrapped pin.
    pub fn release(self) -> P {
        self.pin.into_inner().into_inner()
    }
}

impl<P: OutputPin> Doorbell for PinDoorbell<P> {
    fn signal_peer(&self) {
        critical_section::with(|cs| {
            let mut pin = self.pin.borrow(cs).borrow_mut();
            let _ = pin.set_high();
            let _ = pin.set_low();
        });
    }
}

/// Fixed-capacity queue of messages, `K` bytes of ring storage.
///
/// # Example
/// ```rust
/// use afsk_baseband::message::{Message, StatusMessage};
/// use afsk_baseband::queue::{MessageQueue, NoDoorbell};
///
/// static APPLICATION_QUEUE: MessageQueue<1024> = MessageQueue::new(NoDoorbell);
///
/// APPLICATION_QUEUE.push(&StatusMessage { n: 1 }).unwrap();
/// let mut buf = [0u8; afsk_baseband::consts::MAX_MESSAGE_SIZE];
/// assert_eq!(
///     APPLICATION_QUEUE.pop(&mut buf),
///     Ok(Message::Status(StatusMessage { n: 1 }))
/// );
/// ```
#[derive(Debug)]
pub struct MessageQueue<const K: usize, D: Doorbell = NoDoorbell> {
    fifo: Mutex<RefCell<Deque<u8, K>>>,
    doorbell: D,
}

impl<const K: usize, D: Doorbell> MessageQueue<K, D> {
    /// Creates an empty queue ringing `doorbell` on every successful push.
    pub const fn new(doorbell: D) -> Self {
        Self {
            fifo: Mutex::new(RefCell::new(Deque::new())),
            doorbell,
        }
    }

    /// Enqueues `message` and rings the doorbell.
    ///
    /// Message kinds larger than [`MAX_MESSAGE_SIZE`] fail to compile.
    ///
    /// # Errors
    /// [`QueueError::Full`] if the record does not fit; the queue is left
    /// unchanged and the doorbell is not rung. Never blocks on a consumer.
    pub fn push<T: QueueMessage>(&self, message: &T) -> Result<(), QueueError> {
        const {
            assert!(
                T::ENCODED_LEN <= MAX_MESSAGE_SIZE,
                "MAX_MESSAGE_SIZE too small for message type"
            )
        };
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let record = &mut buf[..T::ENCODED_LEN];
        message.encode(record);
        self.push_record(record)?;
        self.doorbell.signal_peer();
        Ok(())
    }

    fn push_record(&self, record: &[u8]) -> Result<(), QueueError> {
        let needed = RECORD_HEADER_LEN + record.len();
        critical_section::with(|cs| {
            let mut fifo = self.fifo.borrow(cs).borrow_mut();
            let free = K - fifo.len();
            if needed > free {
                return Err(QueueError::Full { needed, free });
            }
            let header = (record.len() as u16).to_le_bytes();
            for &byte in header.iter().chain(record) {
                let _ = fifo.push_back(byte);
            }
            Ok(())
        })
    }

    /// Dequeues the oldest message, using `buf` as scratch space.
    ///
    /// # Errors
    /// - `nb::Error::WouldBlock` if the queue is empty
    /// - `nb::Error::Other` if the record does not decode; the record is
    ///   consumed either way
    pub fn pop(&self, buf: &mut [u8; MAX_MESSAGE_SIZE]) -> nb::Result<Message, MessageError> {
        let len = critical_section::with(|cs| {
            let mut fifo = self.fifo.borrow(cs).borrow_mut();
            let lo = fifo.pop_front()?;
            let hi = fifo.pop_front()?;
            let len = u16::from_le_bytes([lo, hi]) as usize;
            for i in 0..len {
                let byte = fifo.pop_front()?;
                if let Some(slot) = buf.get_mut(i) {
                    *slot = byte;
                }
            }
            Some(len.min(MAX_MESSAGE_SIZE))
        })
        .ok_or(nb::Error::WouldBlock)?;
        Message::decode(&buf[..len]).map_err(nb::Error::Other)
    }

    /// Number of bytes currently queued, record headers included.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.fifo.borrow(cs).borrow().len())
    }

    /// Whether no records are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of free bytes in the ring.
    pub fn free(&self) -> usize {
        K - self.len()
    }

    /// Total ring capacity in bytes.
    pub const fn capacity(&self) -> usize {
        K
    }

    /// The doorbell rung after each push.
    pub fn doorbell(&self) -> &D {
        &self.doorbell
    }
}

impl<const K: usize, D: Doorbell> StatusSink for &MessageQueue<K, D> {
    fn report(&mut self, status: StatusMessage) {
        if self.push(&status).is_err() {
            warn!("status n={} dropped: queue full", status.n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ConfigureMessage;
    use core::cell::Cell;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[derive(Default)]
    struct CountingDoorbell {
        rings: Cell<u32>,
    }

    impl Doorbell for CountingDoorbell {
        fn signal_peer(&self) {
            self.rings.set(self.rings.get() + 1);
        }
    }

    #[test]
    fn test_push_pop_fifo_order() {
        let queue: MessageQueue<64> = MessageQueue::new(NoDoorbell);
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        for n in 1..=4 {
            assert!(queue.push(&StatusMessage { n }).is_ok());
        }
        assert_eq!(queue.len(), 4 * 7);
        for n in 1..=4 {
            assert_eq!(queue.pop(&mut buf), Ok(Message::Status(StatusMessage { n })));
        }
        assert_eq!(queue.pop(&mut buf), Err(nb::Error::WouldBlock));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_rejects_without_corruption() {
        let doorbell = CountingDoorbell::default();
        let queue: MessageQueue<16, &CountingDoorbell> = MessageQueue::new(&doorbell);
        assert!(queue.push(&StatusMessage { n: 1 }).is_ok());
        assert!(queue.push(&StatusMessage { n: 2 }).is_ok());
        assert_eq!(
            queue.push(&StatusMessage { n: 3 }),
            Err(QueueError::Full { needed: 7, free: 2 })
        );
        assert_eq!(doorbell.rings.get(), 2);

        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        assert_eq!(queue.pop(&mut buf), Ok(Message::Status(StatusMessage { n: 1 })));
        assert_eq!(queue.pop(&mut buf), Ok(Message::Status(StatusMessage { n: 2 })));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_configure_message_round_trips_through_ring() {
        let queue: MessageQueue<1024> = MessageQueue::new(NoDoorbell);
        let mut msg = ConfigureMessage::default();
        msg.payload[..3].copy_from_slice(b"ABC");
        msg.samples_per_bit = 190;
        msg.repeat = 3;
        assert!(queue.push(&msg).is_ok());
        assert_eq!(queue.capacity(), 1024);
        assert_eq!(queue.free(), queue.capacity() - 536);

        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        assert_eq!(queue.pop(&mut buf), Ok(Message::Configure(msg)));
    }

    #[test]
    fn test_configure_message_does_not_fit_small_ring() {
        let queue: MessageQueue<256> = MessageQueue::new(NoDoorbell);
        assert!(matches!(
            queue.push(&ConfigureMessage::default()),
            Err(QueueError::Full { needed: 536, .. })
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pin_doorbell_pulses_on_push() {
        let pin = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let queue: MessageQueue<32, PinDoorbell<PinMock>> =
            MessageQueue::new(PinDoorbell::new(pin));
        assert!(queue.push(&StatusMessage { n: 0 }).is_ok());
        let mut pin = queue.doorbell.release();
        pin.done();
    }

    #[test]
    fn test_status_sink_drops_when_full() {
        let queue: MessageQueue<8> = MessageQueue::new(NoDoorbell);
        let mut sink = &queue;
        sink.report(StatusMessage { n: 1 });
        sink.report(StatusMessage { n: 2 });
        assert_eq!(queue.len(), 7);
    }
}
