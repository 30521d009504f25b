//! Bounded MPSC channel of log envelopes.
//!
//! # Architecture
//!
//! ```text
//! Tasks / ISRs            BoundedChannel            Consumer task
//! ────────────            ──────────────            ─────────────
//!
//! log() ────────────▶ [E0][E1][E2]..[En] ─────────▶ render + write
//! log_from_interrupt()   critical section          blocks when empty
//! never blocks           drop newest if full       sole device owner
//! ```
//!
//! # Rules
//!
//! - Producers never block and never allocate; a full channel drops the
//!   newest envelope and counts it.
//! - Exactly one consumer. It parks when the channel is empty and the next
//!   accepted send reports that it must be woken.
//! - Storage is static (`N` slots); the usable capacity is set once at
//!   initialization and never changes afterwards.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use critical_section::Mutex;

use crate::config::DEFAULT_QUEUE_CAPACITY;
use crate::envelope::Envelope;

/// Result of a non-blocking send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Envelope accepted.
    Queued {
        /// The consumer was parked on an empty channel and needs a wake-up.
        consumer_was_waiting: bool,
    },
    /// Channel full, envelope discarded.
    Dropped,
}

impl SendOutcome {
    #[inline]
    pub fn is_queued(self) -> bool {
        matches!(self, SendOutcome::Queued { .. })
    }

    /// True when the producer must wake the consumer.
    #[inline]
    pub fn wakes_consumer(self) -> bool {
        matches!(self, SendOutcome::Queued { consumer_was_waiting: true })
    }
}

struct Ring<const N: usize> {
    slots: [Envelope; N],
    head: usize,
    len: usize,
    capacity: usize,
    consumer_waiting: bool,
}

impl<const N: usize> Ring<N> {
    fn push(&mut self, envelope: Envelope) -> bool {
        if self.len >= self.capacity {
            return false;
        }
        let tail = (self.head + self.len) % self.capacity;
        self.slots[tail] = envelope;
        self.len += 1;
        true
    }

    fn pop(&mut self) -> Option<Envelope> {
        if self.len == 0 {
            return None;
        }
        let envelope = self.slots[self.head];
        self.head = (self.head + 1) % self.capacity;
        self.len -= 1;
        Some(envelope)
    }
}

/// Fixed-capacity FIFO shared by many producers and one consumer.
///
/// Safe to call from tasks and interrupt handlers: every operation runs
/// inside a `critical_section`, which masks interrupts (and takes the
/// cross-core spinlock on SMP targets) for a handful of instructions.
pub struct BoundedChannel<const N: usize = DEFAULT_QUEUE_CAPACITY> {
    ring: Mutex<RefCell<Ring<N>>>,
    dropped: AtomicU32,
}

impl<const N: usize> BoundedChannel<N> {
    /// Create an empty channel using all `N` slots.
    pub const fn new() -> Self {
        assert!(N > 0, "Channel storage must hold at least one envelope");

        Self {
            ring: Mutex::new(RefCell::new(Ring {
                slots: [Envelope::EMPTY; N],
                head: 0,
                len: 0,
                capacity: N,
                consumer_waiting: false,
            })),
            dropped: AtomicU32::new(0),
        }
    }

    /// Limit the usable capacity to `capacity` slots.
    ///
    /// Only valid while the channel is empty, i.e. during initialization.
    /// Returns `false` if `capacity` is 0, exceeds `N`, or the channel
    /// already holds envelopes.
    pub(crate) fn set_capacity(&self, capacity: usize) -> bool {
        if capacity == 0 || capacity > N {
            return false;
        }
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            if ring.len != 0 {
                return false;
            }
            ring.capacity = capacity;
            ring.head = 0;
            true
        })
    }

    /// Enqueue an envelope without blocking.
    ///
    /// # Timing
    ///
    /// O(1): one slot copy inside a critical section.
    #[inline]
    pub fn try_send(&self, envelope: Envelope) -> SendOutcome {
        let outcome = critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            if !ring.push(envelope) {
                return SendOutcome::Dropped;
            }
            let consumer_was_waiting = core::mem::replace(&mut ring.consumer_waiting, false);
            SendOutcome::Queued { consumer_was_waiting }
        });

        if outcome == SendOutcome::Dropped {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    /// Dequeue the oldest envelope, if any. Never parks the consumer.
    #[inline]
    pub fn try_receive(&self) -> Option<Envelope> {
        critical_section::with(|cs| self.ring.borrow_ref_mut(cs).pop())
    }

    /// Dequeue the oldest envelope, or register the consumer as waiting.
    ///
    /// The emptiness check and the waiting flag are updated in the same
    /// critical section, so a send racing with this call either lands
    /// before it (and is returned) or sees the flag (and wakes the
    /// consumer).
    #[inline]
    pub fn receive_or_park(&self) -> Option<Envelope> {
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            let envelope = ring.pop();
            ring.consumer_waiting = envelope.is_none();
            envelope
        })
    }

    /// Block until an envelope is available.
    ///
    /// `wait` must suspend the caller until the next wake-up and must not
    /// lose a wake-up issued before it was called. Spurious returns are
    /// fine. Only the consumer may call this.
    pub fn receive(&self, mut wait: impl FnMut()) -> Envelope {
        loop {
            if let Some(envelope) = self.receive_or_park() {
                return envelope;
            }
            wait();
        }
    }

    /// Number of envelopes waiting to be rendered.
    #[inline]
    pub fn pending(&self) -> usize {
        critical_section::with(|cs| self.ring.borrow_ref(cs).len)
    }

    #[cfg(test)]
    fn consumer_waiting(&self) -> bool {
        critical_section::with(|cs| self.ring.borrow_ref(cs).consumer_waiting)
    }

    /// Usable capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        critical_section::with(|cs| self.ring.borrow_ref(cs).capacity)
    }

    /// Total envelopes dropped on a full channel (wraps, never reset).
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for BoundedChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}
