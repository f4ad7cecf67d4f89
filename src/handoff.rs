/// *** Single-slot frame handoff between the acquisition and processing threads. *** //
///
/// Two-phase handshake over one buffered frame, not a queue. The slot walks
/// `Empty -> Filling -> Ready -> Draining -> Empty` forever; the producer can
/// only enter on `Empty` and the consumer only on `Ready`, so a frame is never
/// read while partially written and never overwritten while still being read.
/// Backpressure is automatic: the producer stalls until the consumer releases.
///
/// Access is granted through scoped guards instead of manual lock/unlock
/// pairing. A `WriteSlot` that is dropped without `publish()` rolls the slot
/// back to `Empty`, and a `ReadSlot` always releases on drop, so no code path
/// (including unwinding) can leave the handshake half-released and stall the
/// partner thread.

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::frame::StereoFrame;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    Filling,
    Ready,
    Draining,
}

/// Returned by `acquire_*` once the handoff has been closed. The holder is
/// expected to exit its loop; there will never be another frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandoffClosed;

impl fmt::Display for HandoffClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame handoff closed")
    }
}
impl std::error::Error for HandoffClosed {}

struct Slot {
    state: SlotState,
    closed: bool,
    frame: StereoFrame,
}

pub struct FrameHandoff {
    slot: Mutex<Slot>,
    // Signaled on Empty (producer side) and Ready (consumer side).
    writable: Condvar,
    readable: Condvar,
}

impl FrameHandoff {
    /// Allocates the shared frame storage once; grabs refill it in place.
    pub fn new(width: u32, height: u32) -> FrameHandoff {
        FrameHandoff {
            slot: Mutex::new(Slot {
                state: SlotState::Empty,
                closed: false,
                frame: StereoFrame::new(width, height),
            }),
            writable: Condvar::new(),
            readable: Condvar::new(),
        }
    }

    /// Blocks until the slot is free for writing, then grants exclusive
    /// access. Refused once the handoff is closed.
    pub fn acquire_for_write(&self) -> Result<WriteSlot<'_>, HandoffClosed> {
        let mut slot = self.slot.lock();
        while !slot.closed && slot.state != SlotState::Empty {
            self.writable.wait(&mut slot);
        }
        if slot.closed {
            return Err(HandoffClosed);
        }
        slot.state = SlotState::Filling;
        Ok(WriteSlot { handoff: self, guard: slot, published: false })
    }

    /// Blocks until a frame has been published, then grants exclusive read
    /// access. A frame that was already `Ready` when the handoff closed may
    /// still be drained; after that every call fails.
    pub fn acquire_for_read(&self) -> Result<ReadSlot<'_>, HandoffClosed> {
        let mut slot = self.slot.lock();
        while !slot.closed && slot.state != SlotState::Ready {
            self.readable.wait(&mut slot);
        }
        if slot.state != SlotState::Ready {
            return Err(HandoffClosed);
        }
        slot.state = SlotState::Draining;
        Ok(ReadSlot { handoff: self, guard: slot })
    }

    /// Wakes both sides and makes every pending or future `acquire_*` fail.
    /// Called on shutdown and when either thread dies, so the sibling is
    /// never left blocked on a handshake that will not complete.
    pub fn close(&self) {
        let mut slot = self.slot.lock();
        slot.closed = true;
        self.writable.notify_all();
        self.readable.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }

    pub fn state(&self) -> SlotState {
        self.slot.lock().state
    }
}

/// Exclusive write access to the slot for one fill. `publish()` hands the
/// frame to the consumer; dropping without publishing rolls back to `Empty`
/// (a failed grab must not expose a torn frame).
pub struct WriteSlot<'a> {
    handoff: &'a FrameHandoff,
    guard: MutexGuard<'a, Slot>,
    published: bool,
}

impl WriteSlot<'_> {
    pub fn publish(mut self) {
        self.published = true;
    }
}

impl Deref for WriteSlot<'_> {
    type Target = StereoFrame;
    fn deref(&self) -> &StereoFrame {
        &self.guard.frame
    }
}

impl DerefMut for WriteSlot<'_> {
    fn deref_mut(&mut self) -> &mut StereoFrame {
        &mut self.guard.frame
    }
}

impl Drop for WriteSlot<'_> {
    fn drop(&mut self) {
        debug_assert_eq!(self.guard.state, SlotState::Filling);
        if self.published {
            self.guard.state = SlotState::Ready;
            self.handoff.readable.notify_one();
        } else {
            self.guard.state = SlotState::Empty;
            self.handoff.writable.notify_one();
        }
    }
}

/// Exclusive read access to the published frame. Dropping marks the slot
/// consumed and wakes the producer.
pub struct ReadSlot<'a> {
    handoff: &'a FrameHandoff,
    guard: MutexGuard<'a, Slot>,
}

impl Deref for ReadSlot<'_> {
    type Target = StereoFrame;
    fn deref(&self) -> &StereoFrame {
        &self.guard.frame
    }
}

impl Drop for ReadSlot<'_> {
    fn drop(&mut self) {
        debug_assert_eq!(self.guard.state, SlotState::Draining);
        self.guard.state = SlotState::Empty;
        self.handoff.writable.notify_one();
    }
}
