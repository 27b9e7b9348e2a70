//! Callback-to-loop event queue.
//!
//! The radio driver invokes its send / receive callbacks from the WiFi
//! task, not from the control loop.  Those callbacks only push a
//! one-byte [`Event`] here; the loop drains and reports them on its
//! next iteration.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ send cb      │────▶│  EventQueue  │────▶│  Main Loop   │
//! │ recv cb      │────▶│  (lock-free) │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Ring capacity.  One slot stays empty to distinguish full from empty.
pub const EVENT_QUEUE_CAP: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// The link layer reported the last broadcast as delivered.
    SendSucceeded = 0,
    /// The link layer reported the last broadcast as failed.
    SendFailed = 1,
    /// A telemetry frame was received and applied to the mirror.
    FrameReceived = 2,
    /// A received frame failed to decode.
    FrameRejected = 3,
}

impl Event {
    fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::SendSucceeded),
            1 => Some(Self::SendFailed),
            2 => Some(Self::FrameReceived),
            3 => Some(Self::FrameRejected),
            _ => None,
        }
    }
}

/// Lock-free single-producer / single-consumer ring of [`Event`]s.
///
/// Producer: the radio callback context.  Consumer: the control loop.
pub struct EventQueue {
    head: AtomicU8,
    tail: AtomicU8,
    slots: [AtomicU8; EVENT_QUEUE_CAP],
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub const fn new() -> Self {
        Self {
            head: AtomicU8::new(0),
            tail: AtomicU8::new(0),
            slots: [const { AtomicU8::new(0) }; EVENT_QUEUE_CAP],
        }
    }

    /// Push an event.  Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let next_head = (head + 1) % EVENT_QUEUE_CAP as u8;

        if next_head == tail {
            return false;
        }

        self.slots[head as usize].store(event as u8, Ordering::Relaxed);
        self.head.store(next_head, Ordering::Release);
        true
    }

    pub fn pop(&self) -> Option<Event> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        let raw = self.slots[tail as usize].load(Ordering::Relaxed);
        self.tail
            .store((tail + 1) % EVENT_QUEUE_CAP as u8, Ordering::Release);
        Event::from_u8(raw)
    }

    /// Drain all pending events in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Relaxed) == self.head.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Relaxed) as usize;
        let tail = self.tail.load(Ordering::Relaxed) as usize;
        (head + EVENT_QUEUE_CAP - tail) % EVENT_QUEUE_CAP
    }
}

/// Queue shared between the radio callbacks and the control loop.
pub static RADIO_EVENTS: EventQueue = EventQueue::new();
