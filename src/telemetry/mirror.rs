//! Receiver-side mirror of the last accepted telemetry message.
//!
//! Written from the radio receive callback, read from the display loop.
//! The whole snapshot is replaced inside one critical section, so a
//! reader never observes half of one message and half of another.
//! There is no sequencing or staleness tracking: last message wins.

use core::cell::Cell;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use log::{debug, warn};

use crate::config::WireFormat;

use super::wire::{self, WireError};
use super::TelemetryMessage;

pub struct TelemetryMirror {
    latest: Mutex<CriticalSectionRawMutex, Cell<Option<TelemetryMessage>>>,
    last_rejection: Mutex<CriticalSectionRawMutex, Cell<Option<WireError>>>,
    accepted: AtomicU32,
    rejected: AtomicU32,
}

impl Default for TelemetryMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryMirror {
    /// `const` so the mirror can live in a `static` shared with the
    /// receive callback.
    pub const fn new() -> Self {
        Self {
            latest: Mutex::new(Cell::new(None)),
            last_rejection: Mutex::new(Cell::new(None)),
            accepted: AtomicU32::new(0),
            rejected: AtomicU32::new(0),
        }
    }

    /// Decode `bytes` and, if valid, overwrite the mirrored snapshot.
    ///
    /// A rejected frame leaves the previous snapshot untouched.
    pub fn accept_frame(
        &self,
        bytes: &[u8],
        format: WireFormat,
    ) -> Result<TelemetryMessage, WireError> {
        match wire::decode(bytes, format) {
            Ok(msg) => {
                self.store(msg);
                debug!("mirror: accepted {} byte frame", bytes.len());
                Ok(msg)
            }
            Err(e) => {
                self.last_rejection.lock(|cell| cell.set(Some(e)));
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!("mirror: rejected frame: {}", e);
                Err(e)
            }
        }
    }

    pub fn store(&self, msg: TelemetryMessage) {
        self.latest.lock(|cell| cell.set(Some(msg)));
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Last accepted message, `None` until the first frame arrives.
    pub fn latest(&self) -> Option<TelemetryMessage> {
        self.latest.lock(Cell::get)
    }

    /// Decode error of the most recently rejected frame.
    pub fn last_rejection(&self) -> Option<WireError> {
        self.last_rejection.lock(Cell::get)
    }

    pub fn accepted_count(&self) -> u32 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected_count(&self) -> u32 {
        self.rejected.load(Ordering::Relaxed)
    }
}
