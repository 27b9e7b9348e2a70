//! Periodic sender side of the telemetry link.

use log::{debug, warn};

use crate::app::ports::RadioPort;
use crate::config::WireFormat;
use crate::error::Error;

use super::wire::{self, MAX_FRAME};
use super::TelemetryMessage;

/// Outcome of one [`TelemetryBroadcaster::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Interval not yet elapsed.
    Idle,
    /// Frame handed to the radio; completion arrives asynchronously.
    Queued,
    /// Encoding or enqueue failed; the next interval is the retry.
    Failed(Error),
}

pub struct TelemetryBroadcaster {
    interval_ms: u32,
    last_sent_ms: Option<u32>,
    format: WireFormat,
    queued: u32,
    failed: u32,
}

impl TelemetryBroadcaster {
    pub fn new(interval_ms: u32, format: WireFormat) -> Self {
        Self {
            interval_ms,
            last_sent_ms: None,
            format,
            queued: 0,
            failed: 0,
        }
    }

    /// `true` once `interval_ms` has elapsed since the last attempt.
    pub fn is_due(&self, now_ms: u32) -> bool {
        self.last_sent_ms
            .is_none_or(|last| now_ms.wrapping_sub(last) >= self.interval_ms)
    }

    /// Encode and broadcast `msg` if the send interval has elapsed.
    pub fn poll(
        &mut self,
        now_ms: u32,
        msg: &TelemetryMessage,
        radio: &mut impl RadioPort,
    ) -> BroadcastOutcome {
        if !self.is_due(now_ms) {
            return BroadcastOutcome::Idle;
        }
        self.last_sent_ms = Some(now_ms);

        match self.send(msg, radio) {
            Ok(len) => {
                self.queued += 1;
                debug!("telemetry: queued {} byte frame", len);
                BroadcastOutcome::Queued
            }
            Err(e) => {
                self.failed += 1;
                warn!("telemetry: send failed: {}", e);
                BroadcastOutcome::Failed(e)
            }
        }
    }

    fn send(&self, msg: &TelemetryMessage, radio: &mut impl RadioPort) -> Result<usize, Error> {
        let frame = wire::encode(msg, self.format)?;
        debug_assert!(frame.len() <= MAX_FRAME);
        radio.broadcast(&frame)?;
        Ok(frame.len())
    }

    pub fn queued_count(&self) -> u32 {
        self.queued
    }

    pub fn failed_count(&self) -> u32 {
        self.failed
    }
}
