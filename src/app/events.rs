//! Outbound application events.
//!
//! The [`ControlCore`](super::service::ControlCore) and the binaries emit
//! these through the [`EventSink`](super::ports::EventSink) port.  Adapters
//! on the other side decide what to do with them: log to serial, draw on
//! a display, and so on.

use crate::app::ports::StorageError;
use crate::fusion::CellId;
use crate::menu::MenuItem;
use crate::telemetry::{TelemetryMessage, WireError};

/// Which firmware image is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Standalone,
    Sender,
    Receiver,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The core has restored its state and is entering the loop.
    Started(Role),

    /// A blocking calibration capture began.
    CalibrationStarted,
    /// Capture finished; carries the new reference voltages per cell.
    CalibrationCaptured { mv: [f32; 2] },
    /// The captured voltages could not be written to storage.
    CalibrationPersistFailed(StorageError),
    /// Persisted calibration was erased.
    CalibrationCleared,

    MenuOpened,
    MenuSelection(MenuItem),
    MenuClosed,
    CellDisableToggled { cell: CellId, disabled: bool },

    /// The solenoid valve changed state.
    SolenoidChanged { open: bool },
    /// The fused estimate entered or left the no-usable-cell state.
    FusionErrorChanged { error: bool },

    /// Display-cadence snapshot (the textual stand-in for the screen).
    Telemetry(TelemetryMessage),
    /// The link layer confirmed delivery of a broadcast.
    TelemetrySent,
    /// The link layer reported a failed broadcast, or it was never queued.
    TelemetrySendFailed,
    /// A frame was received and mirrored.
    TelemetryReceived(TelemetryMessage),
    /// A received frame failed to decode.
    FrameRejected(WireError),
}
