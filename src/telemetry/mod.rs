//! Telemetry transport.
//!
//! ```text
//!   sender:   ControlCore ──▶ TelemetryBroadcaster ──▶ wire::encode ──▶ RadioPort
//!   receiver: radio rx cb ──▶ wire::decode ──▶ TelemetryMirror (last message wins)
//! ```

pub mod broadcaster;
pub mod mirror;
pub mod wire;

use serde::{Deserialize, Serialize};

use crate::calibration::CellCalibration;
use crate::fusion::{CellSample, SystemStatus};
use crate::solenoid::SolenoidState;

pub use broadcaster::TelemetryBroadcaster;
pub use mirror::TelemetryMirror;
pub use wire::WireError;

/// Aggregate snapshot sent over the link and mirrored on the receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryMessage {
    pub status: SystemStatus,
    pub cells: [CellSample; 2],
    pub calibration: [CellCalibration; 2],
    pub solenoid: SolenoidState,
}
