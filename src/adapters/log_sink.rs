//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  The `TELEM` line
//! is the textual stand-in for the on-screen display.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::telemetry::TelemetryMessage;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn log_snapshot(tag: &str, t: &TelemetryMessage) {
    info!(
        "{} | O2={:.1}%{} | c1={:.2}mV/{:.1}%{}{} cal={:.2} | \
         c2={:.2}mV/{:.1}%{}{} cal={:.2} | max={}% valve={}",
        tag,
        t.status.oxygen_percent,
        if t.status.is_error { " ERR" } else { "" },
        t.cells[0].average_mv,
        t.cells[0].oxygen_percent,
        if t.cells[0].warning { " WARN" } else { "" },
        if t.cells[0].disabled { " OFF" } else { "" },
        t.calibration[0].mv,
        t.cells[1].average_mv,
        t.cells[1].oxygen_percent,
        if t.cells[1].warning { " WARN" } else { "" },
        if t.cells[1].disabled { " OFF" } else { "" },
        t.calibration[1].mv,
        t.solenoid.ceiling_percent,
        if t.solenoid.is_open { "OPEN" } else { "CLOSED" },
    );
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(role) => info!("START | role={:?}", role),
            AppEvent::CalibrationStarted => info!("CAL   | started"),
            AppEvent::CalibrationCaptured { mv } => {
                info!("CAL   | captured cell1={:.2}mV cell2={:.2}mV", mv[0], mv[1]);
            }
            AppEvent::CalibrationPersistFailed(e) => warn!("CAL   | persist failed: {}", e),
            AppEvent::CalibrationCleared => info!("CAL   | cleared"),
            AppEvent::MenuOpened => info!("MENU  | opened"),
            AppEvent::MenuSelection(item) => {
                info!("MENU  | [{}] {}", item.index(), item.label());
            }
            AppEvent::MenuClosed => info!("MENU  | closed"),
            AppEvent::CellDisableToggled { cell, disabled } => {
                info!(
                    "MENU  | cell{} {}",
                    cell.number(),
                    if *disabled { "disabled" } else { "enabled" }
                );
            }
            AppEvent::SolenoidChanged { open } => {
                info!("VALVE | {}", if *open { "OPEN" } else { "CLOSED" });
            }
            AppEvent::FusionErrorChanged { error } => {
                if *error {
                    warn!("FUSE  | no usable cell");
                } else {
                    info!("FUSE  | recovered");
                }
            }
            AppEvent::Telemetry(t) => log_snapshot("TELEM", t),
            AppEvent::TelemetrySent => info!("LINK  | delivered"),
            AppEvent::TelemetrySendFailed => warn!("LINK  | delivery failed"),
            AppEvent::TelemetryReceived(t) => log_snapshot("RECV ", t),
            AppEvent::FrameRejected(e) => warn!("LINK  | frame rejected: {}", e),
        }
    }
}
