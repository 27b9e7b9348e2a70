//! Control core: the hexagonal center of the blender.
//!
//! [`ControlCore`] is the single context struct that owns every piece of
//! mutable control state (acquisition windows, fused samples,
//! calibration, solenoid, menu).  All I/O flows through port traits
//! injected at call sites, so the whole core runs against mocks on the
//! host.
//!
//! ```text
//!   SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                  │          ControlCore         │
//! ActuatorPort ◀── │ acquire · fuse · solenoid    │ ◀── ButtonEdge
//!  StoragePort ◀─▶ │ calibration · menu           │
//!                  └──────────────────────────────┘
//! ```

use log::{info, warn};

use crate::calibration::{CalibrationManager, CellCalibration};
use crate::config::SystemConfig;
use crate::events::{Event, EventQueue};
use crate::fusion::{CellId, CellSample, Fusion, SystemStatus};
use crate::menu::{ButtonEdge, MenuMachine, MenuOutcome, MenuState};
use crate::sensors::Acquisition;
use crate::solenoid::{SolenoidController, SolenoidState, ValveChange};
use crate::telemetry::{TelemetryMessage, TelemetryMirror};

use super::commands::AppCommand;
use super::events::{AppEvent, Role};
use super::ports::{ActuatorPort, EventSink, SensorPort, StoragePort, TimePort};

pub struct ControlCore {
    config: SystemConfig,
    acquisition: Acquisition,
    fusion: Fusion,
    calibration: CalibrationManager,
    solenoid: SolenoidController,
    menu: MenuMachine,
    fusion_error: bool,
    last_display_ms: Option<u32>,
    tick_count: u64,
}

impl ControlCore {
    pub fn new(config: SystemConfig) -> Self {
        Self {
            acquisition: Acquisition::new(&config),
            fusion: Fusion::new(),
            calibration: CalibrationManager::new(),
            solenoid: SolenoidController::new(&config),
            menu: MenuMachine::new(config.long_press_ms),
            fusion_error: SystemStatus::default().is_error,
            last_display_ms: None,
            tick_count: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Restore persisted calibration and announce the role.
    pub fn start(&mut self, role: Role, storage: &impl StoragePort, sink: &mut impl EventSink) {
        self.calibration.restore(storage);
        sink.emit(&AppEvent::Started(role));
        info!("ControlCore started as {:?}", role);
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one loop iteration: acquire → fuse → ceiling → solenoid →
    /// display cadence.
    ///
    /// `hw` satisfies both [`SensorPort`] and [`ActuatorPort`], which
    /// avoids a double mutable borrow while keeping the boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        now_ms: u32,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        self.acquire(hw, now_ms, sink);

        self.solenoid.set_ceiling_raw(hw.read_ceiling_raw());
        if let Some(change) = self.solenoid.update(&self.fusion.status(), now_ms) {
            let open = change == ValveChange::Opened;
            hw.set_valve(open);
            let status = self.fusion.status();
            info!(
                "solenoid {} (o2={:.1}% ceiling={}% error={})",
                if open { "OPEN" } else { "CLOSED" },
                status.oxygen_percent,
                self.solenoid.state().ceiling_percent,
                status.is_error
            );
            sink.emit(&AppEvent::SolenoidChanged { open });
        }

        if self.display_due(now_ms) {
            sink.emit(&AppEvent::Telemetry(self.snapshot()));
        }
    }

    /// Translate a button edge (or the lack of one) into a command.
    ///
    /// Call every iteration so a held button crosses the long-press
    /// threshold without waiting for release.
    pub fn handle_button(
        &mut self,
        edge: Option<ButtonEdge>,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) -> Option<AppCommand> {
        match self.menu.on_edge(edge, now_ms)? {
            MenuOutcome::Calibrate => Some(AppCommand::Calibrate),
            MenuOutcome::Opened => {
                sink.emit(&AppEvent::MenuOpened);
                None
            }
            MenuOutcome::Selected(item) => {
                sink.emit(&AppEvent::MenuSelection(item));
                None
            }
            MenuOutcome::Execute(item) => {
                info!("menu: executing {:?}", item);
                sink.emit(&AppEvent::MenuClosed);
                AppCommand::from_menu_item(item)
            }
        }
    }

    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        sensors: &mut impl SensorPort,
        storage: &mut impl StoragePort,
        clock: &mut impl TimePort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::Calibrate => self.capture(sensors, storage, clock, sink),
            AppCommand::ClearCalibration => match self.calibration.clear(storage) {
                Ok(()) => {
                    info!("calibration: cleared");
                    sink.emit(&AppEvent::CalibrationCleared);
                }
                Err(e) => warn!("calibration: clear failed: {}", e),
            },
            AppCommand::ToggleCell(cell) => {
                let disabled = self.fusion.toggle_disabled(cell);
                info!("{:?} {}", cell, if disabled { "disabled" } else { "enabled" });
                sink.emit(&AppEvent::CellDisableToggled { cell, disabled });
            }
        }
    }

    /// Blocking calibration capture.
    ///
    /// Warm-up keeps gated acquisition and fusion running; the sampling
    /// phase forces one acquisition per spacing interval; the hold phase
    /// dwells before persisting.  The solenoid is not evaluated while this
    /// runs and keeps its last state.
    pub fn capture(
        &mut self,
        sensors: &mut impl SensorPort,
        storage: &mut impl StoragePort,
        clock: &mut impl TimePort,
        sink: &mut impl EventSink,
    ) {
        info!(
            "calibration: started ({} ms dwell)",
            self.config.calibration_dwell_ms()
        );
        sink.emit(&AppEvent::CalibrationStarted);

        let start = clock.now_ms();
        while clock.now_ms().wrapping_sub(start) < self.config.calibration_warmup_ms {
            let now = clock.now_ms();
            self.acquire(sensors, now, sink);
            clock.sleep_ms(self.config.sample_interval_ms.max(1));
        }

        for _ in 0..self.config.calibration_samples {
            let now = clock.now_ms();
            self.acquisition.force_sample(now, sensors);
            self.refuse(sink);
            clock.sleep_ms(self.config.calibration_sample_spacing_ms);
        }

        let mv = CellId::ALL.map(|cell| self.acquisition.average_mv(cell));
        self.calibration.record(mv, clock.now_ms());
        info!("calibration: captured cell1={:.2} mV cell2={:.2} mV", mv[0], mv[1]);
        sink.emit(&AppEvent::CalibrationCaptured { mv });

        clock.sleep_ms(self.config.calibration_hold_ms);

        if let Err(e) = self.calibration.persist(storage) {
            warn!("calibration: persist failed: {}", e);
            sink.emit(&AppEvent::CalibrationPersistFailed(e));
        }
        self.refuse(sink);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Aggregate snapshot for the display and the radio link.
    pub fn snapshot(&self) -> TelemetryMessage {
        TelemetryMessage {
            status: self.fusion.status(),
            cells: self.fusion.cells(),
            calibration: *self.calibration.cells(),
            solenoid: self.solenoid.state(),
        }
    }

    pub fn status(&self) -> SystemStatus {
        self.fusion.status()
    }

    pub fn cell(&self, cell: CellId) -> &CellSample {
        self.fusion.cell(cell)
    }

    pub fn calibration(&self, cell: CellId) -> &CellCalibration {
        self.calibration.cell(cell)
    }

    pub fn solenoid(&self) -> SolenoidState {
        self.solenoid.state()
    }

    pub fn menu(&self) -> MenuState {
        self.menu.state()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Loop iterations executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn acquire(&mut self, sensors: &mut impl SensorPort, now_ms: u32, sink: &mut impl EventSink) {
        if self.acquisition.sample(now_ms, sensors) {
            self.refuse(sink);
        }
    }

    fn refuse(&mut self, sink: &mut impl EventSink) {
        let status = self.fusion.fuse(&self.acquisition, self.calibration.cells());
        if status.is_error != self.fusion_error {
            self.fusion_error = status.is_error;
            if status.is_error {
                warn!("fusion: no usable cell");
            } else {
                info!("fusion: usable cell available ({:.1}%)", status.oxygen_percent);
            }
            sink.emit(&AppEvent::FusionErrorChanged {
                error: status.is_error,
            });
        }
    }

    fn display_due(&mut self, now_ms: u32) -> bool {
        let due = self
            .last_display_ms
            .is_none_or(|last| now_ms.wrapping_sub(last) >= self.config.display_interval_ms);
        if due {
            self.last_display_ms = Some(now_ms);
        }
        due
    }
}

/// Drain callback events from the radio queue into the sink.
///
/// `mirror` supplies the payload for received / rejected frames on the
/// receiver; the sender passes `None`.
pub fn forward_radio_events(
    queue: &EventQueue,
    mirror: Option<&TelemetryMirror>,
    sink: &mut impl EventSink,
) {
    queue.drain(|event| match event {
        Event::SendSucceeded => sink.emit(&AppEvent::TelemetrySent),
        Event::SendFailed => sink.emit(&AppEvent::TelemetrySendFailed),
        Event::FrameReceived => {
            if let Some(msg) = mirror.and_then(TelemetryMirror::latest) {
                sink.emit(&AppEvent::TelemetryReceived(msg));
            }
        }
        Event::FrameRejected => {
            if let Some(e) = mirror.and_then(TelemetryMirror::last_rejection) {
                sink.emit(&AppEvent::FrameRejected(e));
            }
        }
    });
}
