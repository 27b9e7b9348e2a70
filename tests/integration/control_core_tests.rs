//! Integration tests for the ControlCore → solenoid / calibration / menu
//! pipeline.
//!
//! These run on the host (x86_64) and drive the core exactly the way the
//! role binaries do: button edges in, commands out, one `tick` per loop
//! iteration, with a virtual clock.

use crate::mock_hw::{
    CEILING_FULL_SCALE, MemStorage, MockClock, MockHw, RAW_12_5_MV, RecordingSink,
};

use nitrox::app::commands::AppCommand;
use nitrox::app::events::{AppEvent, Role};
use nitrox::app::ports::{StorageError, StoragePort, TimePort};
use nitrox::app::service::ControlCore;
use nitrox::config::SystemConfig;
use nitrox::fusion::{AIR_O2_PERCENT, CellId, NO_READING};
use nitrox::menu::{ButtonEdge, MenuItem, MenuMode};

fn calibrated_core(sink: &mut RecordingSink) -> (ControlCore, MemStorage) {
    let storage = MemStorage::with_calibration([12.5, 12.5]);
    let mut core = ControlCore::new(SystemConfig::default());
    core.start(Role::Standalone, &storage, sink);
    (core, storage)
}

fn click(core: &mut ControlCore, at: u32, sink: &mut RecordingSink) -> Option<AppCommand> {
    assert_eq!(core.handle_button(Some(ButtonEdge::Pressed), at, sink), None);
    core.handle_button(Some(ButtonEdge::Released), at + 100, sink)
}

fn long_press(core: &mut ControlCore, at: u32, sink: &mut RecordingSink) -> Option<AppCommand> {
    assert_eq!(core.handle_button(Some(ButtonEdge::Pressed), at, sink), None);
    let cmd = core.handle_button(None, at + 2001, sink);
    assert_eq!(core.handle_button(Some(ButtonEdge::Released), at + 2100, sink), None);
    cmd
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_restores_calibration_and_announces_role() {
    let mut sink = RecordingSink::new();
    let (core, _) = calibrated_core(&mut sink);

    assert_eq!(core.calibration(CellId::First).mv, 12.5);
    assert_eq!(core.calibration(CellId::Second).mv, 12.5);
    assert!(matches!(
        sink.events.first(),
        Some(AppEvent::Started(Role::Standalone))
    ));
}

#[test]
fn air_cells_read_air_after_first_tick() {
    let mut sink = RecordingSink::new();
    let (mut core, _) = calibrated_core(&mut sink);
    let mut hw = MockHw::new([RAW_12_5_MV; 2], 0);

    core.tick(&mut hw, 0, &mut sink);

    let status = core.status();
    assert!(!status.is_error);
    assert!((status.oxygen_percent - AIR_O2_PERCENT).abs() < 1e-4);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::FusionErrorChanged { error: false })),
        1
    );
}

#[test]
fn uncalibrated_boot_reports_error_sentinel() {
    let mut sink = RecordingSink::new();
    let storage = MemStorage::new();
    let mut core = ControlCore::new(SystemConfig::default());
    core.start(Role::Standalone, &storage, &mut sink);
    let mut hw = MockHw::new([RAW_12_5_MV; 2], CEILING_FULL_SCALE);

    core.tick(&mut hw, 0, &mut sink);

    assert!(core.status().is_error);
    assert_eq!(core.status().oxygen_percent, NO_READING);
    assert!(hw.valve_calls.is_empty(), "valve must stay closed without calibration");
}

// ── Calibration capture ───────────────────────────────────────

#[test]
fn short_click_captures_and_persists_calibration() {
    let mut sink = RecordingSink::new();
    let mut storage = MemStorage::new();
    let mut core = ControlCore::new(SystemConfig::default());
    core.start(Role::Standalone, &storage, &mut sink);
    let mut hw = MockHw::new([RAW_12_5_MV; 2], 0);
    let mut clock = MockClock::at(10_000);

    let cmd = click(&mut core, clock.now_ms(), &mut sink);
    assert_eq!(cmd, Some(AppCommand::Calibrate));
    core.handle_command(AppCommand::Calibrate, &mut hw, &mut storage, &mut clock, &mut sink);

    let dwell = SystemConfig::default().calibration_dwell_ms();
    assert!(clock.now_ms().wrapping_sub(10_000) >= dwell);

    assert_eq!(core.calibration(CellId::First).mv, 12.5);
    assert_eq!(core.calibration(CellId::Second).mv, 12.5);
    assert_eq!(storage.get_f32("calibration", "cell1"), Some(12.5));
    assert_eq!(storage.get_f32("calibration", "cell2"), Some(12.5));

    // Fusion is re-run at the end of capture.
    assert!(!core.status().is_error);
    assert!((core.status().oxygen_percent - AIR_O2_PERCENT).abs() < 1e-4);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::CalibrationStarted)), 1);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CalibrationCaptured { mv } if *mv == [12.5, 12.5])),
        1
    );

    // A fresh boot reads the persisted values back.
    let mut rebooted = ControlCore::new(SystemConfig::default());
    rebooted.start(Role::Standalone, &storage, &mut RecordingSink::new());
    assert_eq!(rebooted.calibration(CellId::First).mv, 12.5);
}

#[test]
fn capture_persist_failure_keeps_memory_values() {
    let mut sink = RecordingSink::new();
    let (mut core, mut storage) = calibrated_core(&mut sink);
    storage.fail_writes = true;
    let mut hw = MockHw::new([160, 240], 0);
    let mut clock = MockClock::at(0);

    core.handle_command(AppCommand::Calibrate, &mut hw, &mut storage, &mut clock, &mut sink);

    assert_eq!(core.calibration(CellId::First).mv, 10.0);
    assert_eq!(core.calibration(CellId::Second).mv, 15.0);
    assert_eq!(storage.get_f32("calibration", "cell1"), Some(12.5));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CalibrationPersistFailed(StorageError::IoError))),
        1
    );
}

#[test]
fn solenoid_is_frozen_during_capture() {
    let mut sink = RecordingSink::new();
    let (mut core, mut storage) = calibrated_core(&mut sink);
    let mut hw = MockHw::new([RAW_12_5_MV; 2], CEILING_FULL_SCALE);
    let mut clock = MockClock::at(0);

    core.tick(&mut hw, clock.now_ms(), &mut sink);
    assert_eq!(hw.valve_calls, vec![true]);

    // Ceiling drops to 0 %: the open condition is gone, but capture does
    // not evaluate the valve.
    hw.ceiling_raw = 0;
    core.handle_command(AppCommand::Calibrate, &mut hw, &mut storage, &mut clock, &mut sink);
    assert_eq!(hw.valve_calls, vec![true]);
    assert!(core.solenoid().is_open);

    // First tick after capture: the close delay has long elapsed.
    core.tick(&mut hw, clock.now_ms(), &mut sink);
    assert_eq!(hw.valve_calls, vec![true, false]);
}

// ── Solenoid hysteresis ───────────────────────────────────────

#[test]
fn valve_opens_instantly_and_closes_after_strict_delay() {
    let mut sink = RecordingSink::new();
    let (mut core, _) = calibrated_core(&mut sink);
    let mut hw = MockHw::new([RAW_12_5_MV; 2], CEILING_FULL_SCALE);

    core.tick(&mut hw, 0, &mut sink);
    assert_eq!(core.solenoid().ceiling_percent, 40);
    assert_eq!(hw.valve_calls, vec![true]);

    core.tick(&mut hw, 100, &mut sink);
    hw.ceiling_raw = 0;
    core.tick(&mut hw, 200, &mut sink);
    core.tick(&mut hw, 400, &mut sink);
    assert_eq!(hw.valve_calls, vec![true], "300 ms elapsed is not yet > delay");

    core.tick(&mut hw, 401, &mut sink);
    assert_eq!(hw.valve_calls, vec![true, false]);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SolenoidChanged { .. })),
        2
    );
}

#[test]
fn brief_dip_does_not_close_valve() {
    let mut sink = RecordingSink::new();
    let (mut core, _) = calibrated_core(&mut sink);
    let mut hw = MockHw::new([RAW_12_5_MV; 2], CEILING_FULL_SCALE);

    core.tick(&mut hw, 0, &mut sink);
    hw.ceiling_raw = 0;
    core.tick(&mut hw, 250, &mut sink);
    hw.ceiling_raw = CEILING_FULL_SCALE;
    core.tick(&mut hw, 290, &mut sink);
    hw.ceiling_raw = 0;
    core.tick(&mut hw, 550, &mut sink);

    assert_eq!(hw.valve_calls, vec![true]);
    core.tick(&mut hw, 591, &mut sink);
    assert_eq!(hw.valve_calls, vec![true, false]);
}

#[test]
fn disabling_both_cells_fails_valve_closed() {
    let mut sink = RecordingSink::new();
    let (mut core, mut storage) = calibrated_core(&mut sink);
    let mut hw = MockHw::new([RAW_12_5_MV; 2], CEILING_FULL_SCALE);
    let mut clock = MockClock::at(0);

    core.tick(&mut hw, 0, &mut sink);
    assert!(core.solenoid().is_open);

    for cell in CellId::ALL {
        core.handle_command(AppCommand::ToggleCell(cell), &mut hw, &mut storage, &mut clock, &mut sink);
    }
    core.tick(&mut hw, 50, &mut sink);
    assert!(core.status().is_error);
    assert!(core.solenoid().is_open, "close is still debounced");
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::FusionErrorChanged { error: true })),
        1
    );

    core.tick(&mut hw, 301, &mut sink);
    assert!(!core.solenoid().is_open);
    assert!(!hw.valve_open());
}

// ── Menu flows ────────────────────────────────────────────────

#[test]
fn menu_toggles_first_cell() {
    let mut sink = RecordingSink::new();
    let (mut core, mut storage) = calibrated_core(&mut sink);
    let mut hw = MockHw::new([RAW_12_5_MV, 240], 0);
    let mut clock = MockClock::at(0);
    core.tick(&mut hw, 0, &mut sink);

    assert_eq!(long_press(&mut core, 1_000, &mut sink), None);
    assert_eq!(core.menu().mode, MenuMode::Menu);
    assert_eq!(click(&mut core, 4_000, &mut sink), None);
    assert_eq!(click(&mut core, 5_000, &mut sink), None);
    assert_eq!(core.menu().selected, MenuItem::ToggleCell1);

    let cmd = long_press(&mut core, 6_000, &mut sink);
    assert_eq!(cmd, Some(AppCommand::ToggleCell(CellId::First)));
    assert_eq!(core.menu().mode, MenuMode::Normal);

    core.handle_command(AppCommand::ToggleCell(CellId::First), &mut hw, &mut storage, &mut clock, &mut sink);
    assert!(core.cell(CellId::First).disabled);

    // Only cell 2 (15 mV against 12.5 mV) remains.
    core.tick(&mut hw, 50, &mut sink);
    assert!((core.status().oxygen_percent - 25.08).abs() < 1e-3);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::MenuOpened)), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::MenuSelection(_))), 2);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::MenuClosed)), 1);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::CellDisableToggled { cell: CellId::First, disabled: true }
        )),
        1
    );
}

#[test]
fn menu_selection_wraps_back_to_close() {
    let mut sink = RecordingSink::new();
    let (mut core, _) = calibrated_core(&mut sink);

    long_press(&mut core, 0, &mut sink);
    for i in 0..u32::from(MenuItem::COUNT) {
        click(&mut core, 3_000 + i * 500, &mut sink);
    }
    assert_eq!(core.menu().selected, MenuItem::Close);
    assert_eq!(long_press(&mut core, 10_000, &mut sink), None);
    assert_eq!(core.menu().mode, MenuMode::Normal);
}

#[test]
fn clear_calibration_erases_storage_only() {
    let mut sink = RecordingSink::new();
    let (mut core, mut storage) = calibrated_core(&mut sink);
    let mut hw = MockHw::new([RAW_12_5_MV; 2], 0);
    let mut clock = MockClock::at(0);

    long_press(&mut core, 0, &mut sink);
    click(&mut core, 3_000, &mut sink);
    let cmd = long_press(&mut core, 4_000, &mut sink);
    assert_eq!(cmd, Some(AppCommand::ClearCalibration));

    core.handle_command(AppCommand::ClearCalibration, &mut hw, &mut storage, &mut clock, &mut sink);
    assert!(!storage.exists("calibration", "cell1"));
    assert!(!storage.exists("calibration", "cell2"));
    assert_eq!(core.calibration(CellId::First).mv, 12.5);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::CalibrationCleared)), 1);

    let mut rebooted = ControlCore::new(SystemConfig::default());
    rebooted.start(Role::Standalone, &storage, &mut RecordingSink::new());
    assert_eq!(rebooted.calibration(CellId::First).mv, 0.0);
    assert_eq!(rebooted.calibration(CellId::Second).mv, 0.0);
}

// ── Display cadence ───────────────────────────────────────────

#[test]
fn telemetry_snapshot_follows_display_interval() {
    let mut sink = RecordingSink::new();
    let (mut core, _) = calibrated_core(&mut sink);
    let mut hw = MockHw::new([RAW_12_5_MV; 2], 0);

    for t in (0..=1_000).step_by(50) {
        core.tick(&mut hw, t, &mut sink);
    }
    // t = 0, 500, 1000
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 3);
    assert_eq!(core.tick_count(), 21);
}
