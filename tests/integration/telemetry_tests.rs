//! Sender → link → receiver mirror, end to end on the host.

use crate::mock_hw::{LoopbackRadio, MemStorage, MockHw, RAW_12_5_MV, RecordingSink};

use nitrox::adapters::espnow::deliver_frame;
use nitrox::app::events::{AppEvent, Role};
use nitrox::app::service::{ControlCore, forward_radio_events};
use nitrox::config::{SystemConfig, WireFormat};
use nitrox::events::EventQueue;
use nitrox::fusion::CellId;
use nitrox::telemetry::broadcaster::BroadcastOutcome;
use nitrox::telemetry::wire::{LEGACY_LEN, MAGIC, VERSION};
use nitrox::telemetry::{TelemetryBroadcaster, TelemetryMirror, WireError};

fn running_sender(raw: [i16; 2]) -> (ControlCore, MockHw) {
    let storage = MemStorage::with_calibration([12.5, 12.5]);
    let mut core = ControlCore::new(SystemConfig::default());
    core.start(Role::Sender, &storage, &mut RecordingSink::new());
    let mut hw = MockHw::new(raw, 4095);
    core.tick(&mut hw, 0, &mut RecordingSink::new());
    (core, hw)
}

fn round_trip(format: WireFormat) {
    let (core, _) = running_sender([RAW_12_5_MV, 240]);
    let mut radio = LoopbackRadio::default();
    let mut broadcaster = TelemetryBroadcaster::new(500, format);
    let mirror = TelemetryMirror::new();

    assert_eq!(
        broadcaster.poll(0, &core.snapshot(), &mut radio),
        BroadcastOutcome::Queued
    );
    assert_eq!(radio.frames.len(), 1);

    let received = mirror.accept_frame(&radio.frames[0], format).unwrap();
    assert_eq!(received, core.snapshot());
    assert_eq!(mirror.latest(), Some(core.snapshot()));
}

#[test]
fn versioned_frame_reaches_mirror_intact() {
    round_trip(WireFormat::Versioned);
}

#[test]
fn legacy_frame_reaches_mirror_intact() {
    round_trip(WireFormat::Legacy);
}

#[test]
fn frame_shapes_match_format() {
    let (core, _) = running_sender([RAW_12_5_MV; 2]);

    let mut radio = LoopbackRadio::default();
    TelemetryBroadcaster::new(500, WireFormat::Legacy).poll(0, &core.snapshot(), &mut radio);
    TelemetryBroadcaster::new(500, WireFormat::Versioned).poll(0, &core.snapshot(), &mut radio);

    assert_eq!(radio.frames[0].len(), LEGACY_LEN);
    assert_eq!(&radio.frames[1][..2], &MAGIC);
    assert_eq!(radio.frames[1][2], VERSION);
}

#[test]
fn second_cell_carries_its_own_sample() {
    let (core, _) = running_sender([RAW_12_5_MV, 240]);
    let mut radio = LoopbackRadio::default();
    TelemetryBroadcaster::new(500, WireFormat::Legacy).poll(0, &core.snapshot(), &mut radio);

    let mirror = TelemetryMirror::new();
    let msg = mirror.accept_frame(&radio.frames[0], WireFormat::Legacy).unwrap();
    assert_eq!(msg.cells[CellId::First.index()].average_mv, 12.5);
    assert_eq!(msg.cells[CellId::Second.index()].average_mv, 15.0);
    assert_ne!(
        msg.cells[0].oxygen_percent,
        msg.cells[1].oxygen_percent
    );
}

#[test]
fn broadcast_follows_interval() {
    let (mut core, mut hw) = running_sender([RAW_12_5_MV; 2]);
    let mut radio = LoopbackRadio::default();
    let mut broadcaster = TelemetryBroadcaster::new(500, WireFormat::Versioned);
    let mut sink = RecordingSink::new();

    for t in (0..=1_000).step_by(100) {
        core.tick(&mut hw, t, &mut sink);
        broadcaster.poll(t, &core.snapshot(), &mut radio);
    }
    assert_eq!(radio.frames.len(), 3);
    assert_eq!(broadcaster.queued_count(), 3);
}

#[test]
fn rejected_frame_keeps_last_good_snapshot() {
    let (core, _) = running_sender([RAW_12_5_MV; 2]);
    let mut radio = LoopbackRadio::default();
    TelemetryBroadcaster::new(500, WireFormat::Versioned).poll(0, &core.snapshot(), &mut radio);

    let mirror = TelemetryMirror::new();
    let queue = EventQueue::new();
    deliver_frame(&mirror, &queue, &radio.frames[0], WireFormat::Versioned);

    let mut wrong_version = radio.frames[0].clone();
    wrong_version[2] = VERSION + 1;
    deliver_frame(&mirror, &queue, &wrong_version, WireFormat::Versioned);

    assert_eq!(mirror.latest(), Some(core.snapshot()));
    assert_eq!(
        mirror.last_rejection(),
        Some(WireError::UnsupportedVersion(VERSION + 1))
    );

    let mut sink = RecordingSink::new();
    forward_radio_events(&queue, Some(&mirror), &mut sink);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::TelemetryReceived(_))), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FrameRejected(_))), 1);
    assert!(queue.is_empty());
}
