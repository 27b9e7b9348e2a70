//! Sender: the standalone control loop plus periodic telemetry
//! broadcast over ESP-NOW.
#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use nitrox::adapters::log_sink::LogEventSink;
use nitrox::app::events::Role;
use nitrox::app::ports::TimePort;
use nitrox::app::service::{forward_radio_events, ControlCore};
use nitrox::board;
use nitrox::events::RADIO_EVENTS;
use nitrox::telemetry::TelemetryBroadcaster;

const LOOP_PERIOD_MS: u32 = 5;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Nitrox blender v{} (sender)      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let board::SensingRig {
        mut hw,
        mut button,
        mut clock,
        mut nvs,
        config,
        mut radio,
    } = board::bring_up()?.into_sensing(true)?;

    let mut broadcaster = TelemetryBroadcaster::new(config.display_interval_ms, config.wire_format);
    let mut sink = LogEventSink::new();
    let mut core = ControlCore::new(config);
    core.start(Role::Sender, &nvs, &mut sink);

    loop {
        let now = clock.now_ms();
        let edge = button.poll(now);
        if let Some(cmd) = core.handle_button(edge, now, &mut sink) {
            core.handle_command(cmd, &mut hw, &mut nvs, &mut clock, &mut sink);
        }

        let now = clock.now_ms();
        core.tick(&mut hw, now, &mut sink);

        if let Some(link) = radio.as_mut() {
            // Failures are logged by the broadcaster; the next interval retries.
            broadcaster.poll(now, &core.snapshot(), link);
        }
        forward_radio_events(&RADIO_EVENTS, None, &mut sink);

        clock.sleep_ms(LOOP_PERIOD_MS);
    }
}
