//! Standalone blender: cells, display log, button menu and solenoid on
//! one board, no radio.
#![deny(unused_must_use)]

use anyhow::Result;
use log::info;

use nitrox::adapters::log_sink::LogEventSink;
use nitrox::app::events::Role;
use nitrox::app::ports::TimePort;
use nitrox::app::service::ControlCore;
use nitrox::board;

const LOOP_PERIOD_MS: u32 = 5;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Nitrox blender v{} (standalone)  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let board::SensingRig {
        mut hw,
        mut button,
        mut clock,
        mut nvs,
        config,
        ..
    } = board::bring_up()?.into_sensing(false)?;

    let mut sink = LogEventSink::new();
    let mut core = ControlCore::new(config);
    core.start(Role::Standalone, &nvs, &mut sink);

    loop {
        let now = clock.now_ms();
        let edge = button.poll(now);
        if let Some(cmd) = core.handle_button(edge, now, &mut sink) {
            core.handle_command(cmd, &mut hw, &mut nvs, &mut clock, &mut sink);
        }
        core.tick(&mut hw, clock.now_ms(), &mut sink);
        clock.sleep_ms(LOOP_PERIOD_MS);
    }
}
