//! Receiver: mirrors the sender's telemetry and logs it at the display
//! cadence.  No sensors, no valve.
#![deny(unused_must_use)]

use anyhow::Result;
use log::{info, warn};

use nitrox::adapters::espnow::RECEIVER_MIRROR;
use nitrox::adapters::log_sink::LogEventSink;
use nitrox::app::events::{AppEvent, Role};
use nitrox::app::ports::{EventSink, TimePort};
use nitrox::app::service::forward_radio_events;
use nitrox::board;
use nitrox::events::RADIO_EVENTS;

const LOOP_PERIOD_MS: u32 = 20;

/// Forwards only rejections; accepted frames are shown at the display
/// cadence instead of once per frame.
struct RejectionsOnly<'a>(&'a mut LogEventSink);

impl EventSink for RejectionsOnly<'_> {
    fn emit(&mut self, event: &AppEvent) {
        if matches!(event, AppEvent::FrameRejected(_)) {
            self.0.emit(event);
        }
    }
}

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Nitrox blender v{} (receiver)    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let board::ListeningRig {
        mut clock,
        config,
        radio,
    } = board::bring_up()?.into_listening()?;
    if radio.is_none() {
        warn!("receiver running without a link; nothing will be mirrored");
    }

    let mut sink = LogEventSink::new();
    sink.emit(&AppEvent::Started(Role::Receiver));

    let mut last_display: Option<u32> = None;
    loop {
        forward_radio_events(&RADIO_EVENTS, Some(&RECEIVER_MIRROR), &mut RejectionsOnly(&mut sink));

        let now = clock.now_ms();
        if last_display.is_none_or(|t| now.wrapping_sub(t) >= config.display_interval_ms) {
            last_display = Some(now);
            match RECEIVER_MIRROR.latest() {
                Some(msg) => sink.emit(&AppEvent::TelemetryReceived(msg)),
                None => info!("RECV  | waiting for sender"),
            }
        }

        clock.sleep_ms(LOOP_PERIOD_MS);
    }
}
