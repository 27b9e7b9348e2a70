//! ESP-NOW broadcast link adapter.
//!
//! Implements [`RadioPort`] for the sender and installs the receive path
//! for the receiver.  Frames go to the broadcast address on one fixed
//! channel, unencrypted, with no pairing.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: WiFi STA bring-up through
//!   `esp_idf_svc::wifi::EspWifi`, then raw `esp_now_*` calls.
//! - **all other targets**: an in-memory loopback that records frames.
//!
//! Driver callbacks run on the WiFi task.  They only touch
//! [`RECEIVER_MIRROR`] and [`RADIO_EVENTS`]; the control loop reports
//! what happened on its next pass.

use core::sync::atomic::{AtomicU8, Ordering};

use log::info;

use crate::app::ports::{RadioError, RadioPort};
use crate::config::WireFormat;
use crate::events::{Event, EventQueue, RADIO_EVENTS};
use crate::telemetry::wire::MAX_FRAME;
use crate::telemetry::TelemetryMirror;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::EspWifi;

pub const BROADCAST_ADDR: [u8; 6] = [0xFF; 6];

/// Snapshot written by the receive callback.
pub static RECEIVER_MIRROR: TelemetryMirror = TelemetryMirror::new();

static RX_FORMAT: AtomicU8 = AtomicU8::new(format_tag(WireFormat::Versioned));

const fn format_tag(format: WireFormat) -> u8 {
    match format {
        WireFormat::Legacy => 0,
        WireFormat::Versioned => 1,
    }
}

fn rx_format() -> WireFormat {
    match RX_FORMAT.load(Ordering::Relaxed) {
        0 => WireFormat::Legacy,
        _ => WireFormat::Versioned,
    }
}

/// Decode a received frame into `mirror` and queue the outcome.
pub fn deliver_frame(mirror: &TelemetryMirror, queue: &EventQueue, bytes: &[u8], format: WireFormat) {
    let event = match mirror.accept_frame(bytes, format) {
        Ok(_) => Event::FrameReceived,
        Err(_) => Event::FrameRejected,
    };
    // Queue overflow only loses the notification; the mirror is already updated.
    let _ = queue.push(event);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn on_send(_mac: *const u8, status: esp_now_send_status_t) {
    let event = if status == esp_now_send_status_t_ESP_NOW_SEND_SUCCESS {
        Event::SendSucceeded
    } else {
        Event::SendFailed
    };
    let _ = RADIO_EVENTS.push(event);
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn on_recv(_info: *const esp_now_recv_info_t, data: *const u8, len: i32) {
    if data.is_null() || len <= 0 {
        return;
    }
    // SAFETY: the driver guarantees `data` points at `len` bytes for the
    // duration of the callback.
    let bytes = unsafe { core::slice::from_raw_parts(data, len as usize) };
    deliver_frame(&RECEIVER_MIRROR, &RADIO_EVENTS, bytes, rx_format());
}

pub struct EspNowAdapter {
    channel: u8,
    sent: u32,
    #[cfg(target_os = "espidf")]
    _wifi: EspWifi<'static>,
    #[cfg(not(target_os = "espidf"))]
    frames: Vec<Vec<u8>>,
}

impl EspNowAdapter {
    /// Start WiFi in STA mode on `channel`, initialise ESP-NOW and
    /// register the broadcast peer.
    #[cfg(target_os = "espidf")]
    pub fn new(
        mut wifi: EspWifi<'static>,
        channel: u8,
        format: WireFormat,
    ) -> Result<Self, RadioError> {
        use esp_idf_svc::wifi::{ClientConfiguration, Configuration};

        RX_FORMAT.store(format_tag(format), Ordering::Relaxed);

        wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))
            .map_err(|e| RadioError::InitFailed(e.code()))?;
        wifi.start().map_err(|e| RadioError::InitFailed(e.code()))?;

        let ret = unsafe { esp_wifi_set_channel(channel, wifi_second_chan_t_WIFI_SECOND_CHAN_NONE) };
        if ret != ESP_OK {
            return Err(RadioError::InitFailed(ret));
        }

        let ret = unsafe { esp_now_init() };
        if ret != ESP_OK {
            return Err(RadioError::InitFailed(ret));
        }
        unsafe {
            esp_now_register_send_cb(Some(on_send));
            esp_now_register_recv_cb(Some(on_recv));
        }

        let peer = esp_now_peer_info_t {
            peer_addr: BROADCAST_ADDR,
            channel,
            ifidx: wifi_interface_t_WIFI_IF_STA,
            encrypt: false,
            ..Default::default()
        };
        let ret = unsafe { esp_now_add_peer(&peer) };
        if ret != ESP_OK {
            return Err(RadioError::PeerRegistrationFailed(ret));
        }

        info!("EspNowAdapter: broadcast link up on channel {}", channel);
        Ok(Self {
            channel,
            sent: 0,
            _wifi: wifi,
        })
    }

    /// Loopback link for host runs.  Every broadcast is recorded.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(channel: u8, format: WireFormat) -> Result<Self, RadioError> {
        RX_FORMAT.store(format_tag(format), Ordering::Relaxed);
        info!("EspNowAdapter: simulation loopback on channel {}", channel);
        Ok(Self {
            channel,
            sent: 0,
            frames: Vec::new(),
        })
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Frames handed to the driver so far.
    pub fn sent_count(&self) -> u32 {
        self.sent
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    /// Feed a frame through the receive path as the driver callback would.
    #[cfg(not(target_os = "espidf"))]
    pub fn inject_received(&self, bytes: &[u8]) {
        deliver_frame(&RECEIVER_MIRROR, &RADIO_EVENTS, bytes, rx_format());
    }
}

impl RadioPort for EspNowAdapter {
    fn broadcast(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        if frame.len() > MAX_FRAME {
            return Err(RadioError::FrameTooLarge(frame.len()));
        }

        #[cfg(target_os = "espidf")]
        {
            let ret = unsafe { esp_now_send(BROADCAST_ADDR.as_ptr(), frame.as_ptr(), frame.len()) };
            if ret != ESP_OK {
                return Err(RadioError::SendFailed(ret));
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.frames.push(frame.to_vec());
            let _ = RADIO_EVENTS.push(Event::SendSucceeded);
        }

        self.sent = self.sent.wrapping_add(1);
        Ok(())
    }
}
