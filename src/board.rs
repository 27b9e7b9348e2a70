//! LilyGO T-Display-S3 bring-up shared by all three roles.
//!
//! [`bring_up`] runs the parts every role needs (GPIO / ADC init, NVS,
//! config).  The resulting [`Board`] is then consumed into either the
//! sensing rig (standalone, sender) or the listening rig (receiver).

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::wifi::EspWifi;

use crate::adapters::espnow::EspNowAdapter;
use crate::adapters::hardware::HardwareAdapter;
use crate::adapters::nvs::NvsAdapter;
use crate::adapters::time::Esp32TimeAdapter;
use crate::app::ports::{ConfigPort, RadioError};
use crate::config::{RadioInitPolicy, SystemConfig};
use crate::drivers::button::ButtonDriver;
use crate::drivers::hw_init;
use crate::drivers::solenoid::SolenoidDriver;
use crate::pins;
use crate::sensors::ads1115::{Ads1115, DEFAULT_ADDRESS};

pub type CellBus = I2cDriver<'static>;
pub type BoardHardware = HardwareAdapter<CellBus, FreeRtos>;

pub struct Board {
    pub nvs: NvsAdapter,
    pub config: SystemConfig,
    pub clock: Esp32TimeAdapter,
    peripherals: Peripherals,
    sysloop: EspSystemEventLoop,
}

/// Everything a role that reads the cells needs.
pub struct SensingRig {
    pub hw: BoardHardware,
    pub button: ButtonDriver,
    pub clock: Esp32TimeAdapter,
    pub nvs: NvsAdapter,
    pub config: SystemConfig,
    pub radio: Option<EspNowAdapter>,
}

/// The receiver only listens.
pub struct ListeningRig {
    pub clock: Esp32TimeAdapter,
    pub config: SystemConfig,
    pub radio: Option<EspNowAdapter>,
}

pub fn bring_up() -> Result<Board> {
    if let Err(e) = hw_init::init_peripherals() {
        // Valve GPIO state is unknown without init; refuse to run.
        error!("HAL init failed: {}", e);
        return Err(anyhow::anyhow!("peripheral init failed: {}", e));
    }

    let nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {}", e))?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    info!(
        "config: close_delay={}ms long_press={}ms wire={:?}",
        config.close_delay_ms, config.long_press_ms, config.wire_format
    );

    Ok(Board {
        nvs,
        config,
        clock: Esp32TimeAdapter::new(),
        peripherals: Peripherals::take()?,
        sysloop: EspSystemEventLoop::take()?,
    })
}

impl Board {
    /// Build the cell amplifier, valve and button; optionally the radio.
    pub fn into_sensing(self, with_radio: bool) -> Result<SensingRig> {
        let Board {
            nvs,
            config,
            clock,
            peripherals,
            sysloop,
        } = self;

        // gpio18 / gpio17 are pins::I2C_SDA_GPIO / pins::I2C_SCL_GPIO.
        let i2c_config = I2cConfig::new().baudrate(pins::I2C_BAUDRATE_HZ.Hz().into());
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio18,
            peripherals.pins.gpio17,
            &i2c_config,
        )?;
        let adc = Ads1115::new(i2c, FreeRtos, DEFAULT_ADDRESS);
        let hw = HardwareAdapter::new(adc, SolenoidDriver::new());
        let button = ButtonDriver::new(pins::BUTTON_GPIO, config.button_debounce_ms);

        let radio = if with_radio {
            start_radio(peripherals.modem, sysloop, &config)?
        } else {
            None
        };

        Ok(SensingRig {
            hw,
            button,
            clock,
            nvs,
            config,
            radio,
        })
    }

    pub fn into_listening(self) -> Result<ListeningRig> {
        let radio = start_radio(self.peripherals.modem, self.sysloop, &self.config)?;
        Ok(ListeningRig {
            clock: self.clock,
            config: self.config,
            radio,
        })
    }
}

/// Bring the link up, applying the configured failure policy.
///
/// `Ok(None)` means the radio failed and the role keeps running without it.
fn start_radio(
    modem: esp_idf_svc::hal::modem::Modem,
    sysloop: EspSystemEventLoop,
    config: &SystemConfig,
) -> Result<Option<EspNowAdapter>> {
    let result = EspWifi::new(modem, sysloop, None)
        .map_err(|e| RadioError::InitFailed(e.code()))
        .and_then(|wifi| EspNowAdapter::new(wifi, config.radio_channel, config.wire_format));

    match result {
        Ok(radio) => Ok(Some(radio)),
        Err(e) => match config.radio_init_failure {
            RadioInitPolicy::LogAndContinue => {
                error!("radio init failed: {}; continuing without link", e);
                Ok(None)
            }
            RadioInitPolicy::Restart => {
                error!("radio init failed: {}; restarting", e);
                unsafe { esp_idf_svc::sys::esp_restart() };
                #[allow(unreachable_code)]
                Ok(None)
            }
        },
    }
}
