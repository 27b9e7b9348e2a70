//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the ADS1115 cell amplifier and the solenoid driver, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  Generic over the I²C bus
//! and delay so the same adapter runs on `esp_idf_hal::i2c::I2cDriver`
//! and on a mock bus in tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::hw_init;
use crate::drivers::solenoid::SolenoidDriver;
use crate::fusion::CellId;
use crate::pins;
use crate::sensors::ads1115::{Ads1115, DiffPair};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C, D> {
    adc: Ads1115<I2C, D>,
    solenoid: SolenoidDriver,
    read_failures: u32,
}

impl<I2C: I2c, D: DelayNs> HardwareAdapter<I2C, D> {
    pub fn new(adc: Ads1115<I2C, D>, solenoid: SolenoidDriver) -> Self {
        Self {
            adc,
            solenoid,
            read_failures: 0,
        }
    }

    /// Cell reads that failed and were reported as 0.
    pub fn read_failures(&self) -> u32 {
        self.read_failures
    }

    pub fn solenoid(&self) -> &SolenoidDriver {
        &self.solenoid
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I2C: I2c, D: DelayNs> SensorPort for HardwareAdapter<I2C, D> {
    fn read_cell_raw(&mut self, cell: CellId) -> i16 {
        let pair = match cell {
            CellId::First => DiffPair::Ain0Ain1,
            CellId::Second => DiffPair::Ain2Ain3,
        };
        match self.adc.read_differential(pair) {
            Ok(raw) => raw,
            Err(e) => {
                self.read_failures = self.read_failures.wrapping_add(1);
                warn!("{:?}: read failed ({}), reporting 0", cell, e);
                0
            }
        }
    }

    fn read_ceiling_raw(&mut self) -> u16 {
        hw_init::adc1_read(pins::POTENTIOMETER_ADC1_CHANNEL)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I2C: I2c, D: DelayNs> ActuatorPort for HardwareAdapter<I2C, D> {
    fn set_valve(&mut self, open: bool) {
        self.solenoid.set(open);
    }
}
