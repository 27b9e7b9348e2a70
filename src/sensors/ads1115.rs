//! ADS1115 16-bit ADC driver for the galvanic oxygen cells.
//!
//! Each cell is wired across one differential pair (AIN0–AIN1 for cell 1,
//! AIN2–AIN3 for cell 2).  Conversions are single-shot at 64 SPS with the
//! PGA at ±2.048 V, i.e. 0.0625 mV per bit.
//!
//! Generic over [`embedded_hal::i2c::I2c`] and [`DelayNs`] so the same
//! code runs against `esp_idf_hal::i2c::I2cDriver` on target and a mock
//! bus in tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::SensorError;

/// Default 7-bit address (ADDR pin tied to GND).
pub const DEFAULT_ADDRESS: u8 = 0x48;

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

const OS_SINGLE: u16 = 0x8000;
const PGA_2_048V: u16 = 0x0400;
const MODE_SINGLE_SHOT: u16 = 0x0100;
const DR_64SPS: u16 = 0x0060;
const COMP_QUEUE_DISABLE: u16 = 0x0003;

/// 64 SPS converts in ~15.6 ms; allow twice that before giving up.
const CONVERSION_POLL_MS: u32 = 1;
const CONVERSION_POLL_LIMIT: u32 = 32;

/// Differential input pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffPair {
    Ain0Ain1,
    Ain2Ain3,
}

impl DiffPair {
    const fn mux_bits(self) -> u16 {
        match self {
            Self::Ain0Ain1 => 0x0000,
            Self::Ain2Ain3 => 0x3000,
        }
    }
}

pub struct Ads1115<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C: I2c, D: DelayNs> Ads1115<I2C, D> {
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self { i2c, delay, address }
    }

    /// Run one single-shot differential conversion and return the signed
    /// raw count.
    pub fn read_differential(&mut self, pair: DiffPair) -> Result<i16, SensorError> {
        let config = OS_SINGLE
            | pair.mux_bits()
            | PGA_2_048V
            | MODE_SINGLE_SHOT
            | DR_64SPS
            | COMP_QUEUE_DISABLE;
        let [hi, lo] = config.to_be_bytes();
        self.i2c
            .write(self.address, &[REG_CONFIG, hi, lo])
            .map_err(|_| SensorError::BusFailed)?;

        self.wait_for_conversion()?;

        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[REG_CONVERSION], &mut buf)
            .map_err(|_| SensorError::BusFailed)?;
        Ok(i16::from_be_bytes(buf))
    }

    // OS reads back 1 once the device is idle again.
    fn wait_for_conversion(&mut self) -> Result<(), SensorError> {
        for _ in 0..CONVERSION_POLL_LIMIT {
            let mut buf = [0u8; 2];
            self.i2c
                .write_read(self.address, &[REG_CONFIG], &mut buf)
                .map_err(|_| SensorError::BusFailed)?;
            if u16::from_be_bytes(buf) & OS_SINGLE != 0 {
                return Ok(());
            }
            self.delay.delay_ms(CONVERSION_POLL_MS);
        }
        Err(SensorError::ConversionTimeout)
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

    #[derive(Debug)]
    struct BusError;

    impl embedded_hal::i2c::Error for BusError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Scripted bus: busy for `busy_polls` config reads, then idle.
    struct MockBus {
        writes: Vec<Vec<u8>>,
        busy_polls: u32,
        conversion: i16,
        fail: bool,
        pointer: u8,
    }

    impl MockBus {
        fn new(conversion: i16, busy_polls: u32) -> Self {
            Self {
                writes: Vec::new(),
                busy_polls,
                conversion,
                fail: false,
                pointer: 0,
            }
        }
    }

    impl ErrorType for MockBus {
        type Error = BusError;
    }

    impl I2c for MockBus {
        fn transaction(
            &mut self,
            _address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(BusError);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.pointer = bytes[0];
                        self.writes.push(bytes.to_vec());
                    }
                    Operation::Read(buf) => {
                        let value = if self.pointer == REG_CONFIG {
                            if self.busy_polls > 0 {
                                self.busy_polls -= 1;
                                0x0000
                            } else {
                                OS_SINGLE
                            }
                        } else {
                            self.conversion as u16
                        };
                        buf.copy_from_slice(&value.to_be_bytes());
                    }
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn config_word_selects_pair_gain_and_rate() {
        let mut adc = Ads1115::new(MockBus::new(200, 0), NoDelay, DEFAULT_ADDRESS);
        adc.read_differential(DiffPair::Ain2Ain3).unwrap();
        let (bus, _) = adc.release();
        assert_eq!(bus.writes[0], vec![REG_CONFIG, 0xB5, 0x63]);
    }

    #[test]
    fn returns_signed_conversion_after_busy_polls() {
        let mut adc = Ads1115::new(MockBus::new(-320, 3), NoDelay, DEFAULT_ADDRESS);
        assert_eq!(adc.read_differential(DiffPair::Ain0Ain1), Ok(-320));
    }

    #[test]
    fn never_ready_times_out() {
        let bus = MockBus::new(0, u32::MAX);
        let mut adc = Ads1115::new(bus, NoDelay, DEFAULT_ADDRESS);
        assert_eq!(
            adc.read_differential(DiffPair::Ain0Ain1),
            Err(SensorError::ConversionTimeout)
        );
    }

    #[test]
    fn bus_error_is_reported() {
        let mut bus = MockBus::new(0, 0);
        bus.fail = true;
        let mut adc = Ads1115::new(bus, NoDelay, DEFAULT_ADDRESS);
        assert_eq!(
            adc.read_differential(DiffPair::Ain0Ain1),
            Err(SensorError::BusFailed)
        );
    }
}
