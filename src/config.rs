//! System configuration parameters
//!
//! All tunable parameters for the blender and its display node.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

/// Encoding used for the periodic telemetry broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireFormat {
    /// Raw 60-byte struct layout understood by unmodified peers.
    Legacy,
    /// `NX` magic + version byte + postcard payload.
    Versioned,
}

/// What to do when the radio cannot be brought up at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RadioInitPolicy {
    /// Log the failure and keep running without telemetry.
    LogAndContinue,
    /// Reboot the chip and try again.
    Restart,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Acquisition ---
    /// Minimum spacing between two cell acquisitions (milliseconds)
    pub sample_interval_ms: u32,
    /// ADC scale factor: millivolts per raw bit
    pub adc_gain_mv_per_bit: f32,

    // --- Solenoid ---
    /// Time the open condition must stay false before the valve closes
    pub close_delay_ms: u32,
    /// Upper end of the raw ceiling potentiometer span
    pub ceiling_raw_max: u16,
    /// Ceiling percentage at full potentiometer travel
    pub ceiling_max_percent: u8,

    // --- Button / menu ---
    /// Hold duration that counts as a long press
    pub long_press_ms: u32,
    /// Stable time required before a button level change is accepted
    pub button_debounce_ms: u32,

    // --- Calibration ---
    /// Dwell before calibration sampling starts
    pub calibration_warmup_ms: u32,
    /// Number of acquisitions taken during the sampling phase
    pub calibration_samples: u16,
    /// Spacing between calibration acquisitions
    pub calibration_sample_spacing_ms: u32,
    /// Dwell after capture, before the result is persisted
    pub calibration_hold_ms: u32,

    // --- Display / telemetry ---
    /// Display refresh and telemetry broadcast cadence
    pub display_interval_ms: u32,
    /// Radio channel shared by sender and receiver
    pub radio_channel: u8,
    pub wire_format: WireFormat,
    pub radio_init_failure: RadioInitPolicy,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Acquisition
            sample_interval_ms: 50,
            adc_gain_mv_per_bit: 0.0625, // ADS1115 at ±2.048 V

            // Solenoid
            close_delay_ms: 300,
            ceiling_raw_max: 4095,
            ceiling_max_percent: 40,

            // Button / menu
            long_press_ms: 2000,
            button_debounce_ms: 50,

            // Calibration
            calibration_warmup_ms: 3000,
            calibration_samples: 40,
            calibration_sample_spacing_ms: 100,
            calibration_hold_ms: 2000,

            // Display / telemetry
            display_interval_ms: 500,
            radio_channel: 1,
            wire_format: WireFormat::Versioned,
            radio_init_failure: RadioInitPolicy::LogAndContinue,
        }
    }
}

impl SystemConfig {
    /// Total time a calibration capture holds the control loop.
    pub fn calibration_dwell_ms(&self) -> u32 {
        self.calibration_warmup_ms
            + u32::from(self.calibration_samples) * self.calibration_sample_spacing_ms
            + self.calibration_hold_ms
    }
}
