//! GPIO / peripheral pin assignments for the LilyGO T-Display-S3 blender board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Board power
// ---------------------------------------------------------------------------

/// Digital output: must be driven HIGH to power the board's peripheral rail
/// when running from battery.
pub const POWER_ON_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// I²C bus: ADS1115 oxygen cell amplifier
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 18;
pub const I2C_SCL_GPIO: i32 = 17;
/// Bus clock for the ADS1115 (fast mode).
pub const I2C_BAUDRATE_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// Ceiling potentiometer (ADC1)
// ---------------------------------------------------------------------------

/// Wiper of the O2 ceiling potentiometer.  ADC1 channel 0 (GPIO 1).
pub const POTENTIOMETER_GPIO: i32 = 1;
pub const POTENTIOMETER_ADC1_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// Solenoid valve
// ---------------------------------------------------------------------------

/// Digital output to the valve driver MOSFET. HIGH = energised (open).
pub const SOLENOID_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// User button (active-low, on-board pull-up)
// ---------------------------------------------------------------------------

/// Calibrate / menu push-button (the board's KEY button).
pub const BUTTON_GPIO: i32 = 14;
