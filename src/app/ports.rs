//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlCore (domain)
//! ```
//!
//! Driven adapters (cell amplifier, potentiometer, solenoid, NVS, radio,
//! clock, event sinks) implement these traits.  The
//! [`ControlCore`](super::service::ControlCore) consumes them via generics,
//! so the domain core never touches hardware directly.

use crate::config::SystemConfig;
use crate::fusion::CellId;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain raw analog readings.
///
/// Implementations never fail: a bus error is logged and reported as a
/// zero reading, which the validity gate rejects downstream.
pub trait SensorPort {
    /// Signed raw conversion for one oxygen cell's differential channel.
    fn read_cell_raw(&mut self, cell: CellId) -> i16;

    /// Raw ceiling potentiometer reading (0 – 4095 on the ESP32-S3 ADC).
    fn read_ceiling_raw(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive the gas solenoid.
pub trait ActuatorPort {
    /// Energise (`true`) or release (`false`) the solenoid valve.
    fn set_valve(&mut self, open: bool);
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock plus a blocking delay.
///
/// `now_ms` wraps at `u32::MAX`; every consumer compares timestamps
/// with `wrapping_sub`.
pub trait TimePort {
    fn now_ms(&self) -> u32;
    fn sleep_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain → short-range link)
// ───────────────────────────────────────────────────────────────

/// Best-effort broadcast link.
///
/// `broadcast` only reports whether the frame was accepted for
/// transmission; delivery status arrives later through the send
/// callback and the event queue.
pub trait RadioPort {
    fn broadcast(&mut self, frame: &[u8]) -> Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for calibration and config blobs.
///
/// Keys are namespaced to prevent collisions between subsystems.  Write
/// operations MUST be atomic: no partial writes on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;

    /// Remove every key in `namespace`.
    fn erase_namespace(&mut self, namespace: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

/// Errors from [`RadioPort`] operations and radio bring-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The link-layer driver failed to initialise (carries the IDF code).
    InitFailed(i32),
    /// The broadcast peer could not be registered.
    PeerRegistrationFailed(i32),
    /// The frame was not accepted for transmission.
    SendFailed(i32),
    /// Frame exceeds the link's maximum payload.
    FrameTooLarge(usize),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for RadioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InitFailed(rc) => write!(f, "radio init failed (rc={})", rc),
            Self::PeerRegistrationFailed(rc) => write!(f, "peer registration failed (rc={})", rc),
            Self::SendFailed(rc) => write!(f, "send rejected (rc={})", rc),
            Self::FrameTooLarge(len) => write!(f, "frame too large ({} bytes)", len),
        }
    }
}

impl core::error::Error for ConfigError {}
impl core::error::Error for StorageError {}
impl core::error::Error for RadioError {}
