//! Telemetry wire formats.
//!
//! **Legacy**: 60 bytes, little-endian, fields at their natural 32-bit
//! alignment with zeroed padding, readable by unmodified peers:
//!
//! ```text
//!  off  type  field
//!    0  f32   status.oxygen_percent
//!    4  bool  status.is_error            5..8 pad
//!    8  f32   cells[0].average_mv
//!   12  f32   cells[0].oxygen_percent
//!   16  bool  cells[0].warning
//!   17  bool  cells[0].disabled         18..20 pad
//!   20  ...   cells[1] (same shape)
//!   32  f32   calibration[0].mv
//!   36  i32   calibration[0].captured_at_ms
//!   40  f32   calibration[1].mv
//!   44  i32   calibration[1].captured_at_ms
//!   48  i32   solenoid.ceiling_percent
//!   52  bool  solenoid.is_open          53..56 pad
//!   56  i32   solenoid.last_open_satisfied_ms
//! ```
//!
//! **Versioned**: `b"NX"`, one version byte, postcard payload.  Unknown
//! versions are rejected instead of being reinterpreted.

use core::fmt;

use heapless::Vec;

use crate::calibration::CellCalibration;
use crate::config::WireFormat;
use crate::fusion::{CellSample, SystemStatus, O2_PERCENT_MAX};
use crate::solenoid::SolenoidState;

use super::TelemetryMessage;

pub const LEGACY_LEN: usize = 60;
pub const MAGIC: [u8; 2] = *b"NX";
pub const VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1;

/// ESP-NOW payload limit.
pub const MAX_FRAME: usize = 250;

pub type Frame = Vec<u8, MAX_FRAME>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// Frame length does not match the format (carries the actual length).
    WrongLength(usize),
    /// Versioned frame without the `NX` magic.
    BadMagic,
    /// Versioned frame from a newer or unknown schema.
    UnsupportedVersion(u8),
    /// A decoded field is outside its domain.
    FieldOutOfRange(&'static str),
    /// postcard failed to encode or decode the payload.
    Codec,
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength(len) => write!(f, "unexpected frame length {}", len),
            Self::BadMagic => write!(f, "bad magic"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported version {}", v),
            Self::FieldOutOfRange(field) => write!(f, "field out of range: {}", field),
            Self::Codec => write!(f, "payload codec error"),
        }
    }
}

impl core::error::Error for WireError {}

pub fn encode(msg: &TelemetryMessage, format: WireFormat) -> Result<Frame, WireError> {
    match format {
        WireFormat::Legacy => {
            let mut frame = Frame::new();
            frame
                .extend_from_slice(&encode_legacy(msg))
                .map_err(|_| WireError::Codec)?;
            Ok(frame)
        }
        WireFormat::Versioned => encode_versioned(msg),
    }
}

pub fn decode(bytes: &[u8], format: WireFormat) -> Result<TelemetryMessage, WireError> {
    match format {
        WireFormat::Legacy => decode_legacy(bytes),
        WireFormat::Versioned => decode_versioned(bytes),
    }
}

// ── Legacy ────────────────────────────────────────────────────

pub fn encode_legacy(msg: &TelemetryMessage) -> [u8; LEGACY_LEN] {
    let mut out = [0u8; LEGACY_LEN];
    let mut w = Writer { buf: &mut out, pos: 0 };

    w.f32(msg.status.oxygen_percent);
    w.bool(msg.status.is_error);
    w.pad(3);
    for cell in &msg.cells {
        w.f32(cell.average_mv);
        w.f32(cell.oxygen_percent);
        w.bool(cell.warning);
        w.bool(cell.disabled);
        w.pad(2);
    }
    for cal in &msg.calibration {
        w.f32(cal.mv);
        w.u32(cal.captured_at_ms);
    }
    w.u32(u32::from(msg.solenoid.ceiling_percent));
    w.bool(msg.solenoid.is_open);
    w.pad(3);
    w.u32(msg.solenoid.last_open_satisfied_ms);

    out
}

pub fn decode_legacy(bytes: &[u8]) -> Result<TelemetryMessage, WireError> {
    if bytes.len() != LEGACY_LEN {
        return Err(WireError::WrongLength(bytes.len()));
    }
    let mut r = Reader { buf: bytes, pos: 0 };

    let status = SystemStatus {
        oxygen_percent: r.f32(),
        is_error: r.bool("status.is_error")?,
    };
    r.pad(3);

    let mut cells = [CellSample::default(); 2];
    for cell in &mut cells {
        cell.average_mv = r.f32();
        cell.oxygen_percent = r.f32();
        cell.warning = r.bool("cell.warning")?;
        cell.disabled = r.bool("cell.disabled")?;
        r.pad(2);
    }

    let mut calibration = [CellCalibration::default(); 2];
    for cal in &mut calibration {
        cal.mv = r.f32();
        cal.captured_at_ms = r.u32();
    }

    let ceiling = r.u32();
    if ceiling > O2_PERCENT_MAX as u32 {
        return Err(WireError::FieldOutOfRange("solenoid.ceiling_percent"));
    }
    let is_open = r.bool("solenoid.is_open")?;
    r.pad(3);
    let solenoid = SolenoidState {
        ceiling_percent: ceiling as u8,
        is_open,
        last_open_satisfied_ms: r.u32(),
    };

    Ok(TelemetryMessage {
        status,
        cells,
        calibration,
        solenoid,
    })
}

// Timestamps travel as the peer's signed 32-bit millis; the bit pattern
// is kept so wrapped values survive the round trip.
struct Writer<'a> {
    buf: &'a mut [u8; LEGACY_LEN],
    pos: usize,
}

impl Writer<'_> {
    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn f32(&mut self, v: f32) {
        self.put(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.put(&v.to_le_bytes());
    }

    fn bool(&mut self, v: bool) {
        self.put(&[u8::from(v)]);
    }

    fn pad(&mut self, n: usize) {
        self.pos += n;
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take())
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn bool(&mut self, field: &'static str) -> Result<bool, WireError> {
        match self.take::<1>()[0] {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(WireError::FieldOutOfRange(field)),
        }
    }

    fn pad(&mut self, n: usize) {
        self.pos += n;
    }
}

// ── Versioned ─────────────────────────────────────────────────

pub fn encode_versioned(msg: &TelemetryMessage) -> Result<Frame, WireError> {
    let mut buf = [0u8; MAX_FRAME];
    buf[..MAGIC.len()].copy_from_slice(&MAGIC);
    buf[MAGIC.len()] = VERSION;
    let used = postcard::to_slice(msg, &mut buf[HEADER_LEN..])
        .map_err(|_| WireError::Codec)?
        .len();
    Frame::from_slice(&buf[..HEADER_LEN + used]).map_err(|_| WireError::Codec)
}

pub fn decode_versioned(bytes: &[u8]) -> Result<TelemetryMessage, WireError> {
    if bytes.len() < HEADER_LEN {
        return Err(WireError::WrongLength(bytes.len()));
    }
    if bytes[..MAGIC.len()] != MAGIC {
        return Err(WireError::BadMagic);
    }
    let version = bytes[MAGIC.len()];
    if version != VERSION {
        return Err(WireError::UnsupportedVersion(version));
    }
    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|_| WireError::Codec)
}
