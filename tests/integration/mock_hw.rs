//! Mock adapters for integration tests.
//!
//! Records every valve command so tests can assert on the full history
//! without touching real GPIO, and drives a virtual clock that advances
//! only when the code under test sleeps.

use std::collections::HashMap;

use nitrox::app::events::AppEvent;
use nitrox::app::ports::{
    ActuatorPort, EventSink, RadioError, RadioPort, SensorPort, StorageError, StoragePort, TimePort,
};
use nitrox::fusion::CellId;

/// ADC gain used by the default config: raw 200 reads as 12.5 mV.
pub const RAW_12_5_MV: i16 = 200;
pub const CEILING_FULL_SCALE: u16 = 4095;

// ── MockHw ────────────────────────────────────────────────────

pub struct MockHw {
    pub raw: [i16; 2],
    pub ceiling_raw: u16,
    pub valve_calls: Vec<bool>,
}

#[allow(dead_code)]
impl MockHw {
    pub fn new(raw: [i16; 2], ceiling_raw: u16) -> Self {
        Self {
            raw,
            ceiling_raw,
            valve_calls: Vec::new(),
        }
    }

    pub fn valve_open(&self) -> bool {
        self.valve_calls.last().copied().unwrap_or(false)
    }
}

impl SensorPort for MockHw {
    fn read_cell_raw(&mut self, cell: CellId) -> i16 {
        self.raw[cell.index()]
    }

    fn read_ceiling_raw(&mut self) -> u16 {
        self.ceiling_raw
    }
}

impl ActuatorPort for MockHw {
    fn set_valve(&mut self, open: bool) {
        self.valve_calls.push(open);
    }
}

// ── MockClock ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockClock {
    pub now: u32,
}

impl MockClock {
    pub fn at(now: u32) -> Self {
        Self { now }
    }
}

impl TimePort for MockClock {
    fn now_ms(&self) -> u32 {
        self.now
    }

    fn sleep_ms(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
    }
}

// ── MemStorage ────────────────────────────────────────────────

#[derive(Default)]
pub struct MemStorage {
    store: HashMap<String, Vec<u8>>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage preloaded with both calibration values.
    pub fn with_calibration(mv: [f32; 2]) -> Self {
        let mut s = Self::new();
        s.put("calibration", "cell1", &mv[0].to_le_bytes());
        s.put("calibration", "cell2", &mv[1].to_le_bytes());
        s
    }

    pub fn put(&mut self, namespace: &str, key: &str, data: &[u8]) {
        self.store.insert(format!("{}::{}", namespace, key), data.to_vec());
    }

    pub fn get_f32(&self, namespace: &str, key: &str) -> Option<f32> {
        let bytes = self.store.get(&format!("{}::{}", namespace, key))?;
        Some(f32::from_le_bytes(bytes.as_slice().try_into().ok()?))
    }
}

impl StoragePort for MemStorage {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&format!("{}::{}", namespace, key)) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.put(namespace, key, data);
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }

    fn erase_namespace(&mut self, namespace: &str) -> Result<(), StorageError> {
        let prefix = format!("{}::", namespace);
        self.store.retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── LoopbackRadio ─────────────────────────────────────────────

#[derive(Default)]
pub struct LoopbackRadio {
    pub frames: Vec<Vec<u8>>,
}

impl RadioPort for LoopbackRadio {
    fn broadcast(&mut self, frame: &[u8]) -> Result<(), RadioError> {
        self.frames.push(frame.to_vec());
        Ok(())
    }
}
