//! Calibration manager.
//!
//! Owns both cells' reference voltages and their persistence.  Each
//! voltage is stored as a 4-byte little-endian `f32` under namespace
//! `calibration`, keys `cell1` / `cell2`.  A missing key restores as
//! 0.0, which the validity band rejects.
//!
//! The blocking capture sequence itself is driven by
//! [`ControlCore`](crate::app::service::ControlCore), which keeps
//! acquisition running during the dwell; this module only records and
//! persists the result.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};
use crate::fusion::{is_valid_mv, CellId};

pub const NAMESPACE: &str = "calibration";
const KEYS: [&str; 2] = ["cell1", "cell2"];

/// Reference voltage of one cell in ambient air.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CellCalibration {
    pub mv: f32,
    pub captured_at_ms: u32,
}

impl CellCalibration {
    /// Same (7, 20) mV band as live samples.
    pub fn is_valid(&self) -> bool {
        is_valid_mv(self.mv)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CalibrationManager {
    cells: [CellCalibration; 2],
}

impl CalibrationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load both cells from storage.  Absent or short values become 0.0.
    pub fn restore(&mut self, storage: &impl StoragePort) {
        for cell in CellId::ALL {
            let mut buf = [0u8; 4];
            let mv = match storage.read(NAMESPACE, KEYS[cell.index()], &mut buf) {
                Ok(4) => f32::from_le_bytes(buf),
                Ok(len) => {
                    warn!("calibration: {:?} has {} bytes, ignoring", cell, len);
                    0.0
                }
                Err(StorageError::NotFound) => 0.0,
                Err(e) => {
                    warn!("calibration: restore {:?} failed: {}", cell, e);
                    0.0
                }
            };
            self.cells[cell.index()] = CellCalibration {
                mv,
                captured_at_ms: 0,
            };
        }
        info!(
            "calibration: restored cell1={:.2} mV cell2={:.2} mV",
            self.cells[0].mv, self.cells[1].mv
        );
    }

    /// Record new reference voltages in memory.
    pub fn record(&mut self, mv: [f32; 2], now_ms: u32) {
        for cell in CellId::ALL {
            self.cells[cell.index()] = CellCalibration {
                mv: mv[cell.index()],
                captured_at_ms: now_ms,
            };
        }
    }

    /// Write both voltages to storage.
    pub fn persist(&self, storage: &mut impl StoragePort) -> Result<(), StorageError> {
        for cell in CellId::ALL {
            let bytes = self.cells[cell.index()].mv.to_le_bytes();
            storage.write(NAMESPACE, KEYS[cell.index()], &bytes)?;
        }
        Ok(())
    }

    /// Erase the persisted namespace.  In-memory values are left as-is
    /// until the next restore.
    pub fn clear(&mut self, storage: &mut impl StoragePort) -> Result<(), StorageError> {
        storage.erase_namespace(NAMESPACE)
    }

    pub fn cell(&self, cell: CellId) -> &CellCalibration {
        &self.cells[cell.index()]
    }

    pub fn cells(&self) -> &[CellCalibration; 2] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemStore {
        map: HashMap<(String, String), Vec<u8>>,
        fail_writes: bool,
    }

    impl StoragePort for MemStore {
        fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
            let data = self
                .map
                .get(&(ns.to_owned(), key.to_owned()))
                .ok_or(StorageError::NotFound)?;
            let len = data.len().min(buf.len());
            buf[..len].copy_from_slice(&data[..len]);
            Ok(len)
        }

        fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::IoError);
            }
            self.map.insert((ns.to_owned(), key.to_owned()), data.to_vec());
            Ok(())
        }

        fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
            self.map.remove(&(ns.to_owned(), key.to_owned()));
            Ok(())
        }

        fn exists(&self, ns: &str, key: &str) -> bool {
            self.map.contains_key(&(ns.to_owned(), key.to_owned()))
        }

        fn erase_namespace(&mut self, ns: &str) -> Result<(), StorageError> {
            self.map.retain(|(n, _), _| n != ns);
            Ok(())
        }
    }

    #[test]
    fn fresh_store_restores_invalid_zero() {
        let mut cal = CalibrationManager::new();
        cal.restore(&MemStore::default());
        assert_eq!(cal.cell(CellId::First).mv, 0.0);
        assert!(!cal.cell(CellId::Second).is_valid());
    }

    #[test]
    fn persist_then_restore() {
        let mut store = MemStore::default();
        let mut cal = CalibrationManager::new();
        cal.record([12.5, 11.0], 7000);
        cal.persist(&mut store).unwrap();
        assert!(store.exists(NAMESPACE, "cell1"));

        let mut restored = CalibrationManager::new();
        restored.restore(&store);
        assert_eq!(restored.cell(CellId::First).mv, 12.5);
        assert_eq!(restored.cell(CellId::Second).mv, 11.0);
    }

    #[test]
    fn clear_erases_only_calibration_namespace() {
        let mut store = MemStore::default();
        store.write("config", "syscfg", b"x").unwrap();
        let mut cal = CalibrationManager::new();
        cal.record([12.0, 12.0], 0);
        cal.persist(&mut store).unwrap();

        cal.clear(&mut store).unwrap();
        assert!(!store.exists(NAMESPACE, "cell1"));
        assert!(store.exists("config", "syscfg"));

        let mut next_boot = CalibrationManager::new();
        next_boot.restore(&store);
        assert!(!next_boot.cell(CellId::First).is_valid());
    }

    #[test]
    fn truncated_value_restores_zero() {
        let mut store = MemStore::default();
        store.write(NAMESPACE, "cell1", &[1, 2]).unwrap();
        let mut cal = CalibrationManager::new();
        cal.restore(&store);
        assert_eq!(cal.cell(CellId::First).mv, 0.0);
    }

    #[test]
    fn persist_failure_keeps_memory() {
        let mut store = MemStore { fail_writes: true, ..Default::default() };
        let mut cal = CalibrationManager::new();
        cal.record([12.5, 12.5], 10);
        assert_eq!(cal.persist(&mut store), Err(StorageError::IoError));
        assert_eq!(cal.cell(CellId::Second).mv, 12.5);
        assert_eq!(cal.cell(CellId::Second).captured_at_ms, 10);
    }
}
