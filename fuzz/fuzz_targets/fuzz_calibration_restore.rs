//! Fuzz target: calibration restore from arbitrary stored bytes.
//!
//! Stores fuzz bytes under both calibration keys and verifies that
//! restore never panics and only a 4-byte value is taken as a voltage.
//!
//! cargo fuzz run fuzz_calibration_restore

#![no_main]

use libfuzzer_sys::fuzz_target;
use nitrox::app::ports::{StorageError, StoragePort};
use nitrox::calibration::{CalibrationManager, NAMESPACE};
use nitrox::fusion::CellId;
use std::collections::HashMap;

// ── In-memory StoragePort for fuzz testing ────────────────────

#[derive(Default)]
struct MemStore {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let v = self.data.get(&format!("{ns}::{key}")).ok_or(StorageError::NotFound)?;
        let n = v.len().min(buf.len());
        buf[..n].copy_from_slice(&v[..n]);
        Ok(n)
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{ns}::{key}"));
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.data.contains_key(&format!("{ns}::{key}"))
    }

    fn erase_namespace(&mut self, ns: &str) -> Result<(), StorageError> {
        let prefix = format!("{ns}::");
        self.data.retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let mid = data.len() / 2;
    let (first, second) = data.split_at(mid);

    let mut store = MemStore::default();
    store.write(NAMESPACE, "cell1", first).unwrap();
    store.write(NAMESPACE, "cell2", second).unwrap();

    let mut cal = CalibrationManager::new();
    cal.restore(&store);

    for (cell, bytes) in CellId::ALL.into_iter().zip([first, second]) {
        let restored = cal.cell(cell).mv;
        if bytes.len() >= 4 {
            let expected = f32::from_le_bytes(bytes[..4].try_into().unwrap());
            assert_eq!(restored.to_bits(), expected.to_bits());
        } else {
            assert_eq!(restored, 0.0);
        }
    }
});
