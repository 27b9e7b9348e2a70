//! Fusion & validity gate.
//!
//! Converts each cell's averaged voltage into an oxygen percentage,
//! applies the voltage / calibration / user-disable gates and averages
//! the usable cells into one system estimate.
//!
//! ```text
//!   avg mV ──▶ valid? ──┐
//!   cal mV ──▶ valid? ──┼──▶ usable ──▶ mean(% of usable cells)
//!   menu   ──▶ enabled? ┘
//! ```
//!
//! When no cell is usable the system percentage is the sentinel `-1.0`
//! and `is_error` is set.  Safety decisions must test `is_error`, never
//! the sign of the percentage.

use serde::{Deserialize, Serialize};

use crate::calibration::CellCalibration;
use crate::sensors::Acquisition;

/// Lower bound (exclusive) of the plausible cell voltage band, mV.
pub const CELL_MV_MIN: f32 = 7.0;
/// Upper bound (exclusive) of the plausible cell voltage band, mV.
pub const CELL_MV_MAX: f32 = 20.0;
/// Oxygen fraction of ambient air, used as the calibration reference.
pub const AIR_O2_PERCENT: f32 = 20.9;
/// Upper clamp for any reported oxygen percentage.
pub const O2_PERCENT_MAX: f32 = 99.9;
/// System percentage reported when no cell is usable.
pub const NO_READING: f32 = -1.0;

/// `true` iff `mv` lies strictly inside the (7, 20) mV band.
///
/// Shared by live samples and stored calibrations; the two checks are
/// applied independently.
pub fn is_valid_mv(mv: f32) -> bool {
    mv > CELL_MV_MIN && mv < CELL_MV_MAX
}

/// Oxygen percentage for `average_mv` against `calibration_mv`, clamped
/// to `[0, 99.9]`.  A non-positive calibration yields 0.
pub fn oxygen_percent(average_mv: f32, calibration_mv: f32) -> f32 {
    if calibration_mv <= 0.0 || calibration_mv.is_nan() {
        return 0.0;
    }
    let percent = average_mv / calibration_mv * AIR_O2_PERCENT;
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, O2_PERCENT_MAX)
}

/// One of the two redundant oxygen cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellId {
    First,
    Second,
}

impl CellId {
    pub const ALL: [CellId; 2] = [CellId::First, CellId::Second];

    pub const fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// Human-facing cell number (1 or 2), also the NVS key suffix.
    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

/// Per-cell fused reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSample {
    /// Absolute window mean, mV.
    pub average_mv: f32,
    /// Oxygen percentage derived from the cell's calibration.
    pub oxygen_percent: f32,
    /// Set when either the live voltage or the calibration is out of band.
    pub warning: bool,
    /// Set from the menu; excludes the cell from fusion.
    pub disabled: bool,
}

impl CellSample {
    /// Live voltage lies inside the plausible band.
    pub fn is_valid(&self) -> bool {
        is_valid_mv(self.average_mv)
    }

    /// Valid voltage, valid calibration and not user-disabled.
    pub fn is_usable(&self) -> bool {
        !self.warning && !self.disabled
    }
}

/// System-level fused estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Mean of usable cells, or [`NO_READING`].
    pub oxygen_percent: f32,
    /// `true` iff zero cells are usable.
    pub is_error: bool,
}

impl Default for SystemStatus {
    /// Boot state: nothing sampled yet, so nothing is usable.
    fn default() -> Self {
        Self {
            oxygen_percent: NO_READING,
            is_error: true,
        }
    }
}

/// Owns both cell samples and the system estimate; recomputed after
/// every acquisition.
#[derive(Debug, Clone, Default)]
pub struct Fusion {
    cells: [CellSample; 2],
    status: SystemStatus,
}

impl Fusion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every cell and the system estimate from the current
    /// acquisition windows and calibrations.
    pub fn fuse(&mut self, acquisition: &Acquisition, calibration: &[CellCalibration; 2]) -> SystemStatus {
        let mut sum = 0.0;
        let mut usable = 0u8;

        for cell in CellId::ALL {
            let cal = &calibration[cell.index()];
            let sample = &mut self.cells[cell.index()];

            sample.average_mv = acquisition.average_mv(cell);
            sample.oxygen_percent = oxygen_percent(sample.average_mv, cal.mv);
            sample.warning = !is_valid_mv(sample.average_mv) || !cal.is_valid();

            if sample.is_usable() {
                sum += sample.oxygen_percent;
                usable += 1;
            }
        }

        self.status = combine(sum, usable);
        self.status
    }

    pub fn set_disabled(&mut self, cell: CellId, disabled: bool) {
        self.cells[cell.index()].disabled = disabled;
    }

    /// Flip the user-disable flag and return the new value.
    pub fn toggle_disabled(&mut self, cell: CellId) -> bool {
        let sample = &mut self.cells[cell.index()];
        sample.disabled = !sample.disabled;
        sample.disabled
    }

    pub fn cell(&self, cell: CellId) -> &CellSample {
        &self.cells[cell.index()]
    }

    pub fn cells(&self) -> [CellSample; 2] {
        self.cells
    }

    pub fn status(&self) -> SystemStatus {
        self.status
    }
}

/// Fuse already-gated per-cell percentages (`None` = not usable).
pub fn fuse_percentages(cells: [Option<f32>; 2]) -> SystemStatus {
    let (sum, usable) = cells
        .iter()
        .flatten()
        .fold((0.0_f32, 0u8), |(s, n), p| (s + p, n + 1));
    combine(sum, usable)
}

fn combine(sum: f32, usable: u8) -> SystemStatus {
    if usable == 0 {
        SystemStatus {
            oxygen_percent: NO_READING,
            is_error: true,
        }
    } else {
        SystemStatus {
            oxygen_percent: (sum / f32::from(usable)).min(O2_PERCENT_MAX),
            is_error: false,
        }
    }
}
