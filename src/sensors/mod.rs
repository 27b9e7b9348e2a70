//! Sensor acquisition: rolling averages over both oxygen cells.
//!
//! [`Acquisition`] reads both differential channels once per call (at
//! most every `sample_interval_ms`), scales the raw counts to millivolts
//! and pushes them into a trailing window per cell.  No error is raised
//! here: a stuck or flat reading is caught by the fusion validity gate.

pub mod ads1115;

use log::debug;

use crate::app::ports::SensorPort;
use crate::config::SystemConfig;
use crate::fusion::CellId;

/// Depth of each cell's averaging window.
pub const WINDOW_LEN: usize = 40;

/// Window spread (max − min, mV) above which a cell is reported noisy.
const NOISY_SPREAD_MV: f32 = 6.0;

/// Fixed-capacity trailing window with average, min and max queries.
#[derive(Debug, Clone)]
pub struct RollingAverage<const N: usize> {
    ring: [f32; N],
    head: usize,
    count: usize,
}

impl<const N: usize> Default for RollingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RollingAverage<N> {
    pub const fn new() -> Self {
        Self {
            ring: [0.0; N],
            head: 0,
            count: 0,
        }
    }

    /// Append a sample, overwriting the oldest once the window is full.
    pub fn push(&mut self, value: f32) {
        self.ring[self.head] = value;
        self.head = (self.head + 1) % N;
        if self.count < N {
            self.count += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == N
    }

    /// Mean over the window; 0.0 while empty.
    pub fn average(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        let sum: f32 = self.samples().iter().sum();
        sum / self.count as f32
    }

    /// Smallest sample in the window.
    pub fn min(&self) -> Option<f32> {
        self.samples().iter().copied().reduce(f32::min)
    }

    /// Largest sample in the window.
    pub fn max(&self) -> Option<f32> {
        self.samples().iter().copied().reduce(f32::max)
    }

    /// `max − min` over the window; 0.0 while empty.
    pub fn spread(&self) -> f32 {
        match (self.min(), self.max()) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => 0.0,
        }
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
    }

    // Until the window fills, the live samples are the first `count` slots.
    fn samples(&self) -> &[f32] {
        &self.ring[..self.count]
    }
}

/// Gated two-cell acquisition.
pub struct Acquisition {
    windows: [RollingAverage<WINDOW_LEN>; 2],
    gain_mv_per_bit: f32,
    interval_ms: u32,
    last_sample_ms: Option<u32>,
}

impl Acquisition {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            windows: [RollingAverage::new(), RollingAverage::new()],
            gain_mv_per_bit: config.adc_gain_mv_per_bit,
            interval_ms: config.sample_interval_ms,
            last_sample_ms: None,
        }
    }

    /// Take one reading of both cells if the sample interval has elapsed.
    ///
    /// Returns `true` when a new sample was pushed, `false` if the call
    /// arrived too soon and was a no-op.
    pub fn sample(&mut self, now_ms: u32, sensors: &mut impl SensorPort) -> bool {
        if let Some(last) = self.last_sample_ms {
            if now_ms.wrapping_sub(last) < self.interval_ms {
                return false;
            }
        }
        self.force_sample(now_ms, sensors);
        true
    }

    /// Read both cells regardless of the gate (calibration spacing drives
    /// its own cadence).
    pub fn force_sample(&mut self, now_ms: u32, sensors: &mut impl SensorPort) {
        for cell in CellId::ALL {
            let raw = sensors.read_cell_raw(cell);
            let window = &mut self.windows[cell.index()];
            window.push(f32::from(raw) * self.gain_mv_per_bit);

            if window.is_full() && window.spread() > NOISY_SPREAD_MV {
                debug!(
                    "{:?}: noisy window (min={:.2} max={:.2} mV)",
                    cell,
                    window.min().unwrap_or(0.0),
                    window.max().unwrap_or(0.0)
                );
            }
        }
        self.last_sample_ms = Some(now_ms);
    }

    /// Absolute value of the window mean, in millivolts.
    pub fn average_mv(&self, cell: CellId) -> f32 {
        self.windows[cell.index()].average().abs()
    }

    pub fn window(&self, cell: CellId) -> &RollingAverage<WINDOW_LEN> {
        &self.windows[cell.index()]
    }
}
