//! Solenoid hysteresis controller.
//!
//! Instant open, debounced close:
//!
//! ```text
//!   open_condition = !is_error && o2% < ceiling%
//!
//!   true  ─▶ last_open_satisfied = now; open if closed
//!   false ─▶ close once (now − last_open_satisfied) > close_delay
//! ```
//!
//! A fusion error therefore fails the valve *closed* after the close
//! delay and blocks any re-open until a usable cell returns.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::fusion::SystemStatus;

/// Map a raw potentiometer reading onto `[0, max_percent]`.
///
/// Integer arithmetic; readings above `raw_max` saturate.
pub fn ceiling_percent(raw: u16, raw_max: u16, max_percent: u8) -> u8 {
    if raw_max == 0 {
        return 0;
    }
    let raw = u32::from(raw.min(raw_max));
    (raw * u32::from(max_percent) / u32::from(raw_max)) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SolenoidState {
    pub ceiling_percent: u8,
    pub is_open: bool,
    pub last_open_satisfied_ms: u32,
}

/// Result of one [`SolenoidController::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveChange {
    Opened,
    Closed,
}

#[derive(Debug, Clone)]
pub struct SolenoidController {
    state: SolenoidState,
    close_delay_ms: u32,
    raw_max: u16,
    max_percent: u8,
}

impl SolenoidController {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: SolenoidState::default(),
            close_delay_ms: config.close_delay_ms,
            raw_max: config.ceiling_raw_max,
            max_percent: config.ceiling_max_percent,
        }
    }

    /// Recompute the ceiling from the raw potentiometer reading.
    pub fn set_ceiling_raw(&mut self, raw: u16) {
        self.state.ceiling_percent = ceiling_percent(raw, self.raw_max, self.max_percent);
    }

    /// Evaluate the open condition and return the valve edge, if any.
    pub fn update(&mut self, status: &SystemStatus, now_ms: u32) -> Option<ValveChange> {
        let open_condition =
            !status.is_error && status.oxygen_percent < f32::from(self.state.ceiling_percent);

        if open_condition {
            self.state.last_open_satisfied_ms = now_ms;
            if !self.state.is_open {
                self.state.is_open = true;
                return Some(ValveChange::Opened);
            }
        } else if self.state.is_open
            && now_ms.wrapping_sub(self.state.last_open_satisfied_ms) > self.close_delay_ms
        {
            self.state.is_open = false;
            return Some(ValveChange::Closed);
        }
        None
    }

    pub fn state(&self) -> SolenoidState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }
}
