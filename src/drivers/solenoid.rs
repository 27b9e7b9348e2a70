//! Gas solenoid valve driver (logic-level MOSFET on one GPIO).
//!
//! ## Safety contract
//!
//! The ceiling and fusion-error gating live in the solenoid controller;
//! this driver is a dumb actuator.  It boots de-energised (closed).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct SolenoidDriver {
    open: bool,
    switch_count: u32,
}

impl Default for SolenoidDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolenoidDriver {
    pub fn new() -> Self {
        Self {
            open: false,
            switch_count: 0,
        }
    }

    pub fn set(&mut self, open: bool) {
        if open != self.open {
            self.switch_count = self.switch_count.wrapping_add(1);
        }
        hw_init::gpio_write(pins::SOLENOID_GPIO, open);
        self.open = open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of open/close transitions since boot.
    pub fn switch_count(&self) -> u32 {
        self.switch_count
    }
}
