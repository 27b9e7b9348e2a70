//! Application core: pure domain orchestration, zero I/O.
//!
//! The [`service::ControlCore`] sequences acquisition, fusion, the
//! solenoid, calibration and the button menu.  All interaction with
//! hardware, storage and the radio happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
