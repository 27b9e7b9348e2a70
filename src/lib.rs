//! Nitrox blender firmware library.
//!
//! Exposes the pure-logic modules for integration testing and the three
//! role binaries. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod calibration;
pub mod config;
pub mod events;
pub mod fusion;
pub mod menu;
pub mod solenoid;
pub mod telemetry;

pub mod error;
pub mod pins;

// Adapters and drivers compile on the host with simulation backends.
pub mod adapters;
pub mod drivers;
pub mod sensors;

#[cfg(target_os = "espidf")]
pub mod board;
