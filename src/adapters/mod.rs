//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                 |
//! |------------|--------------|-----------------------------|
//! | `espnow`   | RadioPort    | ESP-NOW broadcast link      |
//! | `hardware` | SensorPort   | ADS1115 over I²C, ADC1      |
//! |            | ActuatorPort | Solenoid GPIO               |
//! | `log_sink` | EventSink    | Serial log output           |
//! | `nvs`      | ConfigPort   | NVS / in-memory store       |
//! |            | StoragePort  |                             |
//! | `time`     | TimePort     | ESP32 system timer          |

pub mod espnow;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
