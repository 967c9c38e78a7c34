//! # EnOcean Bridge Library
//!
//! Gateway for EnOcean ESP3 serial transceivers.
//!
//! This library decodes the ESP3 byte stream from a USB transceiver into
//! CRC-validated packets, decodes the ERP2 radio telegrams they carry,
//! interprets rocker-switch button presses, and forwards the resulting
//! events to a local CSV log and a remote collector.

pub mod config;
pub mod error;
pub mod esp3;
pub mod events;
pub mod logger;
pub mod serial;
