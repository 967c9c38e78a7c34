//! # Event Logging Module
//!
//! Persists and forwards switch events collected by the gateway.
//!
//! This module handles:
//! - Appending events to per-day local CSV files with a retention sweep
//! - Delivering event batches to the remote collector over HTTP,
//!   requeuing failed batches until a retry deadline passes

pub mod cloud;
pub mod local;

pub use cloud::CloudLogger;
pub use local::LocalFileLogger;
