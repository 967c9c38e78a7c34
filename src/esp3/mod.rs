//! # ESP3 Protocol Module
//!
//! Implementation of the EnOcean Serial Protocol 3 packet layer and the
//! ERP2 radio telegram layer.
//!
//! This module handles:
//! - Resynchronizing packet extraction from a chunked serial byte stream
//! - ESP3 CRC8 checksum calculation (header and data checks)
//! - ERP2 telegram decoding, full and compact layouts
//!
//! Reference documents: EnOcean Serial Protocol 3 and EnOcean Radio
//! Protocol 2 specifications.

pub mod crc;
pub mod frame;
pub mod framer;
pub mod protocol;
pub mod telegram;

pub use frame::decode_frame;
pub use framer::{Esp3Framer, RawFrame};
pub use protocol::{DecodeError, Erp2Telegram, RadioPacket};
pub use telegram::decode_telegram;
