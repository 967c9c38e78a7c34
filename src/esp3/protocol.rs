//! # ESP3/ERP2 Protocol Constants and Types
//!
//! Wire-format definitions for the EnOcean Serial Protocol 3 packet layer
//! and the ERP2 radio telegram layer carried inside it.
//!
//! ESP3 packet layout (all multi-byte integers big-endian):
//!
//! ```text
//! Offset  Field                  Width
//! 0       sync byte (0x55)       1
//! 1-2     data length            2
//! 3       optional-data length   1
//! 4       packet type            1
//! 5       header CRC8            1
//! 6..     data                   data length
//! ..      optional data          optional-data length
//! last    data CRC8              1
//! ```

use thiserror::Error;

/// ESP3 sync byte marking a potential packet start
pub const ESP3_SYNC_BYTE: u8 = 0x55;

/// Header size: sync(1) + data length(2) + optional length(1) + type(1) + header CRC(1)
pub const ESP3_HEADER_SIZE: usize = 6;

/// Fixed per-packet overhead: header plus the trailing data CRC byte
pub const ESP3_PACKET_OVERHEAD: usize = ESP3_HEADER_SIZE + 1;

/// ERP2 radio telegram packet type
pub const PACKET_TYPE_RADIO_ERP2: u8 = 0x0A;

/// Radio packets carry at least sub-telegram count and dBm in optional data
pub const ERP2_MIN_OPTIONAL_LENGTH: usize = 2;

/// Longest ERP2 telegram decoded with the compact (checksum-less) layout
pub const ERP2_MAX_COMPACT_LENGTH: usize = 6;

/// ERP2 header byte: top 3 bits select originator/destination widths
pub const ERP2_ADDRESS_CONTROL_SHIFT: u8 = 5;

/// ERP2 header byte: bit 4 flags an extended-header byte
pub const ERP2_EXTENDED_HEADER_FLAG: u8 = 0x10;

/// ERP2 header byte: low nibble is the telegram type
pub const ERP2_TELEGRAM_TYPE_MASK: u8 = 0x0F;

/// Telegram type value signalling an extended-telegram-type byte
pub const ERP2_EXTENDED_TYPE_MARKER: u8 = 0b1111;

/// Telegram type of a repeated switch telegram (RPS)
pub const ERP2_TELEGRAM_TYPE_RPS: u8 = 0b0000;

/// Originator/destination identifier widths in bytes for an ERP2
/// address-control value, or `None` for the reserved values.
///
/// Only the four assigned combinations exist; `0b100`..`0b111` are reserved
/// by the radio protocol.
pub fn address_control_widths(value: u8) -> Option<(usize, usize)> {
    match value {
        0b000 => Some((3, 0)),
        0b001 => Some((4, 0)),
        0b010 => Some((4, 4)),
        0b011 => Some((6, 0)),
        _ => None,
    }
}

/// Originator-id and data widths in bytes for a compact ERP2 telegram,
/// selected purely by the total telegram length.
pub fn compact_widths(length: usize) -> Option<(usize, usize)> {
    match length {
        1 => Some((1, 0)),
        2 => Some((1, 1)),
        3 => Some((2, 1)),
        4 => Some((3, 1)),
        5 => Some((4, 1)),
        6 => Some((4, 2)),
        _ => None,
    }
}

/// Decode failure for a single frame or telegram
///
/// Every variant is a per-frame skip signal: the caller drops the frame,
/// logs the failure, and keeps processing the stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Packet type other than ERP2 radio; not implemented, skip
    #[error("packet type 0x{0:02X} not implemented")]
    UnsupportedPacketType(u8),

    /// Radio packet whose optional data cannot hold sub-telegram count and dBm
    #[error("optional data too short for a radio packet: {0} bytes")]
    OptionalDataTooShort(usize),

    /// Reserved ERP2 address-control value
    #[error("invalid address control value 0b{0:03b}")]
    InvalidAddressControl(u8),

    /// Telegram length outside both the full and compact layouts
    #[error("unsupported telegram length {0}")]
    UnsupportedTelegramLength(usize),

    /// Full-variant telegram CRC does not match its trailing byte
    #[error("telegram CRC mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    TelegramCrcMismatch { computed: u8, received: u8 },
}

/// One decoded ERP2 radio packet: the telegram plus the link-quality
/// metadata from the packet's optional data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioPacket {
    /// Raw telegram bytes as they appeared in the packet data field
    pub raw_data: Vec<u8>,

    /// Decoded telegram
    pub telegram: Erp2Telegram,

    /// Number of sub-telegrams received for this telegram
    pub sub_tel_count: u8,

    /// Received signal strength, dBm magnitude (unsigned, not sign-adjusted)
    pub dbm: u8,
}

/// An ERP2 telegram in one of its two on-wire layouts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Erp2Telegram {
    /// Bit-packed header, variable-width addressing, trailing CRC
    Full(FullTelegram),
    /// Short-form layout keyed by total length; no CRC, no extended fields
    Compact(CompactTelegram),
}

impl Erp2Telegram {
    /// Originator identifier bytes, whichever layout carried them
    pub fn originator_id(&self) -> &[u8] {
        match self {
            Erp2Telegram::Full(t) => &t.originator_id,
            Erp2Telegram::Compact(t) => &t.originator_id,
        }
    }

    /// Data payload bytes
    pub fn data(&self) -> &[u8] {
        match self {
            Erp2Telegram::Full(t) => &t.data,
            Erp2Telegram::Compact(t) => &t.data,
        }
    }

    /// Telegram type nibble; the compact layout does not carry one
    pub fn telegram_type(&self) -> Option<u8> {
        match self {
            Erp2Telegram::Full(t) => Some(t.telegram_type),
            Erp2Telegram::Compact(_) => None,
        }
    }
}

/// Full-variant ERP2 telegram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullTelegram {
    /// Telegram type nibble from the header byte
    pub telegram_type: u8,

    /// Extended telegram type byte, present when the type nibble is 0b1111
    pub extended_telegram_type: Option<u8>,

    /// Repeater count from the extended header, when present
    pub repeater_count: Option<u8>,

    /// Originator identifier (3, 4 or 6 bytes by address control)
    pub originator_id: Vec<u8>,

    /// Destination identifier, present only for address control 0b010
    pub destination_id: Option<Vec<u8>>,

    /// Data payload
    pub data: Vec<u8>,

    /// Sub-telegram trailer bytes announced by the extended header
    pub optional_data: Vec<u8>,
}

/// Compact-variant ERP2 telegram
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactTelegram {
    /// Originator identifier (1-4 bytes by telegram length)
    pub originator_id: Vec<u8>,

    /// Data payload (0-2 bytes by telegram length)
    pub data: Vec<u8>,
}
