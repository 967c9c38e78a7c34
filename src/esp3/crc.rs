//! # ESP3 CRC8 Implementation
//!
//! CRC8 checksum calculation for the EnOcean Serial Protocol 3.
//!
//! **Polynomial**: 0x07 (x^8 + x^2 + x + 1)
//! **Initial Value**: 0x00
//!
//! ESP3 uses this checksum twice per packet: once over the four header
//! bytes and once over the data and optional-data bytes. ERP2 telegrams
//! carry a third CRC of the same kind over the telegram body.

/// ESP3 CRC8 polynomial
const CRC8_POLY: u8 = 0x07;

/// Precomputed CRC8 lookup table for fast calculation
const CRC8_TABLE: [u8; 256] = generate_crc8_table();

/// Generate CRC8 lookup table at compile time
const fn generate_crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate the ESP3 CRC8 checksum using the lookup table
///
/// The checksum is order-sensitive: it must always be computed over the
/// full concatenated byte range, never combined from partial checksums.
///
/// # Arguments
///
/// * `data` - Byte slice to calculate the CRC for
///
/// # Returns
///
/// * `u8` - Calculated CRC8 checksum
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc = CRC8_TABLE[(crc ^ byte) as usize];
    }

    crc
}

/// Calculate the ESP3 CRC8 checksum bit by bit (slow, for verification)
///
/// Easier to check against the protocol document than the table version.
/// Used only to cross-validate the lookup table in tests.
#[allow(dead_code)]
fn crc8_slow(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
