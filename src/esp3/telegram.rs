//! # ERP2 Telegram Decoder
//!
//! Decodes the data field of an ESP3 radio packet as an EnOcean Radio
//! Protocol 2 telegram. Two on-wire layouts exist, selected purely by
//! total length: the full layout (more than six bytes) with a bit-packed
//! header and a trailing CRC, and the compact layout (one to six bytes)
//! whose field widths come from a fixed length table.
//!
//! Both decode paths are pure functions of the input slice; no state is
//! carried between calls.

use super::crc::crc8;
use super::protocol::*;

/// Decode one ERP2 telegram, choosing the layout by length
///
/// # Errors
///
/// Returns a [`DecodeError`] for reserved address-control values,
/// lengths no layout covers, or a full-layout CRC mismatch. All of these
/// mean the telegram is dropped; none is fatal to the stream.
pub fn decode_telegram(data: &[u8]) -> Result<Erp2Telegram, DecodeError> {
    if data.len() > ERP2_MAX_COMPACT_LENGTH {
        decode_full(data).map(Erp2Telegram::Full)
    } else {
        decode_compact(data).map(Erp2Telegram::Compact)
    }
}

/// Decode the full (long) telegram layout
///
/// Header byte: top 3 bits address control, bit 4 extended-header flag,
/// low nibble telegram type. Type 0b1111 announces an extended
/// telegram-type byte. The last byte is a CRC8 over everything before it.
fn decode_full(data: &[u8]) -> Result<FullTelegram, DecodeError> {
    let header = data[0];
    let address_control = header >> ERP2_ADDRESS_CONTROL_SHIFT;
    let extended_header = header & ERP2_EXTENDED_HEADER_FLAG != 0;
    let telegram_type = header & ERP2_TELEGRAM_TYPE_MASK;
    let extended_type = telegram_type == ERP2_EXTENDED_TYPE_MARKER;

    let (originator_len, destination_len) = address_control_widths(address_control)
        .ok_or(DecodeError::InvalidAddressControl(address_control))?;

    let mut repeater_count = None;
    let mut optional_length = 0usize;
    if extended_header {
        let extended = data[1];
        repeater_count = Some(extended >> 4);
        optional_length = (extended & 0x0F) as usize;
    }

    // The radio stack reads the extended telegram type from fixed offset 2
    // even though the originator offset below accounts for both flag
    // bytes; the two disagree when only the extended-type flag is set.
    // Kept as shipped pending confirmation against the protocol document.
    let extended_telegram_type = extended_type.then(|| data[2]);

    let originator_offset = 1 + usize::from(extended_header) + usize::from(extended_type);
    let destination_offset = originator_offset + originator_len;
    let data_offset = destination_offset + destination_len;
    let payload_end = data
        .len()
        .checked_sub(1 + optional_length)
        .filter(|&end| data_offset <= end)
        .ok_or(DecodeError::UnsupportedTelegramLength(data.len()))?;

    let originator_id = data[originator_offset..destination_offset].to_vec();
    let destination_id =
        (destination_len > 0).then(|| data[destination_offset..data_offset].to_vec());
    let payload = data[data_offset..payload_end].to_vec();
    let optional_data = data[payload_end..data.len() - 1].to_vec();

    let received = data[data.len() - 1];
    let computed = crc8(&data[..data.len() - 1]);
    if received != computed {
        return Err(DecodeError::TelegramCrcMismatch { computed, received });
    }

    Ok(FullTelegram {
        telegram_type,
        extended_telegram_type,
        repeater_count,
        originator_id,
        destination_id,
        data: payload,
        optional_data,
    })
}

/// Decode the compact (short) telegram layout
///
/// No CRC and no extended fields; the originator-id and data widths come
/// from the length table alone.
fn decode_compact(data: &[u8]) -> Result<CompactTelegram, DecodeError> {
    let (originator_len, _) = compact_widths(data.len())
        .ok_or(DecodeError::UnsupportedTelegramLength(data.len()))?;

    Ok(CompactTelegram {
        originator_id: data[..originator_len].to_vec(),
        data: data[originator_len..].to_vec(),
    })
}
