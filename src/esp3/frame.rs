//! # ESP3 Frame Decoder
//!
//! Splits one validated ESP3 packet into its fields and decodes the
//! ERP2 telegram carried in the data field.

use tracing::debug;

use super::protocol::*;
use super::telegram::decode_telegram;
use crate::esp3::framer::RawFrame;

/// Decode one complete ESP3 packet into a radio packet
///
/// The framer has already validated both checksums, so this step trusts
/// the header fields and slice boundaries it re-derives. Only the ERP2
/// radio packet type is implemented; other packet types are reported as
/// [`DecodeError::UnsupportedPacketType`], which callers treat as a skip
/// signal rather than a fault.
///
/// # Errors
///
/// Returns a [`DecodeError`] when the packet type is not ERP2, when the
/// optional data cannot hold the link-quality fields, or when the
/// telegram itself fails to decode.
pub fn decode_frame(frame: &RawFrame) -> Result<RadioPacket, DecodeError> {
    let data_length = u16::from_be_bytes([frame[1], frame[2]]) as usize;
    let optional_length = frame[3] as usize;
    let packet_type = frame[4];

    let data = &frame[ESP3_HEADER_SIZE..ESP3_HEADER_SIZE + data_length];
    let optional_data =
        &frame[ESP3_HEADER_SIZE + data_length..ESP3_HEADER_SIZE + data_length + optional_length];

    if packet_type != PACKET_TYPE_RADIO_ERP2 {
        debug!(
            packet_type = format_args!("0x{packet_type:02X}"),
            "skipping unimplemented packet type"
        );
        return Err(DecodeError::UnsupportedPacketType(packet_type));
    }

    if optional_data.len() < ERP2_MIN_OPTIONAL_LENGTH {
        return Err(DecodeError::OptionalDataTooShort(optional_data.len()));
    }
    let sub_tel_count = optional_data[0];
    let dbm = optional_data[1];

    let telegram = decode_telegram(data)?;

    Ok(RadioPacket {
        raw_data: data.to_vec(),
        telegram,
        sub_tel_count,
        dbm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    const PACKET: [u8; 16] = [
        0x55, 0x00, 0x07, 0x02, 0x0A, 0x0A, 0x20, 0x00, 0x2E, 0x5C, 0x72, 0x84, 0xF2, 0x01, 0x32,
        0x8B,
    ];

    #[test]
    fn test_decode_radio_packet() {
        let frame = Bytes::copy_from_slice(&PACKET);
        let packet = decode_frame(&frame).unwrap();

        assert_eq!(packet.raw_data, vec![0x20, 0x00, 0x2E, 0x5C, 0x72, 0x84, 0xF2]);
        assert_eq!(packet.sub_tel_count, 1);
        assert_eq!(packet.dbm, 50);

        assert_eq!(packet.telegram.originator_id(), &[0x00, 0x2E, 0x5C, 0x72]);
        assert_eq!(packet.telegram.data(), &[0x84]);
        assert_eq!(packet.telegram.telegram_type(), Some(ERP2_TELEGRAM_TYPE_RPS));
    }

    #[test]
    fn test_unsupported_packet_type() {
        // Packet type 0x01 (ERP1), valid CRCs, one data byte, no optional data.
        let frame = Bytes::from_static(&[0x55, 0x00, 0x01, 0x00, 0x01, 0x6C, 0xAB, 0x58]);
        assert_eq!(
            decode_frame(&frame),
            Err(DecodeError::UnsupportedPacketType(0x01))
        );
    }

    #[test]
    fn test_optional_data_too_short() {
        // ERP2 radio packet announcing zero optional bytes: no room for
        // sub-telegram count and dBm.
        let data = [0x20, 0x00, 0x2E, 0x5C, 0x72, 0x84, 0xF2];
        let header = [0x00, 0x07, 0x00, 0x0A];
        let mut frame = vec![0x55];
        frame.extend_from_slice(&header);
        frame.push(crate::esp3::crc::crc8(&header));
        frame.extend_from_slice(&data);
        frame.push(crate::esp3::crc::crc8(&data));

        let frame = Bytes::from(frame);
        assert_eq!(
            decode_frame(&frame),
            Err(DecodeError::OptionalDataTooShort(0))
        );
    }

    #[test]
    fn test_telegram_failure_propagates() {
        // Same shape as PACKET but with the inner telegram CRC corrupted.
        let data = [0x20, 0x00, 0x2E, 0x5C, 0x72, 0x84, 0x00];
        let optional = [0x01, 0x32];
        let header = [0x00, 0x07, 0x02, 0x0A];
        let mut frame = vec![0x55];
        frame.extend_from_slice(&header);
        frame.push(crate::esp3::crc::crc8(&header));
        frame.extend_from_slice(&data);
        frame.extend_from_slice(&optional);
        let mut body = data.to_vec();
        body.extend_from_slice(&optional);
        frame.push(crate::esp3::crc::crc8(&body));

        let frame = Bytes::from(frame);
        assert!(matches!(
            decode_frame(&frame),
            Err(DecodeError::TelegramCrcMismatch { .. })
        ));
    }
}
