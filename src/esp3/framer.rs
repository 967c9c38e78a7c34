//! # ESP3 Stream Framer
//!
//! Extracts complete, CRC-validated ESP3 packets from an arbitrarily
//! chunked serial byte stream.
//!
//! The framer owns a single buffer of not-yet-consumed bytes. Each `feed`
//! call appends the chunk and then repeatedly scans for packets: every
//! 0x55 byte is a candidate start, a candidate is adopted once the four
//! header bytes check against the header CRC, and a located packet is
//! emitted only after its data CRC also checks. Corrupt packets are
//! dropped without desynchronizing the stream, and leading noise is
//! discarded. Output is identical no matter how the stream is chunked.

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, warn};

use super::crc::crc8;
use super::protocol::{ESP3_HEADER_SIZE, ESP3_PACKET_OVERHEAD, ESP3_SYNC_BYTE};

/// One complete packet as it appeared on the wire, sync byte through
/// trailing CRC, validated against both checksums. Not mutated after
/// extraction.
pub type RawFrame = Bytes;

/// Upper bound on buffered unconsumed bytes
///
/// The largest frame a real transceiver emits is far below this; a stream
/// that keeps a frame perpetually incomplete (e.g. a corrupt length field
/// behind a valid-looking header) would otherwise grow the buffer without
/// bound. Exceeding the cap forces a resynchronization.
pub const MAX_BUFFER_SIZE: usize = 4096;

/// Outcome of one scan pass over the buffer
enum Scan {
    /// Complete valid packet extracted; keep scanning
    Packet(RawFrame),
    /// Complete packet failed its data CRC and was dropped; keep scanning
    Dropped,
    /// No further progress possible: waiting for data or buffer cleared
    Stalled,
}

/// Stateful ESP3 packet framer
///
/// Owns one mutable buffer and is not safe for concurrent `feed` calls;
/// it is driven from a single serial read loop.
#[derive(Debug, Default)]
pub struct Esp3Framer {
    /// Unconsumed bytes carried across `feed` calls
    buffer: BytesMut,
}

impl Esp3Framer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Ingest one chunk and extract every complete packet it unlocks
    ///
    /// Accepts chunks of any size, including empty and frame-spanning
    /// ones. Packets are returned in the order their sync bytes occur in
    /// the stream; packets whose data CRC fails are logged and skipped
    /// without appearing in the output.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut packets = Vec::new();
        loop {
            match self.scan_once() {
                Scan::Packet(frame) => packets.push(frame),
                Scan::Dropped => continue,
                Scan::Stalled => break,
            }
        }

        // Cap only what the scan could not consume; a chunk full of valid
        // packets must extract identically no matter how it is split.
        self.enforce_buffer_cap();
        packets
    }

    /// Bytes currently buffered awaiting completion of a packet
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// One pass of the packet scan: locate a packet start, then extract
    /// the packet if it is complete.
    fn scan_once(&mut self) -> Scan {
        // Every sync byte is a candidate packet start; probe them in order.
        let mut adopted = false;
        let mut candidate_seen = false;
        for pos in 0..self.buffer.len() {
            if self.buffer[pos] != ESP3_SYNC_BYTE {
                continue;
            }
            candidate_seen = true;

            if self.buffer.len() - pos < ESP3_HEADER_SIZE {
                // Too short to test the header; later candidates have even
                // fewer trailing bytes, so retain from here and wait.
                self.buffer.advance(pos);
                return Scan::Stalled;
            }

            let header = &self.buffer[pos + 1..pos + 5];
            if crc8(header) == self.buffer[pos + 5] {
                if pos > 0 {
                    debug!(skipped = pos, "discarding bytes before packet start");
                }
                self.buffer.advance(pos);
                adopted = true;
                break;
            }
        }

        if !candidate_seen {
            // Nothing recoverable in the buffer.
            self.buffer.clear();
            return Scan::Stalled;
        }
        if !adopted {
            // Every candidate had enough bytes and failed the header CRC.
            debug!("no valid packet header in buffer, clearing");
            self.buffer.clear();
            return Scan::Stalled;
        }

        let data_length = u16::from_be_bytes([self.buffer[1], self.buffer[2]]) as usize;
        let optional_length = self.buffer[3] as usize;
        let packet_length = ESP3_PACKET_OVERHEAD + data_length + optional_length;
        if self.buffer.len() < packet_length {
            // Packet located but incomplete; wait for more data.
            return Scan::Stalled;
        }

        let received_crc = self.buffer[packet_length - 1];
        let computed_crc = crc8(&self.buffer[ESP3_HEADER_SIZE..packet_length - 1]);
        let frame = self.buffer.split_to(packet_length).freeze();

        if computed_crc != received_crc {
            warn!(
                computed = format_args!("0x{computed_crc:02X}"),
                received = format_args!("0x{received_crc:02X}"),
                "data CRC mismatch, dropping packet"
            );
            return Scan::Dropped;
        }

        Scan::Packet(frame)
    }

    /// Cut the stalled residual back when it outgrows the cap
    ///
    /// A located packet head at the front is left alone even over the
    /// cap: its length field is covered by the already-validated header
    /// CRC, so growth is bounded by the announced packet length and the
    /// packet will extract (or be dropped) once complete. Anything else
    /// is unconsumable; resynchronize to the last sync candidate, or
    /// clear when none exists.
    fn enforce_buffer_cap(&mut self) {
        if self.buffer.len() <= MAX_BUFFER_SIZE || self.has_located_packet() {
            return;
        }
        match self.buffer.iter().rposition(|&b| b == ESP3_SYNC_BYTE) {
            Some(pos) if pos > 0 => {
                warn!(dropped = pos, "framer buffer overflow, resynchronizing");
                self.buffer.advance(pos);
            }
            _ => {
                warn!(
                    dropped = self.buffer.len(),
                    "framer buffer overflow with no recoverable sync, clearing"
                );
                self.buffer.clear();
            }
        }
    }

    /// Whether the buffer starts with a header-validated packet awaiting
    /// its remaining bytes
    fn has_located_packet(&self) -> bool {
        self.buffer.len() >= ESP3_HEADER_SIZE
            && self.buffer[0] == ESP3_SYNC_BYTE
            && crc8(&self.buffer[1..5]) == self.buffer[5]
    }
}
