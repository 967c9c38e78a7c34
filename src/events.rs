//! # Switch Event Interpretation
//!
//! Turns decoded ERP2 radio packets into button-press events for the
//! F6-02-04 rocker switch profile.
//!
//! Data byte layout for the profile: bit 7 flags that any button is
//! pressed, bits 3..0 flag the A0/A1/B0/B1 buttons. A single telegram can
//! report several buttons at once.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::esp3::protocol::ERP2_TELEGRAM_TYPE_RPS;
use crate::esp3::RadioPacket;

/// One rocker button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Button {
    A0,
    A1,
    B0,
    B1,
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Button::A0 => "A0",
            Button::A1 => "A1",
            Button::B0 => "B0",
            Button::B1 => "B1",
        };
        f.write_str(name)
    }
}

/// One recorded button press
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchEvent {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Originator id as lowercase hex
    pub originator_id: String,

    /// Which button was pressed
    pub button_pressed: Button,

    /// Event counter, monotonically increasing for the gateway's lifetime
    pub count: u64,
}

/// Rocker state decoded from the profile's data byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RockerState {
    pub any_pressed: bool,
    pub a0: bool,
    pub a1: bool,
    pub b0: bool,
    pub b1: bool,
}

impl RockerState {
    pub fn from_byte(data: u8) -> Self {
        Self {
            any_pressed: data >> 7 != 0,
            a0: (data >> 3) & 1 != 0,
            a1: (data >> 2) & 1 != 0,
            b0: (data >> 1) & 1 != 0,
            b1: data & 1 != 0,
        }
    }

    fn pressed_buttons(&self) -> Vec<Button> {
        let mut buttons = Vec::new();
        if self.a0 {
            buttons.push(Button::A0);
        }
        if self.a1 {
            buttons.push(Button::A1);
        }
        if self.b0 {
            buttons.push(Button::B0);
        }
        if self.b1 {
            buttons.push(Button::B1);
        }
        buttons
    }
}

/// Turns radio packets into switch events for allow-listed originators
#[derive(Debug)]
pub struct EventInterpreter {
    /// Originator IDs (lowercase hex) accepted by this gateway
    originator_ids: Vec<String>,
    /// Running event counter
    count: u64,
}

impl EventInterpreter {
    pub fn new(originator_ids: Vec<String>) -> Self {
        Self {
            originator_ids,
            count: 0,
        }
    }

    /// Interpret one radio packet, producing zero or more events
    ///
    /// Only repeated-switch telegrams (type 0) from allow-listed
    /// originators produce events, and only while a button is pressed;
    /// everything else is logged and skipped.
    pub fn interpret(&mut self, packet: &RadioPacket) -> Vec<SwitchEvent> {
        if packet.telegram.telegram_type() != Some(ERP2_TELEGRAM_TYPE_RPS) {
            debug!("not a repeated switch telegram, skipping");
            return Vec::new();
        }

        let originator_id = hex_string(packet.telegram.originator_id());
        let Some(&data_byte) = packet.telegram.data().first() else {
            debug!(%originator_id, "switch telegram without a data byte");
            return Vec::new();
        };

        info!(
            data = format_args!("0x{data_byte:02x}"),
            %originator_id,
            sub_tel_count = packet.sub_tel_count,
            dbm = packet.dbm,
            "received switch telegram"
        );

        if !self.originator_ids.iter().any(|id| *id == originator_id) {
            info!(%originator_id, "originator not in allow list");
            return Vec::new();
        }

        let state = RockerState::from_byte(data_byte);
        if !state.any_pressed {
            // Release telegram; only presses are recorded.
            return Vec::new();
        }

        let timestamp = Utc::now().timestamp_millis();
        state
            .pressed_buttons()
            .into_iter()
            .map(|button| {
                let event = SwitchEvent {
                    timestamp,
                    originator_id: originator_id.clone(),
                    button_pressed: button,
                    count: self.count,
                };
                info!(button = ?button, "button pressed");
                self.count += 1;
                event
            })
            .collect()
    }
}

/// Lowercase hex rendering of an identifier
fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esp3::{decode_frame, RawFrame};

    const PACKET: [u8; 16] = [
        0x55, 0x00, 0x07, 0x02, 0x0A, 0x0A, 0x20, 0x00, 0x2E, 0x5C, 0x72, 0x84, 0xF2, 0x01, 0x32,
        0x8B,
    ];

    fn radio_packet() -> crate::esp3::RadioPacket {
        let frame = RawFrame::copy_from_slice(&PACKET);
        decode_frame(&frame).unwrap()
    }

    #[test]
    fn test_rocker_state_from_byte() {
        // 0x84: pressed flag plus A1
        let state = RockerState::from_byte(0x84);
        assert!(state.any_pressed);
        assert!(!state.a0);
        assert!(state.a1);
        assert!(!state.b0);
        assert!(!state.b1);

        let state = RockerState::from_byte(0x8F);
        assert_eq!(state.pressed_buttons(), vec![Button::A0, Button::A1, Button::B0, Button::B1]);

        let state = RockerState::from_byte(0x00);
        assert!(!state.any_pressed);
        assert!(state.pressed_buttons().is_empty());
    }

    #[test]
    fn test_interpret_allow_listed_press() {
        let mut interpreter = EventInterpreter::new(vec!["002e5c72".to_string()]);
        let events = interpreter.interpret(&radio_packet());

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].originator_id, "002e5c72");
        assert_eq!(events[0].button_pressed, Button::A1);
        assert_eq!(events[0].count, 0);
    }

    #[test]
    fn test_interpret_counter_increments() {
        let mut interpreter = EventInterpreter::new(vec!["002e5c72".to_string()]);
        interpreter.interpret(&radio_packet());
        let events = interpreter.interpret(&radio_packet());

        assert_eq!(events[0].count, 1);
    }

    #[test]
    fn test_interpret_unlisted_originator() {
        let mut interpreter = EventInterpreter::new(vec!["deadbeef".to_string()]);
        assert!(interpreter.interpret(&radio_packet()).is_empty());
    }

    #[test]
    fn test_interpret_release_produces_nothing() {
        let mut packet = radio_packet();
        if let crate::esp3::Erp2Telegram::Full(ref mut full) = packet.telegram {
            full.data = vec![0x04]; // A1 bit without the pressed flag
        }

        let mut interpreter = EventInterpreter::new(vec!["002e5c72".to_string()]);
        assert!(interpreter.interpret(&packet).is_empty());
    }

    #[test]
    fn test_interpret_compact_telegram_skipped() {
        // Compact telegrams carry no type nibble, so they never match the
        // repeated-switch type.
        let mut packet = radio_packet();
        packet.telegram = crate::esp3::Erp2Telegram::Compact(
            crate::esp3::protocol::CompactTelegram {
                originator_id: vec![0x00, 0x2E, 0x5C, 0x72],
                data: vec![0x84],
            },
        );

        let mut interpreter = EventInterpreter::new(vec!["002e5c72".to_string()]);
        assert!(interpreter.interpret(&packet).is_empty());
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(hex_string(&[0x00, 0x2E, 0x5C, 0x72]), "002e5c72");
        assert_eq!(hex_string(&[]), "");
    }

    #[test]
    fn test_event_serializes_to_expected_json() {
        let event = SwitchEvent {
            timestamp: 1_700_000_000_000,
            originator_id: "002e5c72".to_string(),
            button_pressed: Button::A1,
            count: 7,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["originator_id"], "002e5c72");
        assert_eq!(json["button_pressed"], "A1");
        assert_eq!(json["count"], 7);
    }
}
