//! Power button via the Linux input event interface.
//!
//! Each `struct input_event` on a 64-bit kernel is 24 bytes: a 16-byte
//! timestamp followed by `type: u16`, `code: u16` and `value: i32` in native
//! byte order.

use std::io::{self, ErrorKind, Read};
use std::time::Instant;

use gatepanel_core::backlight::{ActivityTracker, ButtonEvent, PanelState, handle_button};
use log::debug;

pub const INPUT_EVENT_SIZE: usize = 24;
const EV_KEY: u16 = 0x01;
pub const KEY_POWER: u16 = 116;

/// Decode a power-key press or release. Autorepeat (value 2) and every
/// other event are ignored.
pub fn decode_event(raw: &[u8; INPUT_EVENT_SIZE]) -> Option<ButtonEvent> {
    let kind = u16::from_ne_bytes([raw[16], raw[17]]);
    let code = u16::from_ne_bytes([raw[18], raw[19]]);
    let value = i32::from_ne_bytes([raw[20], raw[21], raw[22], raw[23]]);
    if kind != EV_KEY || code != KEY_POWER {
        return None;
    }
    match value {
        1 => Some(ButtonEvent::Press),
        0 => Some(ButtonEvent::Release),
        _ => None,
    }
}

/// Block on `device`, feeding button edges to the tracker until EOF.
pub fn listen<R: Read>(mut device: R, tracker: &ActivityTracker, panel: &PanelState) -> io::Result<()> {
    let mut raw = [0u8; INPUT_EVENT_SIZE];
    loop {
        match device.read_exact(&mut raw) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        }
        if let Some(event) = decode_event(&raw) {
            debug!("Power button {:?}", event);
            handle_button(tracker, panel, event, Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatepanel_core::backlight::DimmerState;
    use std::io::Cursor;
    use std::time::Duration;

    fn event(kind: u16, code: u16, value: i32) -> [u8; INPUT_EVENT_SIZE] {
        let mut raw = [0u8; INPUT_EVENT_SIZE];
        raw[16..18].copy_from_slice(&kind.to_ne_bytes());
        raw[18..20].copy_from_slice(&code.to_ne_bytes());
        raw[20..24].copy_from_slice(&value.to_ne_bytes());
        raw
    }

    #[test]
    fn decodes_power_key_edges_only() {
        assert_eq!(decode_event(&event(EV_KEY, KEY_POWER, 1)), Some(ButtonEvent::Press));
        assert_eq!(decode_event(&event(EV_KEY, KEY_POWER, 0)), Some(ButtonEvent::Release));
        assert_eq!(decode_event(&event(EV_KEY, KEY_POWER, 2)), None);
        assert_eq!(decode_event(&event(EV_KEY, 30, 1)), None);
        // EV_SYN report
        assert_eq!(decode_event(&event(0, 0, 0)), None);
    }

    #[test]
    fn press_and_release_request_a_transition() {
        let tracker = ActivityTracker::new(Instant::now(), Duration::from_secs(5), Duration::ZERO);
        let panel = PanelState::new(20);
        panel.set_dimmer_state(DimmerState::Active);

        let mut stream = Vec::new();
        stream.extend_from_slice(&event(EV_KEY, KEY_POWER, 1));
        stream.extend_from_slice(&event(0, 0, 0));
        stream.extend_from_slice(&event(EV_KEY, KEY_POWER, 0));

        listen(Cursor::new(stream), &tracker, &panel).unwrap();
        assert!(panel.take_transition_request());
    }
}
