//! Outbound activation command encoding
//!
//! The gateway keeps the ventilator in mixed mode by periodically sending
//! an activation command that names the data groups it wants and how each
//! should be delivered. The command uses the same envelope and checksum as
//! inbound frames.

use crate::frame::encode_frame;
use crate::CMD_ACTIVATE_MIXED_MODE;

/// Waveform streaming selector; this gateway always requests them off
const WAVEFORMS_OFF: u8 = 0x30;

/// Delivery mode for a requested data group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SendMode {
    /// Only when the repeat timer fires
    TimedOnly = 0x30,
    /// A single transmission
    Once = 0x31,
    /// At the start of every breath cycle
    BreathByBreath = 0x32,
    /// Whenever a value changes
    OnChange = 0x33,
}

/// Data groups requested by the activation command, in wire order
const REQUESTED_GROUPS: &[(u8, SendMode, u8)] = &[
    (0x50, SendMode::BreathByBreath, 0), // Monitored Parameters
    (0x70, SendMode::OnChange, 0),       // Control Settings
];

/// Build the mixed-mode activation command.
///
/// Payload is the waveforms-off selector followed by one
/// `[group id] [mode] [timer as 3 zero-padded ASCII digits]` triple per
/// requested group, sealed with the standard envelope. Deterministic:
/// repeated calls produce identical bytes.
pub fn build_activation_command() -> Vec<u8> {
    let mut body = vec![CMD_ACTIVATE_MIXED_MODE, WAVEFORMS_OFF];

    for &(group_id, mode, repeat_timer) in REQUESTED_GROUPS {
        body.push(group_id);
        body.push(mode as u8);
        body.extend_from_slice(format!("{:03}", repeat_timer).as_bytes());
    }

    encode_frame(&body)
}

#[cfg(test)]
mod tests {
    use super::build_activation_command;
    use crate::checksum::crc8;
    use crate::frame::validate_frame;

    #[test]
    fn test_activation_command_reference_encoding() {
        // 02 31 30 50 32 "000" 70 33 "000" 03 "1B" 0D
        let expected = [
            0x02, 0x31, 0x30, 0x50, 0x32, 0x30, 0x30, 0x30, 0x70, 0x33, 0x30, 0x30, 0x30, 0x03,
            b'1', b'B', 0x0D,
        ];
        assert_eq!(build_activation_command(), expected);
    }

    #[test]
    fn test_activation_command_checksum_matches_crc_unit() {
        let command = build_activation_command();
        // CRC over STX..ETX inclusive, i.e. everything but the trailer
        let crc = crc8(&command[..command.len() - 3]);
        assert_eq!(crc, 0x1B);
    }

    #[test]
    fn test_activation_command_is_deterministic() {
        assert_eq!(build_activation_command(), build_activation_command());
    }

    #[test]
    fn test_activation_command_validates_as_inbound_frame() {
        let command = build_activation_command();
        let payload = validate_frame(&command).unwrap();
        assert_eq!(payload[0], 0x31);
    }
}
