//! MIDI framing for the MC2000
//!
//! The controller only speaks three-byte channel messages: notes for buttons,
//! control changes for knobs, the jog wheel and LED feedback.

use std::fmt;

/// Channel messages the MC2000 sends or understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },
}

impl MidiMessage {
    /// Parse a message from raw bytes
    ///
    /// Anything that is not a complete note or CC frame yields `None`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 3 {
            return None;
        }

        let status = data[0];
        if !(0x80..0xF0).contains(&status) {
            return None;
        }

        let channel = status & 0x0F;
        let data1 = data[1] & 0x7F;
        let data2 = data[2] & 0x7F;

        match status & 0xF0 {
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: data1,
                velocity: data2,
            }),
            0x90 => {
                // Note On with velocity 0 is a release
                if data2 == 0 {
                    Some(MidiMessage::NoteOff {
                        channel,
                        note: data1,
                        velocity: 0,
                    })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note: data1,
                        velocity: data2,
                    })
                }
            },
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                cc: data1,
                value: data2,
            }),
            _ => None,
        }
    }

    /// Encode the message to MIDI bytes
    pub fn encode(&self) -> [u8; 3] {
        match *self {
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => [0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::ControlChange { channel, cc, value } => {
                [0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            },
        }
    }

    /// Zero-based MIDI channel
    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::ControlChange { channel, .. } => channel,
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity),
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity),
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            },
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_parsing() {
        let msg = MidiMessage::parse(&[0x91, 0x17, 0x7F]).unwrap();

        assert_eq!(
            msg,
            MidiMessage::NoteOn {
                channel: 1,
                note: 0x17,
                velocity: 0x7F,
            }
        );
    }

    #[test]
    fn test_note_on_velocity_zero() {
        let msg = MidiMessage::parse(&[0x90, 0x17, 0]).unwrap();

        assert_eq!(
            msg,
            MidiMessage::NoteOff {
                channel: 0,
                note: 0x17,
                velocity: 0,
            }
        );
    }

    #[test]
    fn test_control_change() {
        let msg = MidiMessage::parse(&[0xB1, 0x51, 0x41]).unwrap();

        assert_eq!(
            msg,
            MidiMessage::ControlChange {
                channel: 1,
                cc: 0x51,
                value: 0x41,
            }
        );
    }

    #[test]
    fn test_rejects_short_and_system_frames() {
        assert!(MidiMessage::parse(&[]).is_none());
        assert!(MidiMessage::parse(&[0x90, 0x17]).is_none());
        assert!(MidiMessage::parse(&[0xF8, 0x00, 0x00]).is_none());
        assert!(MidiMessage::parse(&[0x17, 0x7F, 0x00]).is_none());
        // Pitch bend is not part of the MC2000 map
        assert!(MidiMessage::parse(&[0xE0, 0x00, 0x40]).is_none());
    }

    #[test]
    fn test_encode() {
        let msg = MidiMessage::ControlChange {
            channel: 1,
            cc: 0x4A,
            value: 39,
        };
        assert_eq!(msg.encode(), [0xB1, 0x4A, 39]);
        assert_eq!(format_hex(&msg.encode()), "B1 4A 27");
    }
}
