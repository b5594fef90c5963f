// Raw MIDI messages as delivered by the input port

/// Channel voice messages the dispatcher understands
///
/// Channels are 1-based (1..=16) as shown on hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl MidiMessage {
    /// Parse a raw MIDI message
    /// Unsupported or truncated messages yield None
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        if data.len() < 2 {
            return None;
        }

        let channel = (status & 0x0F) + 1;
        let first = data[0] & 0x7F;
        let second = data[1] & 0x7F;

        match status & 0xF0 {
            0x90 => {
                // Velocity 0 = Note Off
                if second == 0 {
                    Some(MidiMessage::NoteOff {
                        channel,
                        note: first,
                    })
                } else {
                    Some(MidiMessage::NoteOn {
                        channel,
                        note: first,
                        velocity: second,
                    })
                }
            }
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: first,
            }),
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                controller: first,
                value: second,
            }),
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. } => channel,
        }
    }
}
