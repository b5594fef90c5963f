// MIDI event types - the logical controls a binding can target

use crate::sequencer::grid::{MAX_STEPS, MAX_TRACKS};
use std::fmt;

/// Logical control types understood by the application
///
/// `Empty` is the "no selection" sentinel and never has a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiEventType {
    TrackOpacity(u8),
    TrackPlaybackRate(u8),
    Bpm,
    PlayToggle,
    Rewind,
    TapTempo,
    TrackSelect,
    SlotToggle(u8),
    Empty,
}

/// Expected shape of the MIDI message bound to an event type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlShape {
    /// Bound to a Control Change, the value is the controller value
    Ranged,
    /// Bound to a Note On, the value is the note number
    Toggle,
}

const OPACITY_BASE: usize = 0;
const PLAYBACK_RATE_BASE: usize = OPACITY_BASE + MAX_TRACKS;
const BPM: usize = PLAYBACK_RATE_BASE + MAX_TRACKS;
const PLAY_TOGGLE: usize = BPM + 1;
const REWIND: usize = BPM + 2;
const TAP_TEMPO: usize = BPM + 3;
const TRACK_SELECT: usize = BPM + 4;
const SLOT_TOGGLE_BASE: usize = TRACK_SELECT + 1;

impl MidiEventType {
    /// Number of bindable event types (everything but `Empty`)
    pub const COUNT: usize = SLOT_TOGGLE_BASE + MAX_STEPS;

    /// Stable index used by the binding table and the settings file
    /// None for `Empty` and for track/slot indices outside the topology
    pub fn ordinal(&self) -> Option<usize> {
        match *self {
            MidiEventType::TrackOpacity(track) if (track as usize) < MAX_TRACKS => {
                Some(OPACITY_BASE + track as usize)
            }
            MidiEventType::TrackPlaybackRate(track) if (track as usize) < MAX_TRACKS => {
                Some(PLAYBACK_RATE_BASE + track as usize)
            }
            MidiEventType::Bpm => Some(BPM),
            MidiEventType::PlayToggle => Some(PLAY_TOGGLE),
            MidiEventType::Rewind => Some(REWIND),
            MidiEventType::TapTempo => Some(TAP_TEMPO),
            MidiEventType::TrackSelect => Some(TRACK_SELECT),
            MidiEventType::SlotToggle(slot) if (slot as usize) < MAX_STEPS => {
                Some(SLOT_TOGGLE_BASE + slot as usize)
            }
            _ => None,
        }
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        let event_type = match ordinal {
            o if o < PLAYBACK_RATE_BASE => MidiEventType::TrackOpacity((o - OPACITY_BASE) as u8),
            o if o < BPM => MidiEventType::TrackPlaybackRate((o - PLAYBACK_RATE_BASE) as u8),
            BPM => MidiEventType::Bpm,
            PLAY_TOGGLE => MidiEventType::PlayToggle,
            REWIND => MidiEventType::Rewind,
            TAP_TEMPO => MidiEventType::TapTempo,
            TRACK_SELECT => MidiEventType::TrackSelect,
            o if o < Self::COUNT => MidiEventType::SlotToggle((o - SLOT_TOGGLE_BASE) as u8),
            _ => return None,
        };
        Some(event_type)
    }

    /// All bindable event types in ordinal order
    pub fn all() -> impl Iterator<Item = MidiEventType> {
        (0..Self::COUNT).filter_map(Self::from_ordinal)
    }

    /// None for `Empty`
    pub fn shape(&self) -> Option<ControlShape> {
        match self {
            MidiEventType::TrackOpacity(_)
            | MidiEventType::TrackPlaybackRate(_)
            | MidiEventType::Bpm => Some(ControlShape::Ranged),
            MidiEventType::PlayToggle
            | MidiEventType::Rewind
            | MidiEventType::TapTempo
            | MidiEventType::TrackSelect
            | MidiEventType::SlotToggle(_) => Some(ControlShape::Toggle),
            MidiEventType::Empty => None,
        }
    }
}

impl fmt::Display for MidiEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiEventType::TrackOpacity(track) => write!(f, "Track {} opacity", track + 1),
            MidiEventType::TrackPlaybackRate(track) => {
                write!(f, "Track {} playback rate", track + 1)
            }
            MidiEventType::Bpm => write!(f, "BPM"),
            MidiEventType::PlayToggle => write!(f, "Play/stop"),
            MidiEventType::Rewind => write!(f, "Rewind"),
            MidiEventType::TapTempo => write!(f, "Tap tempo"),
            MidiEventType::TrackSelect => write!(f, "Track select"),
            MidiEventType::SlotToggle(slot) => write!(f, "Slot {} toggle", slot + 1),
            MidiEventType::Empty => write!(f, "None"),
        }
    }
}

/// A matched binding, republished as an application event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEvent {
    pub event_type: MidiEventType,
    /// Controller value for ranged types, note number for toggle types
    pub value: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_roundtrip_for_all() {
        let all: Vec<_> = MidiEventType::all().collect();
        assert_eq!(all.len(), MidiEventType::COUNT);

        for (index, event_type) in all.iter().enumerate() {
            assert_eq!(event_type.ordinal(), Some(index));
        }
    }

    #[test]
    fn test_ordinal_layout() {
        assert_eq!(MidiEventType::TrackOpacity(0).ordinal(), Some(0));
        assert_eq!(MidiEventType::TrackPlaybackRate(0).ordinal(), Some(4));
        assert_eq!(MidiEventType::Bpm.ordinal(), Some(8));
        assert_eq!(MidiEventType::TrackSelect.ordinal(), Some(12));
        assert_eq!(MidiEventType::SlotToggle(0).ordinal(), Some(13));
        assert_eq!(MidiEventType::SlotToggle(11).ordinal(), Some(24));
        assert_eq!(MidiEventType::from_ordinal(25), None);
    }

    #[test]
    fn test_empty_and_out_of_topology_have_no_ordinal() {
        assert_eq!(MidiEventType::Empty.ordinal(), None);
        assert_eq!(MidiEventType::TrackOpacity(4).ordinal(), None);
        assert_eq!(MidiEventType::SlotToggle(12).ordinal(), None);
    }

    #[test]
    fn test_shapes() {
        assert_eq!(
            MidiEventType::TrackOpacity(1).shape(),
            Some(ControlShape::Ranged)
        );
        assert_eq!(MidiEventType::Bpm.shape(), Some(ControlShape::Ranged));
        assert_eq!(MidiEventType::TapTempo.shape(), Some(ControlShape::Toggle));
        assert_eq!(
            MidiEventType::SlotToggle(3).shape(),
            Some(ControlShape::Toggle)
        );
        assert_eq!(MidiEventType::Empty.shape(), None);
    }
}
