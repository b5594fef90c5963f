// Notification catalog - everything the core broadcasts on the event bus

use crate::messaging::status::StatusMessage;
use crate::midi::event_type::{MidiEvent, MidiEventType};

/// A notification published on the [`EventBus`](crate::messaging::bus::EventBus)
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The sequencer advanced (or was reset) to a new step
    PositionChanged(usize),
    /// The sequencer was started (`true`) or stopped (`false`)
    PlayStateChanged(bool),
    /// The opacity of a track was changed in the grid
    TrackOpacityChanged(usize),
    /// The playback rate of a track was changed in the grid
    TrackPlaybackRateChanged(usize),
    /// The player should enter or leave fullscreen mode
    FullscreenModeChanged(bool),
    /// The list of MIDI input devices changed
    AvailableMidiDevicesChanged,
    /// A MIDI input device was selected by index
    SelectedMidiDeviceChanged(usize),
    /// A learned MIDI binding matched an incoming message
    MidiEventReceived(MidiEvent),
    /// Request to learn a binding (`Empty` cancels learning)
    LearnMidiEvent(MidiEventType),
    /// A binding was learned
    MidiEventLearned(MidiEventType),
    /// Human readable status line
    Status(StatusMessage),
}

/// Discriminant of a [`Notification`], used to filter subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    PositionChanged,
    PlayStateChanged,
    TrackOpacityChanged,
    TrackPlaybackRateChanged,
    FullscreenModeChanged,
    AvailableMidiDevicesChanged,
    SelectedMidiDeviceChanged,
    MidiEventReceived,
    LearnMidiEvent,
    MidiEventLearned,
    Status,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::PositionChanged(_) => NotificationKind::PositionChanged,
            Notification::PlayStateChanged(_) => NotificationKind::PlayStateChanged,
            Notification::TrackOpacityChanged(_) => NotificationKind::TrackOpacityChanged,
            Notification::TrackPlaybackRateChanged(_) => NotificationKind::TrackPlaybackRateChanged,
            Notification::FullscreenModeChanged(_) => NotificationKind::FullscreenModeChanged,
            Notification::AvailableMidiDevicesChanged => {
                NotificationKind::AvailableMidiDevicesChanged
            }
            Notification::SelectedMidiDeviceChanged(_) => {
                NotificationKind::SelectedMidiDeviceChanged
            }
            Notification::MidiEventReceived(_) => NotificationKind::MidiEventReceived,
            Notification::LearnMidiEvent(_) => NotificationKind::LearnMidiEvent,
            Notification::MidiEventLearned(_) => NotificationKind::MidiEventLearned,
            Notification::Status(_) => NotificationKind::Status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            Notification::PositionChanged(3).kind(),
            NotificationKind::PositionChanged
        );
        assert_eq!(
            Notification::AvailableMidiDevicesChanged.kind(),
            NotificationKind::AvailableMidiDevicesChanged
        );
        assert_eq!(
            Notification::MidiEventLearned(MidiEventType::Bpm).kind(),
            NotificationKind::MidiEventLearned
        );
    }
}
