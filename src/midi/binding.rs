// MIDI bindings - learned association between event types and MIDI messages

use crate::midi::event_type::{ControlShape, MidiEventType};
use crate::midi::message::MidiMessage;

/// Identity of a learned MIDI control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiBinding {
    /// None when restored from settings, which only keep the id
    pub channel: Option<u8>,
    /// Controller number (ranged) or note number (toggle)
    pub id: u8,
}

/// A binding together with the message it was learned from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiEventTrigger {
    pub event_type: MidiEventType,
    pub binding: MidiBinding,
    pub learned_from: Option<MidiMessage>,
}

impl MidiEventTrigger {
    /// Build a trigger from a message of the right shape for the event type
    pub fn from_message(event_type: MidiEventType, message: MidiMessage) -> Option<Self> {
        let binding = match (event_type.shape()?, message) {
            (ControlShape::Ranged, MidiMessage::ControlChange {
                channel, controller, ..
            }) => MidiBinding {
                channel: Some(channel),
                id: controller,
            },
            (ControlShape::Toggle, MidiMessage::NoteOn { channel, note, .. }) => MidiBinding {
                channel: Some(channel),
                id: note,
            },
            _ => return None,
        };

        Some(Self {
            event_type,
            binding,
            learned_from: Some(message),
        })
    }

    /// Trigger restored from a persisted id
    pub fn restored(event_type: MidiEventType, id: u8) -> Self {
        Self {
            event_type,
            binding: MidiBinding { channel: None, id },
            learned_from: None,
        }
    }
}

/// One optional trigger per bindable event type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiBindingTable {
    triggers: Vec<Option<MidiEventTrigger>>,
}

impl MidiBindingTable {
    pub fn new() -> Self {
        Self {
            triggers: vec![None; MidiEventType::COUNT],
        }
    }

    /// Store a trigger, replacing any previous binding of its type
    /// Returns false if the event type has no table slot
    pub fn bind(&mut self, trigger: MidiEventTrigger) -> bool {
        match trigger.event_type.ordinal() {
            Some(ordinal) => {
                self.triggers[ordinal] = Some(trigger);
                true
            }
            None => false,
        }
    }

    pub fn unbind(&mut self, event_type: MidiEventType) {
        if let Some(ordinal) = event_type.ordinal() {
            self.triggers[ordinal] = None;
        }
    }

    pub fn get(&self, event_type: MidiEventType) -> Option<&MidiEventTrigger> {
        event_type
            .ordinal()
            .and_then(|ordinal| self.triggers[ordinal].as_ref())
    }

    /// Remove every binding
    pub fn clear(&mut self) {
        self.triggers.iter_mut().for_each(|trigger| *trigger = None);
    }

    /// All learned triggers in ordinal order
    pub fn triggers(&self) -> impl Iterator<Item = &MidiEventTrigger> {
        self.triggers.iter().flatten()
    }

    /// Triggers of the given shape whose id matches
    pub fn matching(&self, shape: ControlShape, id: u8) -> impl Iterator<Item = &MidiEventTrigger> {
        self.triggers().filter(move |trigger| {
            trigger.binding.id == id && trigger.event_type.shape() == Some(shape)
        })
    }

    pub fn len(&self) -> usize {
        self.triggers().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MidiBindingTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cc(controller: u8, value: u8) -> MidiMessage {
        MidiMessage::ControlChange {
            channel: 1,
            controller,
            value,
        }
    }

    fn note_on(note: u8) -> MidiMessage {
        MidiMessage::NoteOn {
            channel: 1,
            note,
            velocity: 100,
        }
    }

    #[test]
    fn test_trigger_from_matching_shape() {
        let trigger = MidiEventTrigger::from_message(MidiEventType::Bpm, cc(6, 40)).unwrap();
        assert_eq!(trigger.binding, MidiBinding {
                channel: Some(1),
                id: 6
            });

        let trigger =
            MidiEventTrigger::from_message(MidiEventType::PlayToggle, note_on(36)).unwrap();
        assert_eq!(trigger.binding.id, 36);
    }

    #[test]
    fn test_trigger_rejects_wrong_shape() {
        assert!(MidiEventTrigger::from_message(MidiEventType::Bpm, note_on(36)).is_none());
        assert!(MidiEventTrigger::from_message(MidiEventType::Rewind, cc(6, 1)).is_none());
        assert!(MidiEventTrigger::from_message(MidiEventType::Empty, cc(6, 1)).is_none());
        let note_off = MidiMessage::NoteOff { channel: 1, note: 36 };
        assert!(MidiEventTrigger::from_message(MidiEventType::Rewind, note_off).is_none());
    }

    #[test]
    fn test_controller_zero_is_a_real_binding() {
        let mut table = MidiBindingTable::new();
        let trigger =
            MidiEventTrigger::from_message(MidiEventType::TrackOpacity(0), cc(0, 10)).unwrap();
        assert!(table.bind(trigger));

        assert!(table.get(MidiEventType::TrackOpacity(0)).is_some());
        assert!(table.get(MidiEventType::TrackOpacity(1)).is_none());
        assert_eq!(table.matching(ControlShape::Ranged, 0).count(), 1);
    }

    #[test]
    fn test_matching_filters_by_shape() {
        let mut table = MidiBindingTable::new();
        table.bind(MidiEventTrigger::from_message(MidiEventType::Bpm, cc(20, 0)).unwrap());
        table.bind(
            MidiEventTrigger::from_message(MidiEventType::SlotToggle(2), note_on(20)).unwrap(),
        );

        let ranged: Vec<_> = table
            .matching(ControlShape::Ranged, 20)
            .map(|t| t.event_type)
            .collect();
        assert_eq!(ranged, vec![MidiEventType::Bpm]);

        let toggles: Vec<_> = table
            .matching(ControlShape::Toggle, 20)
            .map(|t| t.event_type)
            .collect();
        assert_eq!(toggles, vec![MidiEventType::SlotToggle(2)]);
    }

    #[test]
    fn test_rebind_unbind_and_clear() {
        let mut table = MidiBindingTable::new();
        table.bind(MidiEventTrigger::from_message(MidiEventType::Bpm, cc(6, 0)).unwrap());
        table.bind(MidiEventTrigger::from_message(MidiEventType::Bpm, cc(7, 0)).unwrap());
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(MidiEventType::Bpm).unwrap().binding.id, 7);

        table.unbind(MidiEventType::Bpm);
        assert!(table.is_empty());

        table.bind(MidiEventTrigger::from_message(MidiEventType::Rewind, note_on(1)).unwrap());
        table.clear();
        assert!(table.is_empty());
    }
}
