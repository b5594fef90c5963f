// MIDI dispatcher - routes raw messages into learning or into application events

use crate::messaging::{EventBus, Notification, StatusCategory, StatusMessage};
use crate::midi::binding::{MidiBindingTable, MidiEventTrigger};
use crate::midi::event_type::{ControlShape, MidiEvent, MidiEventType};
use crate::midi::message::MidiMessage;
use log::{debug, info};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Dispatcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnMode {
    Idle,
    /// Waiting for a message of the right shape for this event type
    Learning(MidiEventType),
}

/// What happened to a raw message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The message completed a learning session
    Learned(MidiEventType),
    /// Number of application events published
    Dispatched(usize),
    Ignored,
}

struct DispatcherState {
    mode: LearnMode,
    table: MidiBindingTable,
}

pub struct MidiDispatcher {
    state: Mutex<DispatcherState>,
    bus: EventBus,
}

impl MidiDispatcher {
    pub fn new(bus: EventBus) -> Self {
        Self::with_table(bus, MidiBindingTable::new())
    }

    /// Dispatcher starting from previously persisted bindings
    pub fn with_table(bus: EventBus, table: MidiBindingTable) -> Self {
        Self {
            state: Mutex::new(DispatcherState {
                mode: LearnMode::Idle,
                table,
            }),
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DispatcherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a learning session, `Empty` cancels any open one
    pub fn begin_learning(&self, event_type: MidiEventType) {
        let mut state = self.lock();
        state.mode = match event_type.ordinal() {
            Some(_) => {
                info!("Learning MIDI binding for {}", event_type);
                LearnMode::Learning(event_type)
            }
            None => {
                if state.mode != LearnMode::Idle {
                    info!("MIDI learning cancelled");
                }
                LearnMode::Idle
            }
        };
    }

    /// Reacts to bus notifications addressed to the dispatcher
    pub fn handle(&self, notification: &Notification) {
        if let Notification::LearnMidiEvent(event_type) = notification {
            self.begin_learning(*event_type);
        }
    }

    /// Entry point for every parsed message from the input port
    pub fn on_raw_message(&self, message: MidiMessage) -> DispatchOutcome {
        let mut state = self.lock();
        let mode = state.mode;

        match mode {
            LearnMode::Learning(event_type) => {
                let Some(trigger) = MidiEventTrigger::from_message(event_type, message) else {
                    debug!("Ignoring {:?} while learning {}", message, event_type);
                    return DispatchOutcome::Ignored;
                };

                state.table.bind(trigger);
                state.mode = LearnMode::Idle;
                info!(
                    "Learned {} from {:?} (id {})",
                    event_type, message, trigger.binding.id
                );

                self.bus.publish(Notification::MidiEventLearned(event_type));
                self.bus.publish(Notification::Status(StatusMessage::info(
                    StatusCategory::Midi,
                    format!("MIDI event learned: {}", event_type),
                )));
                DispatchOutcome::Learned(event_type)
            }
            LearnMode::Idle => {
                let (shape, id, value) = match message {
                    MidiMessage::ControlChange {
                        controller, value, ..
                    } => (ControlShape::Ranged, controller, value),
                    MidiMessage::NoteOn { note, .. } => (ControlShape::Toggle, note, note),
                    MidiMessage::NoteOff { .. } => return DispatchOutcome::Ignored,
                };

                let mut published = 0;
                for trigger in state.table.matching(shape, id) {
                    self.bus.publish(Notification::MidiEventReceived(MidiEvent {
                        event_type: trigger.event_type,
                        value,
                    }));
                    published += 1;
                }

                if published == 0 {
                    debug!("No binding for {:?}", message);
                    return DispatchOutcome::Ignored;
                }
                DispatchOutcome::Dispatched(published)
            }
        }
    }

    pub fn mode(&self) -> LearnMode {
        self.lock().mode
    }

    /// Copy of the current bindings
    pub fn table(&self) -> MidiBindingTable {
        self.lock().table.clone()
    }

    /// Replace all bindings, e.g. after loading settings
    pub fn replace_table(&self, table: MidiBindingTable) {
        self.lock().table = table;
    }

    /// Drop every binding
    pub fn reset_bindings(&self) {
        self.lock().table.clear();
        info!("MIDI bindings reset");
    }
}
