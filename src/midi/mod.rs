// MIDI - message parsing, bindings, learning and device handling

pub mod binding;
pub mod device;
pub mod dispatcher;
pub mod event_type;
pub mod input;
pub mod message;

pub use binding::{MidiBinding, MidiBindingTable, MidiEventTrigger};
pub use device::{DeviceWatcher, MidiDeviceInfo, MidiDeviceManager, MidiError, WatcherHandle};
pub use dispatcher::{DispatchOutcome, LearnMode, MidiDispatcher};
pub use event_type::{ControlShape, MidiEvent, MidiEventType};
pub use input::MidiInputManager;
pub use message::MidiMessage;
