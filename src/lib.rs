// Technocoid - Library exports for the binary, tests and benchmarks

pub mod app;
pub mod config;
pub mod messaging;
pub mod midi;
pub mod player;
pub mod sequencer;
pub mod settings;

// Re-export commonly used types for convenience
pub use app::{AppContext, AppError, Controller};
pub use config::AppConfig;
pub use messaging::{EventBus, Notification, NotificationKind, create_command_channel};
pub use midi::{MidiDispatcher, MidiEvent, MidiEventType, MidiMessage};
pub use player::{MediaSink, TrackPlayer};
pub use sequencer::{SequencerGrid, Tempo, TempoClock};
