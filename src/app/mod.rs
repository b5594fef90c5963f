// Application - shared context and the controller that drives it

pub mod console;
pub mod context;
pub mod controller;

pub use console::{ConsoleInput, HELP, ParseError, parse_line};
pub use context::AppContext;
pub use controller::{CONTROLLER_NOTIFICATIONS, Controller, Flow};

use crate::config::ConfigError;
use crate::midi::MidiError;
use crate::sequencer::ClockError;
use crate::settings::SettingsError;

/// Fatal startup errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("MIDI error: {0}")]
    Midi(#[from] MidiError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
