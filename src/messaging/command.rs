// Control commands - UI → Controller
// Consumed by the single thread owning the controller

use crate::midi::event_type::MidiEventType;
use crate::sequencer::tempo::TempoNudge;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    Start,
    Stop,
    TogglePlay,
    Rewind,
    SetTempo(u32),
    NudgeTempo(TempoNudge),
    Tap,
    SetOpacity { track: usize, value: f64 },
    SetPlaybackRate { track: usize, value: f64 },
    ResetPlaybackRate(usize),
    LoadClip { track: usize, slot: usize, path: PathBuf },
    ToggleSlot { track: usize, slot: usize },
    ClearSlot { track: usize, slot: usize },
    ActivateAll(usize),
    DeactivateAll(usize),
    ClearTrack(usize),
    SelectNextTrack,
    Learn(MidiEventType),
    SelectMidiDevice(usize),
    SetFullscreen(bool),
    SaveBindings,
    ResetBindings,
    Quit,
}

pub type CommandSender = crossbeam_channel::Sender<ControlCommand>;
pub type CommandReceiver = crossbeam_channel::Receiver<ControlCommand>;

pub fn create_command_channel() -> (CommandSender, CommandReceiver) {
    crossbeam_channel::unbounded()
}
