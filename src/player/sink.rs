// Media sink - the boundary to whatever renders the clips

use crate::sequencer::ClipHandle;
use log::info;
use std::sync::{Arc, Mutex, PoisonError};

/// Receives playback commands, one independent player per track
///
/// The core never decodes media, it only tells the sink what to do.
pub trait MediaSink: Send {
    fn load_clip(&mut self, track: usize, clip: &ClipHandle);
    fn play(&mut self, track: usize);
    fn pause(&mut self, track: usize);
    fn seek_to_start(&mut self, track: usize);
    fn set_opacity(&mut self, track: usize, value: f64);
    fn set_playback_rate(&mut self, track: usize, value: f64);
}

/// Sink that only logs, used by the headless binary
#[derive(Debug, Default)]
pub struct LoggingMediaSink;

impl MediaSink for LoggingMediaSink {
    fn load_clip(&mut self, track: usize, clip: &ClipHandle) {
        info!("[track {}] load {}", track, clip);
    }

    fn play(&mut self, track: usize) {
        info!("[track {}] play", track);
    }

    fn pause(&mut self, track: usize) {
        info!("[track {}] pause", track);
    }

    fn seek_to_start(&mut self, track: usize) {
        info!("[track {}] seek to start", track);
    }

    fn set_opacity(&mut self, track: usize, value: f64) {
        info!("[track {}] opacity {:.2}", track, value);
    }

    fn set_playback_rate(&mut self, track: usize, value: f64) {
        info!("[track {}] playback rate {:.2}", track, value);
    }
}

/// A command received by a [`RecordingMediaSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCommand {
    LoadClip(usize, ClipHandle),
    Play(usize),
    Pause(usize),
    SeekToStart(usize),
    SetOpacity(usize, f64),
    SetPlaybackRate(usize, f64),
}

/// Sink that records every command, clones share the log
#[derive(Debug, Clone, Default)]
pub struct RecordingMediaSink {
    commands: Arc<Mutex<Vec<MediaCommand>>>,
}

impl RecordingMediaSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<MediaCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take the commands recorded so far
    pub fn take(&self) -> Vec<MediaCommand> {
        std::mem::take(&mut *self.commands.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn record(&self, command: MediaCommand) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }
}

impl MediaSink for RecordingMediaSink {
    fn load_clip(&mut self, track: usize, clip: &ClipHandle) {
        self.record(MediaCommand::LoadClip(track, clip.clone()));
    }

    fn play(&mut self, track: usize) {
        self.record(MediaCommand::Play(track));
    }

    fn pause(&mut self, track: usize) {
        self.record(MediaCommand::Pause(track));
    }

    fn seek_to_start(&mut self, track: usize) {
        self.record(MediaCommand::SeekToStart(track));
    }

    fn set_opacity(&mut self, track: usize, value: f64) {
        self.record(MediaCommand::SetOpacity(track, value));
    }

    fn set_playback_rate(&mut self, track: usize, value: f64) {
        self.record(MediaCommand::SetPlaybackRate(track, value));
    }
}
