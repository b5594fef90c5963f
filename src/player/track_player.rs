// Track player - turns clock ticks and track changes into media sink commands

use crate::messaging::{Notification, NotificationKind, Subscription};
use crate::player::sink::MediaSink;
use crate::sequencer::{ClipHandle, SequencerGrid, SharedGrid};
use log::{debug, warn};
use std::sync::PoisonError;
use std::thread;

/// Notifications the player reacts to
pub const PLAYER_NOTIFICATIONS: &[NotificationKind] = &[
    NotificationKind::PositionChanged,
    NotificationKind::PlayStateChanged,
    NotificationKind::TrackOpacityChanged,
    NotificationKind::TrackPlaybackRateChanged,
];

enum Trigger {
    Restart,
    Load(ClipHandle),
}

pub struct TrackPlayer {
    grid: SharedGrid,
    sink: Box<dyn MediaSink>,
    // Source identity of the clip currently loaded on each track
    loaded: Vec<Option<String>>,
}

impl TrackPlayer {
    pub fn new(grid: SharedGrid, sink: Box<dyn MediaSink>) -> Self {
        let tracks = grid
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .track_count();
        Self {
            grid,
            sink,
            loaded: vec![None; tracks],
        }
    }

    pub fn handle(&mut self, notification: &Notification) {
        match notification {
            Notification::PositionChanged(position) => self.on_position(*position),
            Notification::PlayStateChanged(false) => {
                for track in 0..self.loaded.len() {
                    self.sink.pause(track);
                }
            }
            Notification::TrackOpacityChanged(track) => {
                if let Some(value) = self.read_track(*track, |grid, t| grid.opacity(t)) {
                    self.sink.set_opacity(*track, value);
                }
            }
            Notification::TrackPlaybackRateChanged(track) => {
                if let Some(value) = self.read_track(*track, |grid, t| grid.playback_rate(t)) {
                    self.sink.set_playback_rate(*track, value);
                }
            }
            _ => {}
        }
    }

    fn read_track(
        &self,
        track: usize,
        read: impl FnOnce(&SequencerGrid, usize) -> f64,
    ) -> Option<f64> {
        let grid = self.grid.lock().unwrap_or_else(PoisonError::into_inner);
        if track >= grid.track_count() {
            warn!("Ignoring change for unknown track {}", track);
            return None;
        }
        Some(read(&grid, track))
    }

    fn on_position(&mut self, position: usize) {
        // Decide under the grid lock, talk to the sink after releasing it
        let mut triggers = Vec::new();
        {
            let grid = self.grid.lock().unwrap_or_else(PoisonError::into_inner);
            if position >= grid.steps_per_track() {
                warn!("Ignoring tick for unknown step {}", position);
                return;
            }

            for track in 0..grid.track_count() {
                let slot = grid.slot(track, position);
                let Some(clip) = slot.clip.as_ref().filter(|_| slot.active) else {
                    continue;
                };

                if self.loaded[track].is_some() && self.loaded[track] == slot.source {
                    triggers.push((track, Trigger::Restart));
                } else {
                    self.loaded[track] = slot.source.clone();
                    triggers.push((track, Trigger::Load(clip.clone())));
                }
            }
        }

        for (track, trigger) in triggers {
            match trigger {
                Trigger::Restart => {
                    debug!("Step {}: restarting clip on track {}", position, track);
                    self.sink.seek_to_start(track);
                }
                Trigger::Load(clip) => {
                    debug!("Step {}: loading {} on track {}", position, clip, track);
                    self.sink.load_clip(track, &clip);
                }
            }
            self.sink.play(track);
        }
    }

    /// Run on a dedicated thread until the subscription's bus goes away
    pub fn spawn(mut self, subscription: Subscription) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("track-player".to_string())
            .spawn(move || {
                for notification in subscription.receiver().iter() {
                    self.handle(&notification);
                }
                debug!("Track player stopped");
            })
    }
}
