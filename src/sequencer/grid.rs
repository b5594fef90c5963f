// Sequencer grid - tracks × steps of slot state

use crate::sequencer::slot::Slot;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

pub const MAX_TRACKS: usize = 4;
pub const MAX_STEPS: usize = 12;

pub const OPACITY_RANGE: RangeInclusive<f64> = 0.0..=1.0;
pub const PLAYBACK_RATE_RANGE: RangeInclusive<f64> = 0.25..=3.0;

/// Grid shared between the controller (writes) and the player (reads on tick)
pub type SharedGrid = Arc<Mutex<SequencerGrid>>;

/// One independent channel of slots
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    opacity: f64,
    playback_rate: f64,
    slots: Vec<Slot>,
}

impl Track {
    fn new(steps: usize) -> Self {
        Self {
            opacity: 1.0,
            playback_rate: 1.0,
            slots: vec![Slot::empty(); steps],
        }
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

/// Slot data for all tracks
///
/// Track and step indices come from the fixed topology; an index outside it
/// is a programming error and panics.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerGrid {
    tracks: Vec<Track>,
    steps_per_track: usize,
    // Track addressed by MIDI slot toggles, none until the first track-select
    selected_track: Option<usize>,
}

impl SequencerGrid {
    pub fn new(track_count: usize, steps_per_track: usize) -> Self {
        assert!(
            (1..=MAX_TRACKS).contains(&track_count),
            "Track count must be between 1 and {}",
            MAX_TRACKS
        );
        assert!(
            (1..=MAX_STEPS).contains(&steps_per_track),
            "Steps per track must be between 1 and {}",
            MAX_STEPS
        );

        Self {
            tracks: (0..track_count).map(|_| Track::new(steps_per_track)).collect(),
            steps_per_track,
            selected_track: None,
        }
    }

    pub fn shared(self) -> SharedGrid {
        Arc::new(Mutex::new(self))
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn steps_per_track(&self) -> usize {
        self.steps_per_track
    }

    pub fn track(&self, track: usize) -> &Track {
        self.check_track(track);
        &self.tracks[track]
    }

    fn check_track(&self, track: usize) {
        assert!(
            track < self.tracks.len(),
            "Track {} out of range (0..{})",
            track,
            self.tracks.len()
        );
    }

    fn check_position(&self, track: usize, position: usize) {
        self.check_track(track);
        assert!(
            position < self.steps_per_track,
            "Step {} out of range (0..{})",
            position,
            self.steps_per_track
        );
    }

    pub fn slot(&self, track: usize, position: usize) -> &Slot {
        self.check_position(track, position);
        &self.tracks[track].slots[position]
    }

    pub fn set_slot(&mut self, track: usize, position: usize, slot: Slot) {
        self.check_position(track, position);
        self.tracks[track].slots[position] = slot;
    }

    /// Flip the active flag, leaving the clip untouched
    /// Returns the new active state
    pub fn toggle_slot_active(&mut self, track: usize, position: usize) -> bool {
        self.check_position(track, position);
        let slot = &mut self.tracks[track].slots[position];
        slot.active = !slot.active;
        slot.active
    }

    /// Reset a slot to the empty state
    pub fn clear_slot(&mut self, track: usize, position: usize) {
        self.set_slot(track, position, Slot::empty());
    }

    pub fn activate_all(&mut self, track: usize) {
        self.check_track(track);
        for slot in &mut self.tracks[track].slots {
            slot.active = true;
        }
    }

    pub fn deactivate_all(&mut self, track: usize) {
        self.check_track(track);
        for slot in &mut self.tracks[track].slots {
            slot.active = false;
        }
    }

    pub fn clear_track(&mut self, track: usize) {
        self.check_track(track);
        for slot in &mut self.tracks[track].slots {
            *slot = Slot::empty();
        }
    }

    pub fn opacity(&self, track: usize) -> f64 {
        self.track(track).opacity
    }

    /// Set the track opacity
    /// Values outside [0.0, 1.0] are ignored and false is returned
    pub fn set_opacity(&mut self, track: usize, value: f64) -> bool {
        self.check_track(track);
        if !OPACITY_RANGE.contains(&value) {
            return false;
        }
        self.tracks[track].opacity = value;
        true
    }

    pub fn playback_rate(&self, track: usize) -> f64 {
        self.track(track).playback_rate
    }

    /// Set the track playback rate
    /// Values outside [0.25, 3.0] are ignored and false is returned
    pub fn set_playback_rate(&mut self, track: usize, value: f64) -> bool {
        self.check_track(track);
        if !PLAYBACK_RATE_RANGE.contains(&value) {
            return false;
        }
        self.tracks[track].playback_rate = value;
        true
    }

    pub fn reset_playback_rate(&mut self, track: usize) {
        self.set_playback_rate(track, 1.0);
    }

    pub fn selected_track(&self) -> Option<usize> {
        self.selected_track
    }

    /// Move the MIDI track selection to the next track, wrapping around
    pub fn select_next_track(&mut self) -> usize {
        let next = match self.selected_track {
            Some(track) if track + 1 < self.tracks.len() => track + 1,
            _ => 0,
        };
        self.selected_track = Some(next);
        next
    }
}

impl Default for SequencerGrid {
    fn default() -> Self {
        Self::new(MAX_TRACKS, 8)
    }
}
