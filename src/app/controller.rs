// Controller - applies control commands and learned MIDI events
// Owns every write to the grid and the clock

use crate::app::AppContext;
use crate::messaging::{
    CommandReceiver, ControlCommand, EventBus, Notification, NotificationKind, StatusCategory,
    StatusMessage, Subscription,
};
use crate::midi::{MidiDispatcher, MidiEvent, MidiEventType, MidiInputManager};
use crate::sequencer::{
    ClipHandle, ClockError, SequencerGrid, SharedGrid, Slot, TapTempoEstimator, TempoClock,
};
use crate::settings::{self, BindingStore};
use crossbeam_channel::select;
use log::{debug, error, info, warn};
use std::sync::{Arc, MutexGuard, PoisonError};

/// Notifications the controller consumes
pub const CONTROLLER_NOTIFICATIONS: &[NotificationKind] = &[
    NotificationKind::MidiEventReceived,
    NotificationKind::LearnMidiEvent,
    NotificationKind::SelectedMidiDeviceChanged,
];

/// Whether the control loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Controller {
    bus: EventBus,
    clock: Arc<TempoClock>,
    grid: SharedGrid,
    dispatcher: Arc<MidiDispatcher>,
    store: Arc<dyn BindingStore>,
    input: Option<Arc<MidiInputManager>>,
    tap: TapTempoEstimator,
    subscription: Subscription,
}

impl Controller {
    /// Subscribes immediately, nothing published after this call is missed
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            bus: ctx.bus.clone(),
            clock: Arc::clone(&ctx.clock),
            grid: Arc::clone(&ctx.grid),
            dispatcher: Arc::clone(&ctx.dispatcher),
            store: Arc::clone(&ctx.store),
            input: None,
            tap: TapTempoEstimator::new(),
            subscription: ctx.bus.subscribe(CONTROLLER_NOTIFICATIONS),
        }
    }

    /// Route device selections to a MIDI input
    pub fn with_input(mut self, input: Arc<MidiInputManager>) -> Self {
        self.input = Some(input);
        self
    }

    fn grid(&self) -> MutexGuard<'_, SequencerGrid> {
        self.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn status(&self, status: StatusMessage) {
        self.bus.publish(Notification::Status(status));
    }

    fn warn_user(&self, category: StatusCategory, message: String) {
        warn!("{}", message);
        self.status(StatusMessage::warning(category, message));
    }

    fn valid_track(&self, track: usize) -> bool {
        let count = self.grid().track_count();
        if track >= count {
            self.warn_user(
                StatusCategory::Grid,
                format!("Track {} does not exist ({} tracks)", track, count),
            );
            return false;
        }
        true
    }

    fn valid_slot(&self, track: usize, slot: usize) -> bool {
        if !self.valid_track(track) {
            return false;
        }
        let steps = self.grid().steps_per_track();
        if slot >= steps {
            self.warn_user(
                StatusCategory::Grid,
                format!("Slot {} does not exist ({} steps)", slot, steps),
            );
            return false;
        }
        true
    }

    fn report_clock(&self, result: Result<(), ClockError>) {
        match result {
            Ok(()) => {}
            Err(e @ ClockError::InvalidTempo(_)) => {
                self.warn_user(StatusCategory::Clock, e.to_string());
            }
            Err(e) => {
                error!("Clock failure: {}", e);
                self.status(StatusMessage::error(StatusCategory::Clock, e.to_string()));
            }
        }
    }

    fn set_tempo(&self, bpm: u32) {
        let result = self.clock.set_tempo(bpm);
        if result.is_ok() {
            self.status(StatusMessage::info(
                StatusCategory::Clock,
                format!("New BPM set: {}", bpm),
            ));
        }
        self.report_clock(result);
    }

    fn set_opacity(&self, track: usize, value: f64) {
        if !self.valid_track(track) {
            return;
        }
        if self.grid().set_opacity(track, value) {
            self.bus.publish(Notification::TrackOpacityChanged(track));
        } else {
            debug!("Opacity {} ignored for track {}", value, track);
        }
    }

    fn set_playback_rate(&self, track: usize, value: f64) {
        if !self.valid_track(track) {
            return;
        }
        if self.grid().set_playback_rate(track, value) {
            self.bus.publish(Notification::TrackPlaybackRateChanged(track));
        } else {
            debug!("Playback rate {} ignored for track {}", value, track);
        }
    }

    fn tap(&mut self) {
        if let Some(bpm) = self.tap.record_tap() {
            self.set_tempo(bpm);
        }
    }

    pub fn handle_command(&mut self, command: ControlCommand) -> Flow {
        debug!("Command: {:?}", command);
        match command {
            ControlCommand::Start => self.report_clock(self.clock.start().map(|_| ())),
            ControlCommand::Stop => self.report_clock(self.clock.stop().map(|_| ())),
            ControlCommand::TogglePlay => self.report_clock(self.clock.toggle().map(|_| ())),
            ControlCommand::Rewind => self.report_clock(self.clock.rewind()),
            ControlCommand::SetTempo(bpm) => self.set_tempo(bpm),
            ControlCommand::NudgeTempo(nudge) => match self.clock.nudge_tempo(nudge) {
                Ok(Some(tempo)) => self.status(StatusMessage::info(
                    StatusCategory::Clock,
                    format!("New BPM set: {}", tempo.bpm()),
                )),
                Ok(None) => {}
                Err(e) => self.report_clock(Err(e)),
            },
            ControlCommand::Tap => self.tap(),
            ControlCommand::SetOpacity { track, value } => self.set_opacity(track, value),
            ControlCommand::SetPlaybackRate { track, value } => {
                self.set_playback_rate(track, value)
            }
            ControlCommand::ResetPlaybackRate(track) => self.set_playback_rate(track, 1.0),
            ControlCommand::LoadClip { track, slot, path } => {
                if self.valid_slot(track, slot) {
                    let mut grid = self.grid();
                    let active = grid.slot(track, slot).active;
                    let mut loaded = Slot::with_clip(ClipHandle::new(&path));
                    loaded.active = active;
                    info!("Track {} slot {}: {}", track, slot, path.display());
                    grid.set_slot(track, slot, loaded);
                }
            }
            ControlCommand::ToggleSlot { track, slot } => {
                if self.valid_slot(track, slot) {
                    self.grid().toggle_slot_active(track, slot);
                }
            }
            ControlCommand::ClearSlot { track, slot } => {
                if self.valid_slot(track, slot) {
                    self.grid().clear_slot(track, slot);
                }
            }
            ControlCommand::ActivateAll(track) => {
                if self.valid_track(track) {
                    self.grid().activate_all(track);
                }
            }
            ControlCommand::DeactivateAll(track) => {
                if self.valid_track(track) {
                    self.grid().deactivate_all(track);
                }
            }
            ControlCommand::ClearTrack(track) => {
                if self.valid_track(track) {
                    self.grid().clear_track(track);
                }
            }
            ControlCommand::SelectNextTrack => self.select_next_track(),
            ControlCommand::Learn(event_type) => {
                self.bus.publish(Notification::LearnMidiEvent(event_type));
            }
            ControlCommand::SelectMidiDevice(index) => {
                self.bus
                    .publish(Notification::SelectedMidiDeviceChanged(index));
            }
            ControlCommand::SetFullscreen(enabled) => {
                self.bus.publish(Notification::FullscreenModeChanged(enabled));
            }
            ControlCommand::SaveBindings => self.save_bindings(),
            ControlCommand::ResetBindings => self.reset_bindings(),
            ControlCommand::Quit => {
                self.report_clock(self.clock.stop().map(|_| ()));
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    fn select_next_track(&self) {
        let track = self.grid().select_next_track();
        self.status(StatusMessage::info(
            StatusCategory::Midi,
            format!("Track {} selected", track + 1),
        ));
    }

    fn save_bindings(&self) {
        match settings::store_bindings(self.store.as_ref(), &self.dispatcher.table()) {
            Ok(()) => self.status(StatusMessage::info(
                StatusCategory::Settings,
                "MIDI bindings saved",
            )),
            Err(e) => self.warn_user(
                StatusCategory::Settings,
                format!("Could not save MIDI bindings: {}", e),
            ),
        }
    }

    fn reset_bindings(&self) {
        let mut table = self.dispatcher.table();
        let result = settings::reset_bindings(self.store.as_ref(), &mut table);
        self.dispatcher.replace_table(table);

        match result {
            Ok(()) => self.status(StatusMessage::info(
                StatusCategory::Settings,
                "MIDI bindings reset",
            )),
            Err(e) => self.warn_user(
                StatusCategory::Settings,
                format!("Could not reset stored MIDI bindings: {}", e),
            ),
        }
    }

    /// Apply a learned MIDI control to the sequencer
    pub fn handle_midi_event(&mut self, event: MidiEvent) {
        let value = event.value;
        match event.event_type {
            MidiEventType::TrackOpacity(track) => {
                self.set_opacity(track as usize, f64::from(value) / 127.0);
            }
            MidiEventType::TrackPlaybackRate(track) => {
                let rate = 0.25 + f64::from(value) / 127.0 * 2.75;
                self.set_playback_rate(track as usize, rate);
            }
            MidiEventType::Bpm => self.set_tempo(u32::from(value) * 2),
            MidiEventType::PlayToggle => self.report_clock(self.clock.toggle().map(|_| ())),
            MidiEventType::Rewind => self.report_clock(self.clock.rewind()),
            MidiEventType::TapTempo => self.tap(),
            MidiEventType::TrackSelect => self.select_next_track(),
            MidiEventType::SlotToggle(slot) => {
                let mut grid = self.grid();
                match grid.selected_track() {
                    Some(track) if (slot as usize) < grid.steps_per_track() => {
                        grid.toggle_slot_active(track, slot as usize);
                    }
                    Some(_) => debug!("Slot {} outside the grid", slot),
                    None => debug!("Slot toggle ignored, no track selected"),
                }
            }
            MidiEventType::Empty => {}
        }
    }

    pub fn handle_notification(&mut self, notification: &Notification) {
        match notification {
            Notification::MidiEventReceived(event) => self.handle_midi_event(*event),
            Notification::LearnMidiEvent(_) => self.dispatcher.handle(notification),
            Notification::SelectedMidiDeviceChanged(_) => {
                if let Some(input) = &self.input {
                    input.handle(notification);
                }
            }
            _ => {}
        }
    }

    /// Process notifications published so far, returns how many were handled
    pub fn pump(&mut self) -> usize {
        let pending = self.subscription.drain();
        for notification in &pending {
            self.handle_notification(notification);
        }
        pending.len()
    }

    /// Control loop, returns on `Quit` or when all command senders are gone
    pub fn run(mut self, commands: CommandReceiver) {
        info!("Controller running");
        let notifications = self.subscription.receiver().clone();
        loop {
            select! {
                recv(commands) -> command => match command {
                    Ok(command) => {
                        if self.handle_command(command) == Flow::Quit {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(notifications) -> notification => {
                    if let Ok(notification) = notification {
                        self.handle_notification(&notification);
                    }
                }
            }
        }
        info!("Controller stopped");
    }
}
