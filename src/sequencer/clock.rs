// Tempo clock - step position, BPM and play state
// Drives the whole sequencer through position-changed notifications

use crate::messaging::{EventBus, Notification};
use crate::sequencer::tempo::{Tempo, TempoNudge};
use crate::sequencer::timer::ThreadScheduler;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Clock error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    #[error("Invalid tempo: {0} BPM")]
    InvalidTempo(u32),

    #[error("Sequencer timer is not available")]
    TimerUnavailable,
}

/// Something that calls [`TempoClock::on_tick`] periodically
///
/// `arm` starts a fresh phase, `retime` changes the period of the armed run
/// while keeping its phase, `disarm` cancels it. Implementations must never
/// keep two armed runs at once.
pub trait TickScheduler: Send + Sync {
    fn arm(&self, generation: u64, period: Duration) -> Result<(), ClockError>;
    fn retime(&self, generation: u64, period: Duration) -> Result<(), ClockError>;
    fn disarm(&self) -> Result<(), ClockError>;
}

#[derive(Debug)]
struct ClockState {
    tempo: Tempo,
    position: usize,
    running: bool,
    // Incremented on every start, ticks of older runs are discarded
    generation: u64,
}

/// Sequencer master clock
///
/// All notifications are published while holding the state lock, so ticks,
/// start and stop reach every subscriber in one total order.
pub struct TempoClock {
    state: Mutex<ClockState>,
    steps_per_track: usize,
    bus: EventBus,
    scheduler: Box<dyn TickScheduler>,
}

impl TempoClock {
    /// Create a clock driven by the given scheduler
    pub fn new(
        bus: EventBus,
        steps_per_track: usize,
        tempo: Tempo,
        scheduler: Box<dyn TickScheduler>,
    ) -> Self {
        assert!(steps_per_track > 0, "A track needs at least one step");
        Self {
            state: Mutex::new(ClockState {
                tempo,
                position: 0,
                running: false,
                generation: 0,
            }),
            steps_per_track,
            bus,
            scheduler,
        }
    }

    /// Create a clock running on its own timer thread
    pub fn spawn(
        bus: EventBus,
        steps_per_track: usize,
        tempo: Tempo,
    ) -> Result<Arc<Self>, ClockError> {
        let (scheduler, timer_loop) = ThreadScheduler::channel();
        let clock = Arc::new(Self::new(bus, steps_per_track, tempo, Box::new(scheduler)));
        timer_loop.spawn(Arc::downgrade(&clock))?;
        Ok(clock)
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the tempo, re-timing the running clock without resetting the position
    pub fn set_tempo(&self, bpm: u32) -> Result<(), ClockError> {
        let tempo = Tempo::new(bpm)?;
        let mut state = self.lock();

        if state.running {
            self.scheduler.retime(state.generation, tempo.period())?;
        }
        state.tempo = tempo;

        info!("Tempo set to {}", tempo);
        Ok(())
    }

    /// Apply a relative tempo change
    /// Returns the new tempo, or None if the nudge was out of bounds
    pub fn nudge_tempo(&self, nudge: TempoNudge) -> Result<Option<Tempo>, ClockError> {
        let current = self.tempo();
        match current.nudged(nudge) {
            Some(tempo) => {
                self.set_tempo(tempo.bpm())?;
                Ok(Some(tempo))
            }
            None => {
                debug!("Tempo nudge {:?} ignored at {}", nudge, current);
                Ok(None)
            }
        }
    }

    /// Start from step 0
    /// Returns false if the clock was already running
    pub fn start(&self) -> Result<bool, ClockError> {
        let mut state = self.lock();
        if state.running {
            return Ok(false);
        }

        let generation = state.generation + 1;
        self.scheduler.arm(generation, state.tempo.period())?;

        state.generation = generation;
        state.running = true;
        state.position = 0;

        self.bus.publish(Notification::PositionChanged(0));
        self.bus.publish(Notification::PlayStateChanged(true));

        info!("Sequencer started at {}", state.tempo);
        Ok(true)
    }

    /// Stop, leaving the position where it is
    /// Returns false if the clock was already stopped
    pub fn stop(&self) -> Result<bool, ClockError> {
        let mut state = self.lock();
        if !state.running {
            return Ok(false);
        }

        state.running = false;
        if let Err(e) = self.scheduler.disarm() {
            // A dead timer cannot fire any more, the stop still holds
            warn!("Failed to disarm sequencer timer: {}", e);
        }

        self.bus.publish(Notification::PlayStateChanged(false));

        info!("Sequencer stopped at step {}", state.position);
        Ok(true)
    }

    /// Start if stopped, stop if running
    /// Returns the new running state
    pub fn toggle(&self) -> Result<bool, ClockError> {
        if self.is_running() {
            self.stop()?;
            Ok(false)
        } else {
            self.start()?;
            Ok(true)
        }
    }

    /// Restart from step 0
    pub fn rewind(&self) -> Result<(), ClockError> {
        self.stop()?;
        self.start()?;
        Ok(())
    }

    /// Advance one step
    ///
    /// Called by the scheduler with the generation it was armed with. Ticks
    /// from a stopped or replaced run are dropped and return None.
    pub fn on_tick(&self, generation: u64) -> Option<usize> {
        let mut state = self.lock();
        if !state.running || generation != state.generation {
            debug!(
                "Dropping stale tick (generation {}, current {})",
                generation, state.generation
            );
            return None;
        }

        state.position = (state.position + 1) % self.steps_per_track;
        self.bus.publish(Notification::PositionChanged(state.position));

        debug!("Step {}", state.position);
        Some(state.position)
    }

    pub fn position(&self) -> usize {
        self.lock().position
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn tempo(&self) -> Tempo {
        self.lock().tempo
    }

    /// Generation of the current (or last) run
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn steps_per_track(&self) -> usize {
        self.steps_per_track
    }
}
