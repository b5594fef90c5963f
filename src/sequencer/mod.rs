// Sequencer module
// Tempo clock, tap tempo and the track/slot grid

pub mod clock;
pub mod grid;
pub mod slot;
pub mod tap_tempo;
pub mod tempo;
pub mod timer;

pub use clock::{ClockError, TempoClock, TickScheduler};
pub use grid::{MAX_STEPS, MAX_TRACKS, SequencerGrid, SharedGrid, Track};
pub use slot::{ClipHandle, Slot, Thumbnail};
pub use tap_tempo::TapTempoEstimator;
pub use tempo::{Tempo, TempoNudge};
pub use timer::{ManualScheduler, ThreadScheduler, TimerLoop};
