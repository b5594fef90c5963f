// Application context - the shared services, built once at startup

use crate::app::AppError;
use crate::config::AppConfig;
use crate::messaging::EventBus;
use crate::midi::{MidiBindingTable, MidiDispatcher};
use crate::sequencer::{SequencerGrid, SharedGrid, Tempo, TempoClock, TickScheduler};
use crate::settings::{self, BindingStore};
use log::{info, warn};
use std::sync::Arc;

/// Explicitly constructed services, cloned into every consumer
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub bus: EventBus,
    pub clock: Arc<TempoClock>,
    pub grid: SharedGrid,
    pub dispatcher: Arc<MidiDispatcher>,
    pub store: Arc<dyn BindingStore>,
}

impl AppContext {
    /// Context with the clock on its own timer thread
    pub fn new(config: AppConfig, store: Arc<dyn BindingStore>) -> Result<Self, AppError> {
        config.validate()?;
        let bus = EventBus::new();
        let clock = TempoClock::spawn(
            bus.clone(),
            config.steps_per_track,
            Tempo::new(config.initial_bpm)?,
        )?;
        Ok(Self::assemble(config, store, bus, clock))
    }

    /// Context with the clock driven by the given scheduler
    pub fn with_scheduler(
        config: AppConfig,
        store: Arc<dyn BindingStore>,
        scheduler: Box<dyn TickScheduler>,
    ) -> Result<Self, AppError> {
        config.validate()?;
        let bus = EventBus::new();
        let clock = Arc::new(TempoClock::new(
            bus.clone(),
            config.steps_per_track,
            Tempo::new(config.initial_bpm)?,
            scheduler,
        ));
        Ok(Self::assemble(config, store, bus, clock))
    }

    fn assemble(
        config: AppConfig,
        store: Arc<dyn BindingStore>,
        bus: EventBus,
        clock: Arc<TempoClock>,
    ) -> Self {
        // Unreadable settings are not fatal, the user can learn again
        let table = settings::load_bindings(store.as_ref()).unwrap_or_else(|e| {
            warn!("Could not load MIDI bindings: {}", e);
            MidiBindingTable::new()
        });

        let grid = SequencerGrid::new(config.tracks, config.steps_per_track).shared();
        let dispatcher = Arc::new(MidiDispatcher::with_table(bus.clone(), table));

        info!(
            "Sequencer ready: {} track(s) x {} step(s) at {}",
            config.tracks,
            config.steps_per_track,
            clock.tempo()
        );

        Self {
            config,
            bus,
            clock,
            grid,
            dispatcher,
            store,
        }
    }
}
