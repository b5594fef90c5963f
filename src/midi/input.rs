// MIDI Input - connects the selected port to the dispatcher

use crate::messaging::Notification;
use crate::midi::device::{MidiDeviceManager, MidiError, SharedDeviceList, device_at};
use crate::midi::dispatcher::MidiDispatcher;
use crate::midi::message::MidiMessage;
use log::{debug, info, warn};
use midir::MidiInputConnection;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct ActiveInput {
    device_name: String,
    _connection: MidiInputConnection<()>,
}

pub struct MidiInputManager {
    dispatcher: Arc<MidiDispatcher>,
    devices: SharedDeviceList,
    active: Mutex<Option<ActiveInput>>,
}

impl MidiInputManager {
    pub fn new(dispatcher: Arc<MidiDispatcher>, devices: SharedDeviceList) -> Self {
        Self {
            dispatcher,
            devices,
            active: Mutex::new(None),
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveInput>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Connect the port at `index` of the last published device list
    ///
    /// An unknown index, a port that disappeared or a failed connection
    /// leaves the current connection untouched and returns false.
    pub fn select_device(&self, index: usize) -> bool {
        let Some(device) = device_at(&self.devices, index) else {
            return false;
        };

        match self.connect(&device.name) {
            Ok(connection) => {
                info!("MIDI connected: {}", device.name);
                *self.lock_active() = Some(ActiveInput {
                    device_name: device.name,
                    _connection: connection,
                });
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    fn connect(&self, device_name: &str) -> Result<MidiInputConnection<()>, MidiError> {
        let (midi_in, port) = MidiDeviceManager::new()
            .input_port_by_name(device_name)
            .ok_or_else(|| MidiError::Connect(format!("device '{}' not found", device_name)))?;

        let dispatcher = Arc::clone(&self.dispatcher);
        midi_in
            .connect(
                &port,
                "technocoid-input",
                move |_timestamp, bytes, _| {
                    // Runs on the midir callback thread
                    match MidiMessage::from_bytes(bytes) {
                        Some(message) => {
                            debug!("MIDI in: {:?}", message);
                            dispatcher.on_raw_message(message);
                        }
                        None => debug!("Unsupported MIDI message: {:02X?}", bytes),
                    }
                },
                (),
            )
            .map_err(|e| MidiError::Connect(e.to_string()))
    }

    /// Close the current connection, if any
    pub fn disconnect(&self) {
        if let Some(active) = self.lock_active().take() {
            info!("MIDI disconnected: {}", active.device_name);
        }
    }

    pub fn connected_device(&self) -> Option<String> {
        self.lock_active()
            .as_ref()
            .map(|active| active.device_name.clone())
    }

    /// Reacts to bus notifications addressed to the input
    pub fn handle(&self, notification: &Notification) {
        if let Notification::SelectedMidiDeviceChanged(index) = notification {
            self.select_device(*index);
        }
    }
}
