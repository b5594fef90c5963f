// MIDI devices - port enumeration and the device watcher

use crate::messaging::{EventBus, Notification};
use log::{debug, info, warn};
use midir::{MidiInput as MidirInput, MidiInputPort};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

const SCANNER_CLIENT_NAME: &str = "Technocoid MIDI Scanner";
pub(crate) const INPUT_CLIENT_NAME: &str = "Technocoid MIDI Input";

#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("MIDI init error: {0}")]
    Init(String),

    #[error("MIDI connection error: {0}")]
    Connect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiDeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

impl MidiDeviceInfo {
    fn from_names(names: Vec<String>) -> Vec<Self> {
        names
            .into_iter()
            .enumerate()
            .map(|(index, name)| MidiDeviceInfo {
                id: format!("midi_in_{}", index),
                name,
                // First port is treated as the default
                is_default: index == 0,
            })
            .collect()
    }
}

pub struct MidiDeviceManager;

impl MidiDeviceManager {
    pub fn new() -> Self {
        Self
    }

    /// Fails when the platform MIDI backend cannot be opened at all
    pub fn probe(&self) -> Result<(), MidiError> {
        MidirInput::new(SCANNER_CLIENT_NAME)
            .map(|_| ())
            .map_err(|e| MidiError::Init(e.to_string()))
    }

    /// List all available MIDI input ports
    pub fn list_input_ports(&self) -> Vec<MidiDeviceInfo> {
        let Ok(midi_in) = MidirInput::new(SCANNER_CLIENT_NAME) else {
            return Vec::new();
        };

        let names = midi_in
            .ports()
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect();
        MidiDeviceInfo::from_names(names)
    }

    /// Find an input port by name, together with the client that owns it
    pub fn input_port_by_name(&self, device_name: &str) -> Option<(MidirInput, MidiInputPort)> {
        let midi_in = MidirInput::new(INPUT_CLIENT_NAME).ok()?;
        let port = midi_in.ports().into_iter().find(|port| {
            midi_in
                .port_name(port)
                .map(|name| name == device_name)
                .unwrap_or(false)
        })?;
        Some((midi_in, port))
    }
}

impl Default for MidiDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Last device list published on the bus
pub type SharedDeviceList = Arc<Mutex<Vec<MidiDeviceInfo>>>;

type PortLister = Box<dyn Fn() -> Vec<MidiDeviceInfo> + Send>;

/// Polls the port list and announces changes on the bus
pub struct DeviceWatcher {
    devices: SharedDeviceList,
    bus: EventBus,
    lister: PortLister,
}

impl DeviceWatcher {
    /// Watcher over the system MIDI ports
    pub fn system(bus: EventBus) -> Result<Self, MidiError> {
        let manager = MidiDeviceManager::new();
        manager.probe()?;
        Ok(Self::with_lister(bus, move || manager.list_input_ports()))
    }

    /// Watcher over an arbitrary port source
    pub fn with_lister(
        bus: EventBus,
        lister: impl Fn() -> Vec<MidiDeviceInfo> + Send + 'static,
    ) -> Self {
        Self {
            devices: Arc::new(Mutex::new(Vec::new())),
            bus,
            lister: Box::new(lister),
        }
    }

    /// Watcher over a fixed list of port names
    pub fn with_names(bus: EventBus, names: Vec<String>) -> Self {
        Self::with_lister(bus, move || MidiDeviceInfo::from_names(names.clone()))
    }

    pub fn devices(&self) -> SharedDeviceList {
        Arc::clone(&self.devices)
    }

    fn lock_devices(&self) -> MutexGuard<'_, Vec<MidiDeviceInfo>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-read the port list, publishing when the set of names changed
    /// Returns true if a change was published
    pub fn refresh(&self) -> bool {
        let current = (self.lister)();
        let mut devices = self.lock_devices();

        let unchanged = devices.len() == current.len()
            && devices.iter().zip(&current).all(|(a, b)| a.name == b.name);
        if unchanged {
            return false;
        }

        info!("MIDI devices changed: {} port(s) available", current.len());
        for device in &current {
            debug!("  [{}] {}", device.id, device.name);
        }

        *devices = current;
        drop(devices);
        self.bus.publish(Notification::AvailableMidiDevicesChanged);
        true
    }

    /// Poll on a background thread until the handle is stopped or dropped
    pub fn spawn(self, interval: Duration) -> Result<WatcherHandle, MidiError> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let thread = thread::Builder::new()
            .name("midi-device-watcher".to_string())
            .spawn(move || {
                while flag.load(Ordering::Acquire) {
                    self.refresh();
                    thread::sleep(interval);
                }
                debug!("MIDI device watcher stopped");
            })
            .map_err(|e| MidiError::Init(format!("cannot start device watcher: {}", e)))?;

        Ok(WatcherHandle {
            running,
            _thread: thread,
        })
    }
}

/// Keeps the watcher thread alive
pub struct WatcherHandle {
    running: Arc<AtomicBool>,
    _thread: thread::JoinHandle<()>,
}

impl WatcherHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Look up a device index in the last published list
/// None when the index is stale
pub fn device_at(devices: &SharedDeviceList, index: usize) -> Option<MidiDeviceInfo> {
    let devices = devices.lock().unwrap_or_else(PoisonError::into_inner);
    let device = devices.get(index).cloned();
    if device.is_none() {
        warn!(
            "MIDI device index {} out of range ({} known)",
            index,
            devices.len()
        );
    }
    device
}
