// Settings - persistence of learned MIDI bindings
//
// Bindings are stored as `ordinal -> id`, the channel is not kept.

pub mod store;

pub use store::{BindingStore, JsonFileStore, MemoryStore, SettingsError, SettingsMap};

use crate::midi::{MidiBindingTable, MidiEventTrigger, MidiEventType};
use log::{info, warn};
use serde_json::Value;

/// Restore a binding table, skipping entries that do not describe a binding
pub fn load_bindings(store: &dyn BindingStore) -> Result<MidiBindingTable, SettingsError> {
    let values = store.load()?;
    let mut table = MidiBindingTable::new();

    for (key, value) in &values {
        let Some(event_type) = key.parse().ok().and_then(MidiEventType::from_ordinal) else {
            warn!("Skipping unknown binding key '{}'", key);
            continue;
        };

        let Some(id) = value.as_u64().filter(|id| *id <= 127) else {
            warn!("Skipping invalid binding for {}: {}", event_type, value);
            continue;
        };

        table.bind(MidiEventTrigger::restored(event_type, id as u8));
    }

    info!("Loaded {} MIDI binding(s)", table.len());
    Ok(table)
}

/// Write every learned binding, unbound types are left out
pub fn store_bindings(
    store: &dyn BindingStore,
    table: &MidiBindingTable,
) -> Result<(), SettingsError> {
    let values: SettingsMap = table
        .triggers()
        .filter_map(|trigger| {
            let ordinal = trigger.event_type.ordinal()?;
            Some((ordinal.to_string(), Value::from(trigger.binding.id)))
        })
        .collect();

    store.save(&values)?;
    info!("Saved {} MIDI binding(s)", values.len());
    Ok(())
}

/// Clear the table and the persisted copy
pub fn reset_bindings(
    store: &dyn BindingStore,
    table: &mut MidiBindingTable,
) -> Result<(), SettingsError> {
    table.clear();
    store.save(&SettingsMap::new())
}
