use log::{error, info, warn};
use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use technocoid::app::{AppContext, AppError, ConsoleInput, Controller, HELP, parse_line};
use technocoid::config::AppConfig;
use technocoid::messaging::{ControlCommand, NotificationKind, StatusLevel, create_command_channel};
use technocoid::midi::{DeviceWatcher, MidiInputManager, WatcherHandle};
use technocoid::player::{LoggingMediaSink, PLAYER_NOTIFICATIONS, TrackPlayer};
use technocoid::settings::{BindingStore, JsonFileStore};
use technocoid::Notification;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    info!("=== Technocoid ===");

    let config = AppConfig::from_env(std::env::args().nth(1))?;
    let store: Arc<dyn BindingStore> = match &config.bindings_path {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(JsonFileStore::default_location()?),
    };

    let ctx = AppContext::new(config, store)?;

    // Device watcher failing to start is fatal
    let watcher = DeviceWatcher::system(ctx.bus.clone())?;
    let devices = watcher.devices();
    let input = Arc::new(MidiInputManager::new(Arc::clone(&ctx.dispatcher), devices.clone()));
    let _watcher: WatcherHandle =
        watcher.spawn(Duration::from_millis(ctx.config.device_poll_interval_ms))?;

    let player = TrackPlayer::new(Arc::clone(&ctx.grid), Box::new(LoggingMediaSink));
    player.spawn(ctx.bus.subscribe(PLAYER_NOTIFICATIONS))?;

    spawn_status_printer(&ctx)?;

    let (commands, command_rx) = create_command_channel();
    let controller = Controller::new(&ctx).with_input(input);
    let controller_thread = thread::Builder::new()
        .name("controller".to_string())
        .spawn(move || controller.run(command_rx))?;

    println!("{}", HELP);
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match parse_line(&line) {
            Ok(Some(ConsoleInput::Command(command))) => {
                let quit = command == ControlCommand::Quit;
                if commands.send(command).is_err() || quit {
                    break;
                }
            }
            Ok(Some(ConsoleInput::ListDevices)) => {
                let devices = devices.lock().map(|d| d.clone()).unwrap_or_default();
                if devices.is_empty() {
                    println!("No MIDI input detected");
                }
                for (index, device) in devices.iter().enumerate() {
                    println!("  [{}] {}", index, device.name);
                }
            }
            Ok(Some(ConsoleInput::Help)) => println!("{}", HELP),
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }
    }

    // Stdin closed counts as quit
    let _ = commands.send(ControlCommand::Quit);
    if controller_thread.join().is_err() {
        warn!("Controller thread panicked");
    }
    Ok(())
}

/// Echo status lines and device changes to stdout
fn spawn_status_printer(ctx: &AppContext) -> Result<(), AppError> {
    let subscription = ctx.bus.subscribe(&[
        NotificationKind::Status,
        NotificationKind::AvailableMidiDevicesChanged,
        NotificationKind::FullscreenModeChanged,
    ]);

    thread::Builder::new()
        .name("status".to_string())
        .spawn(move || {
            for notification in subscription.receiver().iter() {
                match notification {
                    Notification::Status(status) => {
                        let prefix = match status.level {
                            StatusLevel::Info => "",
                            StatusLevel::Warning => "warning: ",
                            StatusLevel::Error => "error: ",
                        };
                        println!("{}{}", prefix, status.message);
                    }
                    Notification::AvailableMidiDevicesChanged => {
                        println!("MIDI devices changed, type 'devices' to list them");
                    }
                    Notification::FullscreenModeChanged(enabled) => {
                        println!("Fullscreen {}", if enabled { "on" } else { "off" });
                    }
                    _ => {}
                }
            }
        })?;
    Ok(())
}
