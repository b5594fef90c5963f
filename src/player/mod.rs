// Player - media sink boundary and per-track playback triggering

pub mod sink;
pub mod track_player;

pub use sink::{LoggingMediaSink, MediaCommand, MediaSink, RecordingMediaSink};
pub use track_player::{PLAYER_NOTIFICATIONS, TrackPlayer};
