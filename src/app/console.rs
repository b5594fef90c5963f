// Console - line commands for the headless binary

use crate::messaging::ControlCommand;
use crate::midi::MidiEventType;
use crate::sequencer::TempoNudge;
use std::path::PathBuf;
use std::str::FromStr;

pub const HELP: &str = "\
Commands:
  play | stop | rewind          transport
  bpm <n> | tap                 tempo
  +10 | -10 | double | half     tempo nudges
  load <track> <slot> <path>    bind a clip to a slot
  toggle <track> <slot>         flip a slot's active flag
  clear <track> <slot>          empty a slot
  opacity <track> <0..1>        track opacity
  rate <track> <0.25..3>        track playback rate
  learn <ordinal> | cancel      MIDI learning (0..24)
  devices | device <index>      MIDI inputs
  save | reset-bindings         MIDI binding settings
  fullscreen on|off
  help | quit";

/// One parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(ControlCommand),
    ListDevices,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command '{0}', type 'help'")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

fn arg<T: FromStr>(
    args: &mut std::str::SplitWhitespace<'_>,
    usage: &'static str,
) -> Result<T, ParseError> {
    args.next()
        .and_then(|value| value.parse().ok())
        .ok_or(ParseError::Usage(usage))
}

/// Parse a console line, blank lines give None
pub fn parse_line(line: &str) -> Result<Option<ConsoleInput>, ParseError> {
    let mut args = line.split_whitespace();
    let Some(word) = args.next() else {
        return Ok(None);
    };

    let command = match word {
        "play" => ControlCommand::Start,
        "stop" => ControlCommand::Stop,
        "rewind" => ControlCommand::Rewind,
        "bpm" => ControlCommand::SetTempo(arg(&mut args, "bpm <n>")?),
        "tap" => ControlCommand::Tap,
        "+10" => ControlCommand::NudgeTempo(TempoNudge::PlusTen),
        "-10" => ControlCommand::NudgeTempo(TempoNudge::MinusTen),
        "double" => ControlCommand::NudgeTempo(TempoNudge::Double),
        "half" => ControlCommand::NudgeTempo(TempoNudge::Half),
        "load" => {
            const USAGE: &str = "load <track> <slot> <path>";
            let track = arg(&mut args, USAGE)?;
            let slot = arg(&mut args, USAGE)?;
            // Paths may contain spaces
            let path = args.collect::<Vec<_>>().join(" ");
            if path.is_empty() {
                return Err(ParseError::Usage(USAGE));
            }
            ControlCommand::LoadClip {
                track,
                slot,
                path: PathBuf::from(path),
            }
        }
        "toggle" => ControlCommand::ToggleSlot {
            track: arg(&mut args, "toggle <track> <slot>")?,
            slot: arg(&mut args, "toggle <track> <slot>")?,
        },
        "clear" => ControlCommand::ClearSlot {
            track: arg(&mut args, "clear <track> <slot>")?,
            slot: arg(&mut args, "clear <track> <slot>")?,
        },
        "opacity" => ControlCommand::SetOpacity {
            track: arg(&mut args, "opacity <track> <value>")?,
            value: arg(&mut args, "opacity <track> <value>")?,
        },
        "rate" => ControlCommand::SetPlaybackRate {
            track: arg(&mut args, "rate <track> <value>")?,
            value: arg(&mut args, "rate <track> <value>")?,
        },
        "learn" => {
            let ordinal: usize = arg(&mut args, "learn <ordinal>")?;
            let event_type =
                MidiEventType::from_ordinal(ordinal).ok_or(ParseError::Usage("learn <0..24>"))?;
            ControlCommand::Learn(event_type)
        }
        "cancel" => ControlCommand::Learn(MidiEventType::Empty),
        "devices" => return Ok(Some(ConsoleInput::ListDevices)),
        "device" => ControlCommand::SelectMidiDevice(arg(&mut args, "device <index>")?),
        "save" => ControlCommand::SaveBindings,
        "reset-bindings" => ControlCommand::ResetBindings,
        "fullscreen" => match args.next() {
            Some("on") => ControlCommand::SetFullscreen(true),
            Some("off") => ControlCommand::SetFullscreen(false),
            _ => return Err(ParseError::Usage("fullscreen on|off")),
        },
        "help" => return Ok(Some(ConsoleInput::Help)),
        "quit" | "exit" => ControlCommand::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };

    Ok(Some(ConsoleInput::Command(command)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(line: &str) -> ControlCommand {
        match parse_line(line) {
            Ok(Some(ConsoleInput::Command(command))) => command,
            other => panic!("'{}' parsed as {:?}", line, other),
        }
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse_line("   "), Ok(None));
    }

    #[test]
    fn test_transport_and_tempo() {
        assert_eq!(command("play"), ControlCommand::Start);
        assert_eq!(command("bpm 128"), ControlCommand::SetTempo(128));
        assert_eq!(command("half"), ControlCommand::NudgeTempo(TempoNudge::Half));
        assert_eq!(parse_line("bpm fast"), Err(ParseError::Usage("bpm <n>")));
    }

    #[test]
    fn test_load_keeps_spaces_in_path() {
        assert_eq!(
            command("load 1 3 my clips/intro.mp4"),
            ControlCommand::LoadClip {
                track: 1,
                slot: 3,
                path: PathBuf::from("my clips/intro.mp4"),
            }
        );
        assert!(parse_line("load 1 3").is_err());
    }

    #[test]
    fn test_learn_by_ordinal() {
        assert_eq!(command("learn 8"), ControlCommand::Learn(MidiEventType::Bpm));
        assert_eq!(
            command("learn 13"),
            ControlCommand::Learn(MidiEventType::SlotToggle(0))
        );
        assert_eq!(command("cancel"), ControlCommand::Learn(MidiEventType::Empty));
        assert!(parse_line("learn 25").is_err());
    }

    #[test]
    fn test_misc() {
        assert_eq!(parse_line("devices"), Ok(Some(ConsoleInput::ListDevices)));
        assert_eq!(command("device 2"), ControlCommand::SelectMidiDevice(2));
        assert_eq!(command("fullscreen on"), ControlCommand::SetFullscreen(true));
        assert_eq!(
            parse_line("dance"),
            Err(ParseError::Unknown("dance".to_string()))
        );
    }
}
