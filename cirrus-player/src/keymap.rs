//! Terminal key bindings.
//!
//! Input is line based: a single key (or its name) per line, or a command
//! with an argument such as `seek 1m30s` or `volume 40`.

use std::time::Duration;

use thiserror::Error;

pub const SHORT_SEEK_MS: i64 = 5_000;
pub const LONG_SEEK_MS: i64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    SeekRelative(i64),
    SeekTo(Duration),
    VolumeUp,
    VolumeDown,
    SetVolume(i64),
    Reload,
    /// Grab the seek bar
    ScrubStart,
    ScrubTo(Duration),
    /// Let go of the seek bar and seek there
    ScrubCommit,
    ScrubCancel,
    Status,
    Help,
    Stop,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeymapError {
    #[error("empty input")]
    Empty,

    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("'{command}' needs {expected}, got '{value}'")]
    InvalidArgument {
        command: &'static str,
        expected: &'static str,
        value: String,
    },
}

pub const HELP: &str = "\
space / p        play or pause
left / right     seek -5s / +5s
j / l            seek -10s / +10s
+ / -            volume up / down
seek <time>      jump to a position (90, 1m30s)
volume <0-100>   set volume
grab, drag <t>   hold the seek bar and move it
drop / cancel    release the seek bar (seek) or abandon it
r                reload the stream
status           show playback state
s / q            stop and quit";

pub fn parse(line: &str) -> Result<Command, KeymapError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line == " " {
        return Ok(Command::TogglePause);
    }

    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, Some(arg.trim())),
        None => (line, None),
    };

    let command = match (word.to_ascii_lowercase().as_str(), arg) {
        ("", None) => return Err(KeymapError::Empty),
        ("space" | "p" | "pause", None) => Command::TogglePause,
        ("left" | "\u{1b}[d", None) => Command::SeekRelative(-SHORT_SEEK_MS),
        ("right" | "\u{1b}[c", None) => Command::SeekRelative(SHORT_SEEK_MS),
        ("j", None) => Command::SeekRelative(-LONG_SEEK_MS),
        ("l", None) => Command::SeekRelative(LONG_SEEK_MS),
        ("+" | "=", None) => Command::VolumeUp,
        ("-" | "_", None) => Command::VolumeDown,
        ("r" | "reload", None) => Command::Reload,
        ("s" | "q" | "stop" | "quit", None) => Command::Stop,
        ("status" | "?", None) => Command::Status,
        ("h" | "help", None) => Command::Help,
        ("grab", None) => Command::ScrubStart,
        ("drop", None) => Command::ScrubCommit,
        ("cancel", None) => Command::ScrubCancel,
        ("seek", Some(arg)) => Command::SeekTo(parse_position("seek", arg)?),
        ("drag", Some(arg)) => Command::ScrubTo(parse_position("drag", arg)?),
        ("volume" | "vol", Some(arg)) => {
            let level = arg.parse::<i64>().map_err(|_| {
                KeymapError::InvalidArgument {
                    command: "volume",
                    expected: "a number",
                    value: arg.to_string(),
                }
            })?;
            Command::SetVolume(level)
        }
        _ => return Err(KeymapError::Unknown(line.to_string())),
    };
    Ok(command)
}

/// Plain seconds (`90`, `12.5`) or a humantime duration (`1m30s`).
fn parse_position(
    command: &'static str,
    arg: &str,
) -> Result<Duration, KeymapError> {
    if let Ok(secs) = arg.parse::<f64>() {
        // rejects negative, NaN, infinite and out of range values
        if let Ok(position) = Duration::try_from_secs_f64(secs) {
            return Ok(position);
        }
    } else if let Ok(position) = humantime::parse_duration(arg) {
        return Ok(position);
    }
    Err(KeymapError::InvalidArgument {
        command,
        expected: "a position",
        value: arg.to_string(),
    })
}
