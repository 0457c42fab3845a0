//! mpv JSON IPC framing.
//!
//! Every command and every reply/event is one JSON object on its own line.
//! See `mpv --input-ipc-server` in the mpv manual for the full protocol.

use std::time::Duration;

use cirrus_core::EngineEvent;
use serde::Deserialize;
use serde_json::{Value, json};

/// Properties observed right after connecting, with their observer ids.
pub const OBSERVED_PROPERTIES: [(u64, &str); 4] = [
    (1, "time-pos"),
    (2, "duration"),
    (3, "pause"),
    (4, "eof-reached"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum MpvCommand {
    /// Replace the current file. Start position is set separately through
    /// the `start` option, which applies to the next load.
    LoadFile { url: String },
    SetStart(Duration),
    SetPause(bool),
    Seek(Duration),
    SetVolume(u8),
    Stop,
    ObserveProperty { id: u64, name: &'static str },
    Quit,
}

impl MpvCommand {
    pub fn args(&self) -> Value {
        match self {
            MpvCommand::LoadFile { url } => json!(["loadfile", url, "replace"]),
            MpvCommand::SetStart(position) => json!([
                "set_property",
                "start",
                format_seconds(*position)
            ]),
            MpvCommand::SetPause(paused) => {
                json!(["set_property", "pause", paused])
            }
            MpvCommand::Seek(position) => {
                json!(["seek", position.as_secs_f64(), "absolute"])
            }
            MpvCommand::SetVolume(level) => {
                json!(["set_property", "volume", level])
            }
            MpvCommand::Stop => json!(["stop"]),
            MpvCommand::ObserveProperty { id, name } => {
                json!(["observe_property", id, name])
            }
            MpvCommand::Quit => json!(["quit"]),
        }
    }

    /// Serialize as a newline-terminated IPC line.
    pub fn encode(&self, request_id: u64) -> String {
        let mut line = json!({
            "command": self.args(),
            "request_id": request_id,
        })
        .to_string();
        line.push('\n');
        line
    }
}

/// `start` takes a string such as `"+12.5"`; a bare number would be read
/// as a percentage in some mpv versions.
fn format_seconds(position: Duration) -> String {
    format!("+{:.3}", position.as_secs_f64())
}

/// A decoded line from mpv.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Event(EngineEvent),
    /// `file-loaded`: the new file plays and accepts seeks
    Loaded,
    /// `end-file` with an error; the pending load never completes
    LoadFailed(Option<String>),
    /// Answer to a command; `error` is `None` on success
    Reply {
        request_id: Option<u64>,
        error: Option<String>,
    },
    /// Valid but uninteresting (other events, null property values)
    Ignored,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    event: Option<String>,
    name: Option<String>,
    #[serde(default)]
    data: Value,
    reason: Option<String>,
    file_error: Option<String>,
    error: Option<String>,
    request_id: Option<u64>,
}

pub fn decode_line(line: &str) -> Result<Incoming, serde_json::Error> {
    let raw: RawMessage = serde_json::from_str(line)?;

    let Some(event) = raw.event.as_deref() else {
        return Ok(Incoming::Reply {
            request_id: raw.request_id,
            error: raw.error.filter(|e| e != "success"),
        });
    };

    let decoded = match (event, raw.reason.as_deref()) {
        ("property-change", _) => {
            property_event(raw.name.as_deref(), &raw.data)
        }
        ("file-loaded", _) => return Ok(Incoming::Loaded),
        ("end-file", Some("eof")) => Some(EngineEvent::EndReached),
        ("end-file", Some("error")) => {
            return Ok(Incoming::LoadFailed(raw.file_error));
        }
        ("shutdown", _) => Some(EngineEvent::Exited),
        _ => None,
    };
    Ok(decoded.map_or(Incoming::Ignored, Incoming::Event))
}

/// Holds back seeks while a `loadfile` is in flight.
///
/// mpv answers `seek` with an error until the file named by `loadfile` is
/// loaded, so a seek issued in between is kept here and released by
/// `file-loaded`. Only the latest held position survives.
#[derive(Debug, Default)]
pub struct LoadGate {
    loading: bool,
    held: Option<Duration>,
}

impl LoadGate {
    /// A `loadfile` is about to be sent. Drops any seek held for an
    /// earlier load.
    pub fn begin_load(&mut self) {
        self.loading = true;
        self.held = None;
    }

    /// The command to send now for a seek to `position`, or `None` when
    /// it has to wait for the load.
    pub fn seek(&mut self, position: Duration) -> Option<MpvCommand> {
        if self.loading {
            self.held = Some(position);
            None
        } else {
            Some(MpvCommand::Seek(position))
        }
    }

    /// The load finished; returns the held seek, if any.
    pub fn loaded(&mut self) -> Option<MpvCommand> {
        self.loading = false;
        self.held.take().map(MpvCommand::Seek)
    }

    /// The load failed or playback was stopped.
    pub fn abandon(&mut self) {
        self.loading = false;
        self.held = None;
    }
}

fn property_event(name: Option<&str>, data: &Value) -> Option<EngineEvent> {
    match name? {
        "time-pos" => seconds(data).map(EngineEvent::PositionChanged),
        "duration" => seconds(data).map(EngineEvent::DurationChanged),
        "pause" => data.as_bool().map(|paused| {
            if paused {
                EngineEvent::Paused
            } else {
                EngineEvent::Playing
            }
        }),
        "eof-reached" => {
            (data.as_bool() == Some(true)).then_some(EngineEvent::EndReached)
        }
        _ => None,
    }
}

fn seconds(data: &Value) -> Option<Duration> {
    data.as_f64()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}
