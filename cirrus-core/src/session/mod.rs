//! The playback session and its keep-alive state machine.

mod controller;
mod phase;

use std::time::Duration;

use cirrus_model::VolumeLevel;

pub use controller::SessionController;
pub use phase::SessionPhase;

/// Point-in-time view of the session, for status display.
///
/// While scrubbing, `position` is where the seek bar is held rather than
/// where the engine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub paused: bool,
    pub scrubbing: bool,
    pub volume: VolumeLevel,
}
