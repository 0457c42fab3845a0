//! Service contracts for the session's external collaborators.
//!
//! - [`LocationResolver`]: turns a drive item into a short-lived download URL
//! - [`PlaybackEngine`]: the external media player being driven
//! - [`VolumeStore`]: the single persisted volume setting
//!
//! Engines report state changes as [`EngineEvent`]s over a channel owned by
//! the host loop; the controller never receives callbacks directly.

use async_trait::async_trait;
use cirrus_model::{DriveId, ItemId, VolumeLevel};
use std::time::Duration;
use url::Url;

use crate::error::{EngineError, ResolveError, SettingsError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationResolver: Send + Sync {
    /// Fetch a fresh, directly playable URL for the given drive item.
    async fn resolve_download_location(
        &self,
        drive_id: &DriveId,
        item_id: &ItemId,
    ) -> Result<Url, ResolveError>;
}

/// Commands understood by the playback engine.
///
/// Positions are absolute. Implementations report the outcome of commands
/// asynchronously through [`EngineEvent`]s; a returned `Ok` only means the
/// command was delivered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackEngine: Send {
    /// Replace whatever is loaded with `location` and start playing at
    /// `start`.
    async fn play(
        &mut self,
        location: &Url,
        start: Duration,
    ) -> Result<(), EngineError>;

    async fn set_paused(&mut self, paused: bool) -> Result<(), EngineError>;

    async fn seek(&mut self, position: Duration) -> Result<(), EngineError>;

    async fn set_volume(
        &mut self,
        level: VolumeLevel,
    ) -> Result<(), EngineError>;

    /// Stop playback and unload the current media. The engine stays usable.
    async fn stop(&mut self) -> Result<(), EngineError>;

    /// Tear the engine down. No further commands are sent afterwards.
    async fn release(&mut self);
}

#[cfg_attr(test, mockall::automock)]
pub trait VolumeStore: Send + Sync {
    /// The persisted level, or `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<VolumeLevel>, SettingsError>;

    fn save(&self, level: VolumeLevel) -> Result<(), SettingsError>;
}

/// Notifications raised by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Playback started or resumed
    Playing,
    Paused,
    PositionChanged(Duration),
    DurationChanged(Duration),
    /// The media played to its end
    EndReached,
    /// The engine went away (process exit, socket closed)
    Exited,
}
