use std::sync::Arc;
use std::time::Duration;

use cirrus_model::{
    MediaReference, VolumeLevel, clamp_to_duration, offset_position,
};
use log::{debug, info, trace, warn};
use tokio::time::Instant;
use url::Url;

use super::{SessionPhase, SessionSnapshot};
use crate::error::{ResolveError, SessionError};
use crate::keepalive::KeepAlive;
use crate::services::{
    EngineEvent, LocationResolver, PlaybackEngine, VolumeStore,
};

/// Owns the one active playback session and keeps its download URL alive.
///
/// All methods are meant to be called from a single host loop: engine
/// events, user commands and keep-alive expiry are funnelled through
/// `&mut self`, so no locking happens here.
pub struct SessionController {
    resolver: Arc<dyn LocationResolver>,
    engine: Box<dyn PlaybackEngine>,
    volume_store: Arc<dyn VolumeStore>,
    keepalive: KeepAlive,

    phase: SessionPhase,
    media: Option<MediaReference>,
    location: Option<Url>,
    position: Duration,
    duration: Option<Duration>,
    paused: bool,
    scrub_position: Option<Duration>,
    volume: VolumeLevel,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase)
            .field("media", &self.media)
            .field("position", &self.position)
            .field("duration", &self.duration)
            .field("paused", &self.paused)
            .field("volume", &self.volume)
            .field("keepalive", &self.keepalive)
            .finish()
    }
}

impl SessionController {
    pub fn new(
        resolver: Arc<dyn LocationResolver>,
        engine: Box<dyn PlaybackEngine>,
        volume_store: Arc<dyn VolumeStore>,
        reload_interval: Duration,
    ) -> Self {
        Self {
            resolver,
            engine,
            volume_store,
            keepalive: KeepAlive::new(reload_interval),
            phase: SessionPhase::Idle,
            media: None,
            location: None,
            position: Duration::ZERO,
            duration: None,
            paused: false,
            scrub_position: None,
            volume: VolumeLevel::default(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_stale(&self) -> bool {
        self.phase.is_stale()
    }

    pub fn position(&self) -> Duration {
        self.position
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn volume(&self) -> VolumeLevel {
        self.volume
    }

    pub fn media(&self) -> Option<&MediaReference> {
        self.media.as_ref()
    }

    pub fn location(&self) -> Option<&Url> {
        self.location.as_ref()
    }

    /// When the current download URL will be presumed stale.
    pub fn keepalive_deadline(&self) -> Option<Instant> {
        self.keepalive.deadline()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            position: self.scrub_position.unwrap_or(self.position),
            duration: self.duration,
            paused: self.paused,
            scrubbing: self.scrub_position.is_some(),
            volume: self.volume,
        }
    }

    /// Resolve `media`, start the engine at `start_at` and arm the
    /// keep-alive timer.
    ///
    /// Replaces any running session. If resolution or the engine fails, the
    /// previous session (if any) is left exactly as it was.
    pub async fn start(
        &mut self,
        media: MediaReference,
        start_at: Duration,
    ) -> Result<(), SessionError> {
        info!(
            "[Session] Starting {} at {:.1}s",
            media,
            start_at.as_secs_f64()
        );
        let location = self.resolve(&media).await?;
        self.engine.play(&location, start_at).await?;

        self.volume = self.load_volume();
        self.media = Some(media);
        self.location = Some(location);
        self.position = start_at;
        self.duration = None;
        self.paused = false;
        self.scrub_position = None;
        self.phase.begin();
        self.keepalive.arm();
        Ok(())
    }

    /// Keep-alive expiry: presume the download URL stale.
    ///
    /// Playback is left alone; the URL is only replaced on the next seek.
    pub fn on_timer_expired(&mut self) {
        if !self.phase.is_active() {
            trace!("[Session] Keep-alive fired while idle, ignoring");
            return;
        }
        if self.phase.expire()
            && let Some(media) = &self.media
        {
            info!("[Session] Download URL for {} presumed expired", media);
        }
        self.keepalive.rearm_after_expiry();
    }

    /// Seek to an absolute position, refreshing a stale URL first.
    ///
    /// When the URL is stale, playback is restarted at the last known
    /// position with a new URL before the seek is sent. If that refresh
    /// fails the seek is not applied and the session stays stale.
    pub async fn seek_to(
        &mut self,
        position: Duration,
    ) -> Result<(), SessionError> {
        if !self.phase.is_active() {
            debug!("[Session] Seek requested without an active session");
            return Err(SessionError::NotStarted);
        }

        if self.phase.is_stale() {
            info!("[Session] Download URL expired, reloading before seek");
            self.reload().await?;
        }

        let target = clamp_to_duration(position, self.duration);
        debug!("[Session] Seeking to {:.2}s", target.as_secs_f64());
        self.engine.seek(target).await?;
        self.position = target;
        Ok(())
    }

    /// Seek by `delta_ms` relative to the current position.
    pub async fn seek_relative(
        &mut self,
        delta_ms: i64,
    ) -> Result<(), SessionError> {
        if !self.phase.is_active() {
            return Err(SessionError::NotStarted);
        }
        let target = offset_position(self.position, delta_ms, self.duration);
        self.seek_to(target).await
    }

    /// Fetch a fresh URL and restart playback where it currently is.
    ///
    /// Clears the stale flag and restarts the keep-alive countdown only
    /// after both the resolver and the engine succeeded.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        let Some(media) = self.media.clone() else {
            return Err(SessionError::NotStarted);
        };

        let location = self.resolve(&media).await?;
        let resume_at = self.position;
        self.engine.play(&location, resume_at).await?;

        self.location = Some(location);
        self.phase.refresh();
        self.keepalive.arm();
        info!(
            "[Session] Reloaded {} at {:.1}s",
            media,
            resume_at.as_secs_f64()
        );
        Ok(())
    }

    /// Forward `level` to the engine and persist it.
    ///
    /// Persisting is best effort: a failed write is logged and the engine
    /// keeps the new level.
    pub async fn set_volume(
        &mut self,
        level: VolumeLevel,
    ) -> Result<(), SessionError> {
        if !self.phase.is_active() {
            debug!("[Session] Volume change ignored, no active session");
            return Err(SessionError::NotStarted);
        }

        self.engine.set_volume(level).await?;
        self.volume = level;
        if let Err(err) = self.volume_store.save(level) {
            warn!("[Session] Failed to persist volume {}: {}", level, err);
        }
        Ok(())
    }

    /// Validate a raw percentage and apply it via
    /// [`set_volume`](Self::set_volume).
    pub async fn set_volume_percent(
        &mut self,
        percent: i64,
    ) -> Result<(), SessionError> {
        let level = VolumeLevel::try_from(percent)
            .map_err(|_| SessionError::InvalidVolume(percent))?;
        self.set_volume(level).await
    }

    pub async fn toggle_pause(&mut self) -> Result<(), SessionError> {
        if !self.phase.is_active() {
            return Err(SessionError::NotStarted);
        }
        let paused = !self.paused;
        self.engine.set_paused(paused).await?;
        self.paused = paused;
        Ok(())
    }

    /// The user grabbed the seek bar. Engine position updates are held back
    /// until the scrub ends.
    pub fn begin_scrub(&mut self) -> bool {
        if !self.phase.is_active() {
            return false;
        }
        self.scrub_position = Some(self.position);
        true
    }

    pub fn scrub_to(&mut self, position: Duration) {
        let duration = self.duration;
        if let Some(slot) = self.scrub_position.as_mut() {
            *slot = clamp_to_duration(position, duration);
        }
    }

    /// Abandon a scrub without seeking.
    pub fn end_scrub(&mut self) {
        self.scrub_position = None;
    }

    /// Release the seek bar and seek to where it was dropped.
    pub async fn commit_scrub(&mut self) -> Result<(), SessionError> {
        match self.scrub_position.take() {
            Some(target) => self.seek_to(target).await,
            None => Ok(()),
        }
    }

    /// Apply a notification from the engine.
    pub async fn handle_event(
        &mut self,
        event: EngineEvent,
    ) -> Result<(), SessionError> {
        if !self.phase.is_active() {
            trace!("[Session] Dropping {:?} received while idle", event);
            return Ok(());
        }

        match event {
            EngineEvent::Playing => {
                self.paused = false;
                debug!("[Session] Playing, applying volume {}", self.volume);
                self.engine.set_volume(self.volume).await?;
            }
            EngineEvent::Paused => {
                self.paused = true;
            }
            EngineEvent::PositionChanged(position) => {
                if self.scrub_position.is_none() {
                    self.position = position;
                }
            }
            EngineEvent::DurationChanged(duration) => {
                if !duration.is_zero() {
                    self.duration = Some(duration);
                }
            }
            EngineEvent::EndReached => {
                self.paused = true;
                if let Some(duration) = self.duration {
                    self.position = duration;
                }
            }
            EngineEvent::Exited => {
                warn!("[Session] Playback engine exited, ending session");
                self.end_session();
            }
        }
        Ok(())
    }

    /// Stop playback and end the session. A no-op while idle.
    pub async fn stop(&mut self) -> Result<(), SessionError> {
        if !self.phase.is_active() {
            debug!("[Session] Stop requested while idle");
            return Ok(());
        }
        let result = self.engine.stop().await;
        self.end_session();
        info!("[Session] Stopped");
        result.map_err(SessionError::from)
    }

    /// Stop any running session and release the engine.
    pub async fn shutdown(mut self) {
        if let Err(err) = self.stop().await {
            warn!("[Session] Stop during shutdown failed: {}", err);
        }
        self.keepalive.disarm();
        self.engine.release().await;
    }

    fn end_session(&mut self) {
        self.phase.end();
        self.keepalive.disarm();
        self.media = None;
        self.location = None;
        self.position = Duration::ZERO;
        self.duration = None;
        self.paused = false;
        self.scrub_position = None;
    }

    async fn resolve(
        &self,
        media: &MediaReference,
    ) -> Result<Url, ResolveError> {
        self.resolver
            .resolve_download_location(media.drive_id(), media.item_id())
            .await
            .inspect_err(|err| {
                warn!("[Session] Failed to resolve {}: {}", media, err)
            })
    }

    fn load_volume(&self) -> VolumeLevel {
        match self.volume_store.load() {
            Ok(level) => level.unwrap_or_default(),
            Err(err) => {
                warn!("[Session] Failed to read persisted volume: {}", err);
                VolumeLevel::default()
            }
        }
    }
}
