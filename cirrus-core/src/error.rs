//! Error types for the playback session and its collaborators.

use thiserror::Error;

/// Failure to turn a drive item into a playable download URL.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The drive or item does not exist (or is no longer shared with us)
    #[error("Drive item not found")]
    NotFound,

    /// The access token was rejected or has expired
    #[error("Not authorized to read drive item")]
    Unauthorized,

    /// The item exists but carries no download URL (folders, notebooks)
    #[error("Drive item has no download URL")]
    MissingDownloadUrl,

    #[error("Invalid download URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Transport(String),
}

/// Failure reported by the playback engine adapter.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to start playback engine")]
    Spawn(#[source] std::io::Error),

    #[error("Engine IPC error: {0}")]
    Ipc(String),

    /// The engine process exited or its control channel was closed
    #[error("Engine connection closed")]
    Closed,
}

/// Failure to read or write the persisted volume setting.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O failed")]
    Io(#[from] std::io::Error),

    #[error("Settings file is malformed: {0}")]
    Format(String),
}

/// Errors surfaced by [`SessionController`](crate::SessionController)
/// operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not resolve media location: {0}")]
    Resolution(#[from] ResolveError),

    /// An operation that needs a running session was called while idle
    #[error("No active playback session")]
    NotStarted,

    #[error("Volume {0} is outside 0-100")]
    InvalidVolume(i64),

    #[error("Playback engine error: {0}")]
    Engine(#[from] EngineError),
}

impl SessionError {
    /// Whether the caller can reasonably retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::Resolution(ResolveError::Transport(_))
                | SessionError::Engine(EngineError::Ipc(_))
        )
    }
}
