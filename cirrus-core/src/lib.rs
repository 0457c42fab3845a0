//! Core library for the Cirrus cloud-drive player.
//!
//! Cloud drives hand out download URLs that stop working after a few
//! minutes. This crate keeps a playback session usable past that window:
//! a recurring [`keepalive::KeepAlive`] marks the current URL stale, and the
//! [`session::SessionController`] re-resolves it lazily the next time the
//! user seeks, restarting the engine at the last known position first.
//!
//! The cloud API, the playback engine and the persisted volume setting are
//! reached through the traits in [`services`]; `cirrus-player` provides the
//! real adapters.
//!
//! ## Feature flags
//!
//! None. The crate only needs `tokio`'s timer.

pub mod error;
pub mod keepalive;
pub mod services;
pub mod session;

pub use error::{EngineError, ResolveError, SessionError, SettingsError};
pub use keepalive::{DEFAULT_RELOAD_INTERVAL, KeepAlive};
pub use services::{
    EngineEvent, LocationResolver, PlaybackEngine, VolumeStore,
};
pub use session::{SessionController, SessionPhase, SessionSnapshot};

pub use cirrus_model as model;
