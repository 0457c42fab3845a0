//! Cirrus terminal player.
//!
//! Plays OneDrive videos through an external mpv process. Download links
//! come from Microsoft Graph and expire after a few minutes, so the session
//! from `cirrus-core` refreshes them before the first seek past expiry.

pub mod app;
pub mod infra;
pub mod keymap;
