//! External mpv process driven over its JSON IPC socket.

pub mod protocol;

#[cfg(unix)]
mod engine;

#[cfg(unix)]
pub use engine::MpvEngine;
