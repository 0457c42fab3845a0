//! Core value types shared across Cirrus crates.
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod position;
pub mod volume;

// Intentionally curated re-exports for downstream consumers.
pub use error::ModelError;
pub use ids::{DriveId, ItemId, MediaReference};
pub use position::{clamp_to_duration, offset_position};
pub use volume::{VolumeLevel, VolumeTier};
