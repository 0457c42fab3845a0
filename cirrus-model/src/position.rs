//! Playback position arithmetic.
//!
//! Positions are plain [`Duration`]s; these helpers keep relative seeks
//! inside the media bounds.

use std::time::Duration;

/// Clamp `position` to `duration` when the duration is known.
///
/// An unknown duration (`None` or zero, which engines report before the
/// container header is parsed) leaves the position untouched.
pub fn clamp_to_duration(
    position: Duration,
    duration: Option<Duration>,
) -> Duration {
    match duration {
        Some(duration) if !duration.is_zero() => position.min(duration),
        _ => position,
    }
}

/// Move `position` by `delta_ms`, saturating at zero and clamping to
/// `duration`.
pub fn offset_position(
    position: Duration,
    delta_ms: i64,
    duration: Option<Duration>,
) -> Duration {
    let delta = Duration::from_millis(delta_ms.unsigned_abs());
    let target = if delta_ms.is_negative() {
        position.saturating_sub(delta)
    } else {
        position.saturating_add(delta)
    };
    clamp_to_duration(target, duration)
}
