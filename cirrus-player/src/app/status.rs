use std::time::Duration;

use cirrus_core::{SessionPhase, SessionSnapshot};

/// One-line playback summary, e.g. `▶ 01:15 / 42:00  🔉 45%`.
pub fn render(snapshot: &SessionSnapshot) -> String {
    let state = match (snapshot.phase, snapshot.paused) {
        (SessionPhase::Idle, _) => "■",
        (_, true) => "⏸",
        (_, false) => "▶",
    };
    let total = snapshot
        .duration
        .map_or_else(|| "--:--".to_string(), clock);
    let mut line = format!(
        "{} {} / {}  {} {}",
        state,
        clock(snapshot.position),
        total,
        snapshot.volume.tier().glyph(),
        snapshot.volume
    );
    if snapshot.scrubbing {
        line.push_str("  [seeking]");
    }
    if snapshot.phase.is_stale() {
        line.push_str("  [link expired, refreshes on seek]");
    }
    line
}

fn clock(time: Duration) -> String {
    let secs = time.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
