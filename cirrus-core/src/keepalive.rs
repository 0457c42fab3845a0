//! Recurring keep-alive deadline for short-lived download URLs.

use std::time::Duration;
use tokio::time::Instant;

/// How long a resolved download URL is trusted before it is presumed stale.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(120);

/// A re-armable recurring deadline.
///
/// The timer never acts on the session itself. The host loop waits on
/// [`KeepAlive::wait`] with the current [`deadline`](KeepAlive::deadline)
/// and forwards expiry to the controller, which flags the URL stale and
/// re-arms for the next interval.
#[derive(Debug, Clone)]
pub struct KeepAlive {
    interval: Duration,
    deadline: Option<Instant>,
}

impl KeepAlive {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Next expiry, or `None` while disarmed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Start (or restart) the countdown from now.
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.interval);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    /// Schedule the next expiry one interval after the one that just fired.
    ///
    /// Anchored on the previous deadline rather than `now` so a slow loop
    /// iteration does not drift the schedule. Disarmed timers stay disarmed.
    pub fn rearm_after_expiry(&mut self) {
        if let Some(previous) = self.deadline {
            let next = previous + self.interval;
            let now = Instant::now();
            self.deadline = Some(if next > now {
                next
            } else {
                now + self.interval
            });
        }
    }

    /// Resolve at `deadline`, or never when it is `None`.
    ///
    /// Cancel-safe: dropping the future has no effect on any timer state.
    pub async fn wait(deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self::new(DEFAULT_RELOAD_INTERVAL)
    }
}
