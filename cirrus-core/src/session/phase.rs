/// Lifecycle of the single playback session.
///
/// `Stale` is a live session whose download URL is presumed expired. The
/// only way out of `Stale` (other than ending the session) is
/// [`refresh`](SessionPhase::refresh), which the controller calls after a
/// successful re-resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Playing,
    Stale,
}

impl SessionPhase {
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub fn is_stale(self) -> bool {
        matches!(self, Self::Stale)
    }

    /// A new session was started with a freshly resolved URL.
    pub fn begin(&mut self) {
        *self = Self::Playing;
    }

    /// The keep-alive interval elapsed. Returns `true` if this changed the
    /// phase.
    pub fn expire(&mut self) -> bool {
        match self {
            Self::Playing => {
                *self = Self::Stale;
                true
            }
            Self::Idle | Self::Stale => false,
        }
    }

    /// The URL was re-resolved and playback restarted. No-op when idle.
    pub fn refresh(&mut self) {
        if self.is_active() {
            *self = Self::Playing;
        }
    }

    pub fn end(&mut self) {
        *self = Self::Idle;
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Playing => write!(f, "playing"),
            Self::Stale => write!(f, "stale"),
        }
    }
}
