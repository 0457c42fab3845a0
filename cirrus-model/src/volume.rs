use crate::error::ModelError;

/// Volume bounds as understood by the playback engine (percent).
pub mod volume_bounds {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;
    /// Level used when nothing has been persisted yet.
    pub const DEFAULT: u8 = 100;
    /// Adjustment applied by the `+`/`-` keys.
    pub const STEP: u8 = 5;
}

/// Playback volume in percent, always within 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i64", into = "u8"))]
pub struct VolumeLevel(u8);

impl VolumeLevel {
    pub const MUTE: VolumeLevel = VolumeLevel(volume_bounds::MIN);
    pub const FULL: VolumeLevel = VolumeLevel(volume_bounds::MAX);

    /// Creates a level, clamping anything above the maximum.
    pub fn new(level: u8) -> Self {
        VolumeLevel(level.min(volume_bounds::MAX))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn increase(self) -> Self {
        Self::new(self.0.saturating_add(volume_bounds::STEP))
    }

    pub fn decrease(self) -> Self {
        Self::new(self.0.saturating_sub(volume_bounds::STEP))
    }

    pub fn tier(&self) -> VolumeTier {
        VolumeTier::from_level(*self)
    }
}

impl Default for VolumeLevel {
    fn default() -> Self {
        VolumeLevel(volume_bounds::DEFAULT)
    }
}

impl TryFrom<i64> for VolumeLevel {
    type Error = ModelError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        u8::try_from(level)
            .ok()
            .filter(|level| *level <= volume_bounds::MAX)
            .map(VolumeLevel)
            .ok_or(ModelError::VolumeOutOfRange(level))
    }
}

impl From<VolumeLevel> for u8 {
    fn from(level: VolumeLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Coarse loudness bucket, used to pick the speaker glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeTier {
    Low,
    Medium,
    High,
    Max,
}

impl VolumeTier {
    pub fn from_level(level: VolumeLevel) -> Self {
        match level.value() {
            0..=25 => VolumeTier::Low,
            26..=50 => VolumeTier::Medium,
            51..=75 => VolumeTier::High,
            _ => VolumeTier::Max,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            VolumeTier::Low => "🔈",
            VolumeTier::Medium => "🔉",
            VolumeTier::High => "🔊",
            VolumeTier::Max => "📢",
        }
    }
}
