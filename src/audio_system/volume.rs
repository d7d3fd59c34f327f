/// Volume level (0.0-1.0)
///
/// A clamped gain shared by per-track and global volume.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Volume {
    level: f32,
}

impl Volume {
    pub const SILENT: Volume = Volume { level: 0.0 };
    pub const FULL: Volume = Volume { level: 1.0 };

    /// Create a new volume, clamping out-of-range input. NaN becomes silence.
    pub fn new(level: f32) -> Self {
        if level.is_nan() {
            return Self::SILENT;
        }
        Self {
            level: level.clamp(0.0, 1.0),
        }
    }

    /// Get the volume level
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.level == 0.0
    }

    /// Track volume scaled by the global volume
    pub fn effective(track: Volume, global: Volume) -> f32 {
        track.level * global.level
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<f32> for Volume {
    fn from(level: f32) -> Self {
        Self::new(level)
    }
}
