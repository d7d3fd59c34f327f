/// Track configuration and the built-in catalog
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::source::{TrackCategory, TrackKey};

const AMBIENT_DIR: &str = "/assets/sounds/ambientes";
const MEDITATION_DIR: &str = "/assets/sounds/meditacoes";

/// How eagerly a track's source is loaded at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preload {
    /// Load and verify the whole file up front
    Auto,

    /// Probe duration only
    #[default]
    Metadata,

    /// Defer everything to the first playback
    None,
}

/// Static descriptor for one catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrackConfig {
    pub key: TrackKey,

    /// Primary source locator, e.g. `/assets/sounds/ambientes/ambiente_rain.mp3`
    pub src: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_src: Option<String>,

    #[serde(default)]
    pub looping: bool,

    #[serde(default)]
    pub preload: Preload,

    /// Per-track volume (0.0-1.0), before the global volume is applied
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    1.0
}

impl AudioTrackConfig {
    /// Create a config with no fallback, no loop, metadata preload and full volume
    pub fn new(key: TrackKey, src: impl Into<String>) -> Self {
        Self {
            key,
            src: src.into(),
            fallback_src: None,
            looping: false,
            preload: Preload::default(),
            volume: 1.0,
        }
    }

    pub fn with_fallback(mut self, src: impl Into<String>) -> Self {
        self.fallback_src = Some(src.into());
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_preload(mut self, preload: Preload) -> Self {
        self.preload = preload;
        self
    }

    /// Set volume (clamped)
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }
}

/// Maps web-style asset locators onto files under a root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResolver {
    root: PathBuf,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a locator. Leading slashes are relative to the root, not the filesystem.
    pub fn resolve(&self, locator: &str) -> PathBuf {
        self.root.join(locator.trim_start_matches('/'))
    }
}

/// The app's built-in track catalog
///
/// Ambient loops preload fully, meditations probe metadata only and the
/// sleep story is loaded on demand. Every entry has an OGG fallback.
pub fn default_catalog() -> Vec<AudioTrackConfig> {
    TrackKey::ALL.iter().map(|&key| catalog_entry(key)).collect()
}

/// Built-in config for a single key
pub fn catalog_entry(key: TrackKey) -> AudioTrackConfig {
    let (dir, looping, preload, volume) = match key.category() {
        TrackCategory::Ambient => {
            let volume = if key == TrackKey::AmbientePiano { 0.6 } else { 0.7 };
            (AMBIENT_DIR, true, Preload::Auto, volume)
        }
        TrackCategory::Meditation => (MEDITATION_DIR, false, Preload::Metadata, 0.8),
        TrackCategory::SleepStory => (MEDITATION_DIR, false, Preload::None, 0.8),
    };

    AudioTrackConfig::new(key, format!("{dir}/{key}.mp3"))
        .with_fallback(format!("{dir}/{key}.ogg"))
        .with_loop(looping)
        .with_preload(preload)
        .with_volume(volume)
}
