/// Headless playback backend
///
/// Simulates audio elements against an explicit clock. Used by hosts without
/// an output device and by the test suite, where `AudioManager::advance` moves
/// time forward deterministically.
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::AudioError;

use super::backend::{AudioBackend, AudioElement};
use super::catalog::Preload;
use super::source::TrackKey;

const DEFAULT_DURATION: Duration = Duration::from_secs(180);

#[derive(Debug, Default)]
struct AssetTable {
    durations: HashMap<PathBuf, Duration>,
    missing: HashSet<PathBuf>,
    undecodable: HashSet<PathBuf>,
    broken_playback: HashSet<PathBuf>,
    live_elements: usize,
}

/// Backend whose elements keep time only when advanced
///
/// Clones share the same asset table, so a test can keep one clone to adjust
/// assets or inspect resource usage after handing the other to a manager.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    assets: Arc<Mutex<AssetTable>>,
    default_duration: Duration,
}

impl HeadlessBackend {
    /// Every path loads, with a three minute duration
    pub fn new() -> Self {
        Self {
            assets: Arc::new(Mutex::new(AssetTable::default())),
            default_duration: DEFAULT_DURATION,
        }
    }

    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_duration = duration;
        self
    }

    /// Give a specific file its own duration
    pub fn with_duration(self, path: impl Into<PathBuf>, duration: Duration) -> Self {
        self.assets.lock().durations.insert(path.into(), duration);
        self
    }

    /// Loading this file fails as if it did not exist
    pub fn missing(self, path: impl Into<PathBuf>) -> Self {
        self.assets.lock().missing.insert(path.into());
        self
    }

    /// The file loads but fails to decode once playback starts
    pub fn undecodable(self, path: impl Into<PathBuf>) -> Self {
        self.assets.lock().undecodable.insert(path.into());
        self
    }

    /// Playback of this file fails for a reason unrelated to the file
    pub fn failing_playback(self, path: impl Into<PathBuf>) -> Self {
        self.assets.lock().broken_playback.insert(path.into());
        self
    }

    /// Elements created and not yet released
    pub fn live_elements(&self) -> usize {
        self.assets.lock().live_elements
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_element(&mut self, key: TrackKey) -> Result<Box<dyn AudioElement>, AudioError> {
        self.assets.lock().live_elements += 1;
        Ok(Box::new(HeadlessElement {
            key,
            assets: Arc::clone(&self.assets),
            default_duration: self.default_duration,
            source: None,
            duration: None,
            position: Duration::ZERO,
            volume: 1.0,
            looping: false,
            paused: true,
            ended: false,
            live: true,
        }))
    }
}

/// Simulated audio element
#[derive(Debug)]
pub struct HeadlessElement {
    key: TrackKey,
    assets: Arc<Mutex<AssetTable>>,
    default_duration: Duration,
    source: Option<PathBuf>,
    duration: Option<Duration>,
    position: Duration,
    volume: f32,
    looping: bool,
    paused: bool,
    ended: bool,
    live: bool,
}

impl HeadlessElement {
    fn lookup_duration(&self, path: &Path) -> Duration {
        self.assets
            .lock()
            .durations
            .get(path)
            .copied()
            .unwrap_or(self.default_duration)
    }

    fn mark_released(&mut self) {
        if self.live {
            self.live = false;
            let mut assets = self.assets.lock();
            assets.live_elements = assets.live_elements.saturating_sub(1);
        }
    }
}

impl AudioElement for HeadlessElement {
    fn load(&mut self, path: &Path, preload: Preload) -> Result<(), AudioError> {
        if self.assets.lock().missing.contains(path) {
            return Err(AudioError::LoadFailed {
                path: path.to_path_buf(),
                source: Box::new(io::Error::new(io::ErrorKind::NotFound, "no such asset")),
            });
        }

        self.source = Some(path.to_path_buf());
        self.position = Duration::ZERO;
        self.ended = false;
        self.paused = true;
        self.duration = match preload {
            Preload::Auto | Preload::Metadata => Some(self.lookup_duration(path)),
            Preload::None => None,
        };
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        let path = self.source.clone().ok_or(AudioError::NotLoaded)?;

        {
            let assets = self.assets.lock();
            if assets.undecodable.contains(&path) {
                return Err(AudioError::DecodeFailed {
                    path,
                    source: "unsupported codec".into(),
                });
            }
            if assets.broken_playback.contains(&path) {
                return Err(AudioError::PlaybackFailed {
                    key: self.key,
                    source: "output device unavailable".into(),
                });
            }
        }

        if self.duration.is_none() {
            self.duration = Some(self.lookup_duration(&path));
        }
        if self.ended {
            self.position = Duration::ZERO;
            self.ended = false;
        }
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn rewind(&mut self) -> Result<(), AudioError> {
        self.position = Duration::ZERO;
        self.ended = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn position(&self) -> Duration {
        self.position
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_ended(&self) -> bool {
        self.ended
    }

    fn release(&mut self) {
        self.paused = true;
        self.source = None;
        self.duration = None;
        self.position = Duration::ZERO;
        self.mark_released();
    }

    fn advance(&mut self, elapsed: Duration) {
        if self.paused || self.ended {
            return;
        }

        self.position += elapsed;
        let Some(duration) = self.duration else {
            return;
        };

        if self.position >= duration {
            if self.looping && !duration.is_zero() {
                let wrapped = self.position.as_nanos() % duration.as_nanos();
                self.position = Duration::from_nanos(wrapped as u64);
            } else {
                self.position = duration;
                self.ended = true;
                self.paused = true;
            }
        }
    }
}

impl Drop for HeadlessElement {
    fn drop(&mut self) {
        self.mark_released();
    }
}
