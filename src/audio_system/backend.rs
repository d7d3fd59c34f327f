/// Playback backend traits
///
/// The manager never talks to an output device directly. It asks a backend for
/// one element per registered track and drives that element through this
/// interface, so the same logic runs on `rodio` or on the headless clock.
use std::path::Path;
use std::time::Duration;

use crate::error::AudioError;

use super::catalog::Preload;
use super::source::TrackKey;

/// A single playable audio resource bound to one track
pub trait AudioElement {
    /// Point the element at a source file, honoring the preload hint
    fn load(&mut self, path: &Path, preload: Preload) -> Result<(), AudioError>;

    /// Start or resume playback from the current position
    fn play(&mut self) -> Result<(), AudioError>;

    /// Pause without moving the position
    fn pause(&mut self);

    /// Move the position back to zero
    fn rewind(&mut self) -> Result<(), AudioError>;

    /// Set output gain (0.0-1.0, already scaled by the global volume)
    fn set_volume(&mut self, volume: f32);

    fn volume(&self) -> f32;

    fn set_looping(&mut self, looping: bool);

    fn position(&self) -> Duration;

    /// Total length, if known yet
    fn duration(&self) -> Option<Duration>;

    fn is_paused(&self) -> bool;

    /// Reached the end of a non-looping source
    fn is_ended(&self) -> bool;

    /// Drop the loaded source and any output resources
    fn release(&mut self);

    /// Let clock-driven elements move forward. Real devices keep their own time.
    fn advance(&mut self, _elapsed: Duration) {}
}

/// Factory for audio elements
pub trait AudioBackend {
    fn name(&self) -> &'static str;

    fn create_element(&mut self, key: TrackKey) -> Result<Box<dyn AudioElement>, AudioError>;
}

impl AudioError {
    /// Errors caused by the source file itself, which warrant trying the fallback
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            AudioError::LoadFailed { .. }
                | AudioError::DecodeFailed { .. }
                | AudioError::ProbeFailed { .. }
                | AudioError::NotLoaded
        )
    }
}
