//! Calmee audio
//!
//! Session audio for the Calmee wellness app: a registry of the app's
//! soundscapes and guided meditations, one-at-a-time playback, volume
//! control and timed crossfades.
//!
//! The manager is platform-agnostic. Output comes from an
//! [`AudioBackend`](audio_system::AudioBackend): `rodio` on a real device, or
//! the headless backend driven by an explicit clock.

pub mod audio_system;
pub mod config;
pub mod error;
pub mod messaging;

pub use audio_system::{
    AudioManager, AudioTrackConfig, FadeOutcome, FadeTicket, GestureGate, TrackKey, TrackState,
};
pub use config::Config;
pub use error::{AppResult, AudioError, ConfigError};
pub use messaging::{AudioCommand, CommandResult, EventBus, PlaybackEvent};
