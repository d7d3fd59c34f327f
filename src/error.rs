use std::path::PathBuf;

use thiserror::Error;

use crate::audio_system::TrackKey;

/// Playback errors using thiserror for structured error handling.
///
/// None of these are fatal. The manager logs them and degrades to silence;
/// they are returned so the UI can show a failure message.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Unknown audio track: {0}")]
    UnknownTrack(TrackKey),

    #[error("Playback blocked: waiting for user interaction")]
    PlaybackBlocked,

    #[error("Failed to load audio file: {}", path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to decode audio file: {}", path.display())]
    DecodeFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to probe audio metadata: {}", path.display())]
    ProbeFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to initialize audio output stream")]
    StreamInitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Audio playback failed for {key}")]
    PlaybackFailed {
        key: TrackKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("No playable source left for {0}")]
    FallbackExhausted(TrackKey),

    #[error("No source loaded")]
    NotLoaded,

    #[error("Invalid crossfade: {0}")]
    InvalidFade(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {}", path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {}", path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the platform config directory")]
    NoConfigDir,
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
