/// Playback events
///
/// Things the audio manager has done (past tense), broadcast so the UI can
/// update play/pause icons and show failure messages.
use std::path::PathBuf;
use std::time::Duration;

use crate::audio_system::{FadeId, TrackKey};

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    TrackRegistered { key: TrackKey },

    TrackStarted { key: TrackKey },

    TrackPaused { key: TrackKey },

    /// Paused and rewound
    TrackStopped { key: TrackKey },

    TrackUnloaded { key: TrackKey },

    VolumeChanged { key: TrackKey, volume: f32 },

    GlobalVolumeChanged { volume: f32 },

    FadeStarted {
        id: FadeId,
        from: TrackKey,
        to: TrackKey,
        duration: Duration,
    },

    FadeCompleted {
        id: FadeId,
        from: TrackKey,
        to: TrackKey,
    },

    /// A newer fade took over one of this fade's tracks
    FadePreempted {
        id: FadeId,
        from: TrackKey,
        to: TrackKey,
    },

    /// Primary source failed; switched to the fallback
    SourceFallback { key: TrackKey, path: PathBuf },

    /// Both sources failed; the track stays silent until re-registered
    SourceExhausted { key: TrackKey },

    /// Playback refused because no user interaction has happened yet
    PlaybackBlocked { key: TrackKey },

    PlaybackFailed { key: TrackKey, message: String },

    CleanedUp,
}

impl PlaybackEvent {
    /// The track this event concerns, if any
    pub fn key(&self) -> Option<TrackKey> {
        match self {
            PlaybackEvent::TrackRegistered { key }
            | PlaybackEvent::TrackStarted { key }
            | PlaybackEvent::TrackPaused { key }
            | PlaybackEvent::TrackStopped { key }
            | PlaybackEvent::TrackUnloaded { key }
            | PlaybackEvent::VolumeChanged { key, .. }
            | PlaybackEvent::SourceFallback { key, .. }
            | PlaybackEvent::SourceExhausted { key }
            | PlaybackEvent::PlaybackBlocked { key }
            | PlaybackEvent::PlaybackFailed { key, .. } => Some(*key),
            PlaybackEvent::FadeStarted { to, .. }
            | PlaybackEvent::FadeCompleted { to, .. }
            | PlaybackEvent::FadePreempted { to, .. } => Some(*to),
            PlaybackEvent::GlobalVolumeChanged { .. } | PlaybackEvent::CleanedUp => None,
        }
    }

    /// True for events the UI should surface as a failure message
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PlaybackEvent::SourceExhausted { .. }
                | PlaybackEvent::PlaybackBlocked { .. }
                | PlaybackEvent::PlaybackFailed { .. }
        )
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            PlaybackEvent::TrackRegistered { key } => format!("Registered {}", key.display_name()),
            PlaybackEvent::TrackStarted { key } => format!("Playing {}", key.display_name()),
            PlaybackEvent::TrackPaused { key } => format!("Paused {}", key.display_name()),
            PlaybackEvent::TrackStopped { key } => format!("Stopped {}", key.display_name()),
            PlaybackEvent::TrackUnloaded { key } => format!("Unloaded {}", key.display_name()),
            PlaybackEvent::VolumeChanged { key, volume } => {
                format!("{} volume {:.0}%", key.display_name(), volume * 100.0)
            }
            PlaybackEvent::GlobalVolumeChanged { volume } => {
                format!("Master volume {:.0}%", volume * 100.0)
            }
            PlaybackEvent::FadeStarted { from, to, duration, .. } => format!(
                "Crossfading {} -> {} over {}ms",
                from.display_name(),
                to.display_name(),
                duration.as_millis()
            ),
            PlaybackEvent::FadeCompleted { from, to, .. } => {
                format!("Crossfade {} -> {} finished", from.display_name(), to.display_name())
            }
            PlaybackEvent::FadePreempted { from, to, .. } => {
                format!("Crossfade {} -> {} interrupted", from.display_name(), to.display_name())
            }
            PlaybackEvent::SourceFallback { key, path } => {
                format!("{}: using fallback {}", key.display_name(), path.display())
            }
            PlaybackEvent::SourceExhausted { key } => {
                format!("{} could not be loaded", key.display_name())
            }
            PlaybackEvent::PlaybackBlocked { key } => {
                format!("Tap anywhere to enable audio ({})", key.display_name())
            }
            PlaybackEvent::PlaybackFailed { key, message } => {
                format!("Could not play {}: {}", key.display_name(), message)
            }
            PlaybackEvent::CleanedUp => "Audio released".to_string(),
        }
    }
}
