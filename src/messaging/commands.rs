/// Audio commands
///
/// Requests from the UI layer (imperative). Each maps onto one manager
/// operation, so a tap handler or the CLI can build a command and apply it.
use std::time::Duration;

use crate::audio_system::{AudioManager, TrackKey};

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    Play { key: TrackKey },

    Pause { key: TrackKey },

    Stop { key: TrackKey },

    StopAll,

    SetVolume { key: TrackKey, volume: f32 },

    SetGlobalVolume { volume: f32 },

    /// Crossfade; `None` uses the configured default duration
    Fade {
        from: TrackKey,
        to: TrackKey,
        duration: Option<Duration>,
    },

    Unload { key: TrackKey },

    Cleanup,
}

/// Result of command execution
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    Success,

    /// Command failed; the message is fit for display
    Error(String),
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandResult::Success)
    }
}

impl AudioCommand {
    /// Get a human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            AudioCommand::Play { key } => format!("Play {}", key),
            AudioCommand::Pause { key } => format!("Pause {}", key),
            AudioCommand::Stop { key } => format!("Stop {}", key),
            AudioCommand::StopAll => "Stop all audio".to_string(),
            AudioCommand::SetVolume { key, volume } => format!("Set {} volume to {}", key, volume),
            AudioCommand::SetGlobalVolume { volume } => format!("Set master volume to {}", volume),
            AudioCommand::Fade { from, to, duration } => match duration {
                Some(d) => format!("Crossfade {} -> {} ({}ms)", from, to, d.as_millis()),
                None => format!("Crossfade {} -> {}", from, to),
            },
            AudioCommand::Unload { key } => format!("Unload {}", key),
            AudioCommand::Cleanup => "Release all audio".to_string(),
        }
    }

    /// Run the command against a manager
    ///
    /// Fades are started and left to run; the caller keeps advancing the manager.
    pub fn apply(self, manager: &mut AudioManager) -> CommandResult {
        tracing::debug!("Executing command: {}", self.description());

        let outcome = match self {
            AudioCommand::Play { key } => manager.play(key),
            AudioCommand::Pause { key } => {
                manager.pause(key);
                Ok(())
            }
            AudioCommand::Stop { key } => {
                manager.stop(key);
                Ok(())
            }
            AudioCommand::StopAll => {
                manager.stop_all();
                Ok(())
            }
            AudioCommand::SetVolume { key, volume } => {
                manager.set_volume(key, volume);
                Ok(())
            }
            AudioCommand::SetGlobalVolume { volume } => {
                manager.set_global_volume(volume);
                Ok(())
            }
            AudioCommand::Fade { from, to, duration } => {
                let duration = duration.unwrap_or_else(|| manager.fade_settings().default_duration());
                manager.fade(from, to, duration).map(|_ticket| ())
            }
            AudioCommand::Unload { key } => {
                manager.unload(key);
                Ok(())
            }
            AudioCommand::Cleanup => {
                manager.cleanup();
                Ok(())
            }
        };

        match outcome {
            Ok(()) => CommandResult::Success,
            Err(err) => CommandResult::Error(err.to_string()),
        }
    }
}
