/// Audio system module
///
/// Session-scoped playback for the app's fixed track catalog:
/// - One foreground track at a time (playing another stops the current one)
/// - Per-track and global volume
/// - Linear crossfades between two tracks, stepped by an explicit clock
/// - Primary/fallback sources per track
/// - Playback gated on the first user interaction
///
/// ## Architecture
///
/// ```text
/// AudioManager
///   ├── configs  TrackKey -> AudioTrackConfig
///   ├── handles  TrackKey -> AudioElement (from an AudioBackend)
///   │                         ├── RodioBackend    (output device)
///   │                         └── HeadlessBackend (simulated clock)
///   ├── FadeScheduler         in-flight crossfades, one per track
///   ├── GestureGate           shared with the input listener
///   └── EventBus              PlaybackEvents for the UI
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use calmee_audio::audio_system::{default_catalog, AssetResolver, AudioManager, RodioBackend, TrackKey};
///
/// let backend = RodioBackend::try_default()?;
/// let mut manager = AudioManager::new(Box::new(backend), AssetResolver::new("public"));
/// manager.register_multiple(default_catalog());
///
/// // From the first tap handler
/// manager.gate().open();
/// manager.play(TrackKey::AmbienteRain)?;
///
/// let ticket = manager.fade(TrackKey::AmbienteRain, TrackKey::AmbienteOcean, Duration::from_secs(2))?;
/// while !ticket.is_finished() {
///     manager.pump();
/// }
/// ```
pub mod backend;
pub mod catalog;
pub mod fade;
pub mod gate;
pub mod headless;
pub mod manager;
pub mod player;
pub mod probe;
pub mod source;
pub mod volume;

// Re-export commonly used types
pub use backend::{AudioBackend, AudioElement};
pub use catalog::{catalog_entry, default_catalog, AssetResolver, AudioTrackConfig, Preload};
pub use fade::{FadeId, FadeOutcome, FadeSettings, FadeTicket, PreemptPolicy};
pub use gate::GestureGate;
pub use headless::HeadlessBackend;
pub use manager::{AudioManager, TrackState};
pub use player::RodioBackend;
pub use source::{TrackCategory, TrackKey, UnknownTrackKey};
pub use volume::Volume;
