/// Messaging module for the UI <-> audio boundary
///
/// - **Commands**: requests from the UI to the audio manager (imperative)
/// - **Events**: notifications of what the manager did (past tense, broadcast)
///
/// ## Architecture
///
/// ```text
/// ┌─────────┐   AudioCommand   ┌──────────────┐   PlaybackEvent   ┌──────────┐
/// │   UI    │ ───────────────> │ AudioManager │ ────────────────> │ EventBus │
/// └─────────┘                  └──────────────┘                   └──────────┘
///                                                                      │
///                                                                      ▼
///                                                               UI subscribers
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let (rx, _id) = manager.events().subscribe();
///
/// AudioCommand::Play { key: TrackKey::AmbienteRain }.apply(&mut manager);
///
/// while let Ok(event) = rx.try_recv() {
///     if event.is_failure() {
///         show_toast(event.description());
///     }
/// }
/// ```
pub mod bus;
pub mod commands;
pub mod events;

// Re-export commonly used types
pub use bus::{EventBus, SubscriberId};
pub use commands::{AudioCommand, CommandResult};
pub use events::PlaybackEvent;
