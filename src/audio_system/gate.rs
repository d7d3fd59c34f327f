/// User-gesture gate
///
/// Mobile browsers and some embedded hosts refuse audio until the user has
/// interacted with the app. The host flips this gate once it has seen a
/// qualifying input; there is no way back.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-way interaction flag, shareable with whatever listens for input
#[derive(Debug, Clone, Default)]
pub struct GestureGate {
    opened: Arc<AtomicBool>,
}

impl GestureGate {
    /// A closed gate
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that is already open, for hosts where launching counts as a gesture
    pub fn opened() -> Self {
        let gate = Self::new();
        gate.open();
        gate
    }

    /// Record the first qualifying input. Returns true only for the call that opened it.
    pub fn open(&self) -> bool {
        let first = !self.opened.swap(true, Ordering::AcqRel);
        if first {
            tracing::info!("User interaction detected, audio playback unlocked");
        }
        first
    }

    pub fn is_open(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }
}
