/// Crossfade scheduling
///
/// A crossfade is a fixed number of discrete volume steps spread evenly over
/// its duration. Time only moves when the owner advances the scheduler, so
/// tests can drive fades without real delays.
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use super::source::TrackKey;

/// What happens to a fade's tracks when a newer fade takes one of them over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreemptPolicy {
    /// Stop ramping and leave volumes where they are
    #[default]
    Leave,

    /// Stop the outgoing track and restore both tracks' target volumes
    Settle,
}

/// Crossfade configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FadeSettings {
    /// Number of volume steps per crossfade
    pub steps: u32,

    /// Duration used when the caller does not pick one
    pub default_duration_ms: u64,

    pub preempt: PreemptPolicy,
}

impl FadeSettings {
    pub fn default_duration(&self) -> Duration {
        Duration::from_millis(self.default_duration_ms)
    }
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self {
            steps: 60,
            default_duration_ms: 1000,
            preempt: PreemptPolicy::Leave,
        }
    }
}

/// Identifies one crossfade for its whole life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FadeId(u64);

impl fmt::Display for FadeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fade#{}", self.0)
    }
}

/// How a crossfade ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeOutcome {
    /// Ran every step; the outgoing track is stopped
    Completed,

    /// A newer fade touching one of its tracks replaced it
    Preempted,

    /// Torn down by unload or cleanup
    Cancelled,
}

/// Deferred completion signal for a crossfade
///
/// Dropping the ticket does not affect the fade.
#[derive(Debug)]
pub struct FadeTicket {
    id: FadeId,
    from: TrackKey,
    to: TrackKey,
    receiver: Receiver<FadeOutcome>,
    resolved: Cell<Option<FadeOutcome>>,
}

impl FadeTicket {
    pub fn id(&self) -> FadeId {
        self.id
    }

    pub fn from(&self) -> TrackKey {
        self.from
    }

    pub fn to(&self) -> TrackKey {
        self.to
    }

    /// The outcome, once the fade has ended
    pub fn outcome(&self) -> Option<FadeOutcome> {
        if let Some(outcome) = self.resolved.get() {
            return Some(outcome);
        }
        let outcome = self.receiver.try_recv().ok()?;
        self.resolved.set(Some(outcome));
        Some(outcome)
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    /// Raw channel, for hosts that select over several sources
    pub fn receiver(&self) -> &Receiver<FadeOutcome> {
        &self.receiver
    }
}

/// An in-flight crossfade
#[derive(Debug)]
pub struct Crossfade {
    pub id: FadeId,
    pub from: TrackKey,
    pub to: TrackKey,

    /// Effective volumes at the start of the fade
    pub from_target: f32,
    pub to_target: f32,

    steps: u32,
    step: u32,
    step_interval: Duration,
    elapsed: Duration,
    notify: Sender<FadeOutcome>,
}

impl Crossfade {
    /// Volumes after `step` of `steps`
    fn volumes_at(&self, step: u32) -> (f32, f32) {
        if step >= self.steps {
            return (0.0, self.to_target);
        }
        let from_step = self.from_target / self.steps as f32;
        let to_step = self.to_target / self.steps as f32;
        let from = (self.from_target - from_step * step as f32).max(0.0);
        let to = (to_step * step as f32).min(self.to_target);
        (from, to)
    }

    /// Steps whose deadline has passed, capped at the total
    fn due_steps(&self) -> u32 {
        if self.step_interval.is_zero() {
            return self.steps;
        }
        let due = self.elapsed.as_nanos() / self.step_interval.as_nanos();
        due.min(u128::from(self.steps)) as u32
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step >= self.steps
    }

    pub fn involves(&self, key: TrackKey) -> bool {
        self.from == key || self.to == key
    }

    /// Tell the ticket holder how this fade ended
    pub fn resolve(self, outcome: FadeOutcome) {
        // The ticket may already be gone
        let _ = self.notify.send(outcome);
    }
}

/// Volumes to apply after advancing, plus the fade itself once it has finished
#[derive(Debug)]
pub struct FadeUpdate {
    pub id: FadeId,
    pub from: TrackKey,
    pub to: TrackKey,
    pub from_volume: f32,
    pub to_volume: f32,
    pub completed: Option<Crossfade>,
}

/// Owns every in-flight crossfade and which track each one holds
#[derive(Debug, Default)]
pub struct FadeScheduler {
    fades: HashMap<FadeId, Crossfade>,
    owners: HashMap<TrackKey, FadeId>,
    next_id: u64,
}

impl FadeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a fade. Callers must cancel fades touching either key first.
    pub fn start(
        &mut self,
        from: TrackKey,
        to: TrackKey,
        from_target: f32,
        to_target: f32,
        duration: Duration,
        steps: u32,
    ) -> FadeTicket {
        debug_assert!(self.touching(from).is_none() && self.touching(to).is_none());

        let steps = steps.max(1);
        let id = FadeId(self.next_id);
        self.next_id += 1;

        let (notify, receiver) = bounded(1);
        let fade = Crossfade {
            id,
            from,
            to,
            from_target,
            to_target,
            steps,
            step: 0,
            step_interval: duration / steps,
            elapsed: Duration::ZERO,
            notify,
        };

        self.owners.insert(from, id);
        self.owners.insert(to, id);
        self.fades.insert(id, fade);

        FadeTicket {
            id,
            from,
            to,
            receiver,
            resolved: Cell::new(None),
        }
    }

    /// The fade currently holding `key`
    pub fn touching(&self, key: TrackKey) -> Option<FadeId> {
        self.owners.get(&key).copied()
    }

    pub fn get(&self, id: FadeId) -> Option<&Crossfade> {
        self.fades.get(&id)
    }

    /// Remove the fade holding `key`, releasing both of its tracks
    pub fn cancel_touching(&mut self, key: TrackKey) -> Option<Crossfade> {
        let id = self.owners.get(&key).copied()?;
        self.remove(id)
    }

    /// Remove every fade
    pub fn cancel_all(&mut self) -> Vec<Crossfade> {
        self.owners.clear();
        self.fades.drain().map(|(_, fade)| fade).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fades.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fades.len()
    }

    /// Move every fade forward by `elapsed`
    ///
    /// Only fades that crossed at least one step boundary produce an update.
    /// Finished fades are removed and handed back in `completed`.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<FadeUpdate> {
        let mut updates = Vec::new();
        let mut finished = Vec::new();

        for fade in self.fades.values_mut() {
            fade.elapsed += elapsed;
            let due = fade.due_steps();
            if due <= fade.step {
                continue;
            }
            fade.step = due;

            let (from_volume, to_volume) = fade.volumes_at(due);
            if fade.is_complete() {
                finished.push(fade.id);
            }
            updates.push(FadeUpdate {
                id: fade.id,
                from: fade.from,
                to: fade.to,
                from_volume,
                to_volume,
                completed: None,
            });
        }

        for id in finished {
            if let Some(fade) = self.remove(id) {
                if let Some(update) = updates.iter_mut().find(|u| u.id == fade.id) {
                    update.completed = Some(fade);
                }
            }
        }

        updates
    }

    fn remove(&mut self, id: FadeId) -> Option<Crossfade> {
        let fade = self.fades.remove(&id)?;
        self.owners.retain(|_, owner| *owner != id);
        Some(fade)
    }
}
