/// Audio manager
///
/// Registry and playback controller for the track catalog. One instance per
/// client session, owned by the host and torn down with `cleanup` (or drop).
use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::Config;
use crate::error::AudioError;
use crate::messaging::{EventBus, PlaybackEvent};

use super::backend::{AudioBackend, AudioElement};
use super::catalog::{AssetResolver, AudioTrackConfig};
use super::fade::{Crossfade, FadeOutcome, FadeScheduler, FadeSettings, FadeTicket, PreemptPolicy};
use super::gate::GestureGate;
use super::source::TrackKey;
use super::volume::Volume;

/// Snapshot of one track for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackState {
    /// Not paused and not ended
    pub is_playing: bool,
    pub is_paused: bool,
    /// Effective output volume
    pub volume: f32,
    pub current_time: Duration,
    /// Zero until known
    pub duration: Duration,
}

/// Which locator a handle is currently using
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceStage {
    Primary,
    Fallback,
    Exhausted,
}

/// Runtime binding between a key and its element
struct AudioHandle {
    element: Box<dyn AudioElement>,
    stage: SourceStage,
}

pub struct AudioManager {
    backend: Box<dyn AudioBackend>,
    resolver: AssetResolver,
    settings: FadeSettings,
    configs: HashMap<TrackKey, AudioTrackConfig>,
    handles: HashMap<TrackKey, AudioHandle>,
    global_volume: Volume,
    currently_playing: Option<TrackKey>,
    fades: FadeScheduler,
    gate: GestureGate,
    events: EventBus,
    last_pump: Option<Instant>,
}

impl AudioManager {
    /// Create an empty manager with a closed gesture gate
    pub fn new(backend: Box<dyn AudioBackend>, resolver: AssetResolver) -> Self {
        tracing::info!(
            "Audio manager using {} backend, assets under {}",
            backend.name(),
            resolver.root().display()
        );
        Self {
            backend,
            resolver,
            settings: FadeSettings::default(),
            configs: HashMap::new(),
            handles: HashMap::new(),
            global_volume: Volume::FULL,
            currently_playing: None,
            fades: FadeScheduler::new(),
            gate: GestureGate::new(),
            events: EventBus::new(),
            last_pump: None,
        }
    }

    /// Create a manager from the app configuration
    pub fn from_config(backend: Box<dyn AudioBackend>, config: &Config) -> Self {
        let mut manager = Self::new(backend, AssetResolver::new(&config.asset_root))
            .with_fade_settings(config.fade);
        manager.global_volume = Volume::new(config.global_volume);
        manager
    }

    pub fn with_fade_settings(mut self, settings: FadeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Share a gate with the host's input listener
    pub fn with_gate(mut self, gate: GestureGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn gate(&self) -> &GestureGate {
        &self.gate
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn fade_settings(&self) -> FadeSettings {
        self.settings
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register a track, replacing and releasing any previous handle for its key
    ///
    /// Source load failures are not errors here: the handle falls back or is
    /// marked unplayable. Only a backend that cannot create an element fails.
    pub fn register(&mut self, config: AudioTrackConfig) -> Result<(), AudioError> {
        let key = config.key;
        if self.handles.contains_key(&key) {
            tracing::debug!("Re-registering {}, releasing previous handle", key);
            self.discard(key);
        }

        let config = AudioTrackConfig {
            volume: Volume::new(config.volume).level(),
            ..config
        };

        let mut element = self.backend.create_element(key)?;
        element.set_looping(config.looping);
        element.set_volume(Volume::effective(Volume::new(config.volume), self.global_volume));

        let mut handle = AudioHandle {
            element,
            stage: SourceStage::Primary,
        };

        let primary = self.resolver.resolve(&config.src);
        if let Err(err) = handle.element.load(&primary, config.preload) {
            // Register still succeeds; playback reports the exhausted source later
            let _ = Self::fall_back(&self.resolver, &self.events, &config, &mut handle, &err);
        }

        tracing::debug!(
            "Registered {} (loop={}, preload={:?}, volume={})",
            key,
            config.looping,
            config.preload,
            config.volume
        );
        self.configs.insert(key, config);
        self.handles.insert(key, handle);
        self.events.publish(PlaybackEvent::TrackRegistered { key });
        Ok(())
    }

    /// Register several tracks in order
    ///
    /// Keeps going after a failure and returns every failure; nothing is rolled back.
    pub fn register_multiple<I>(&mut self, configs: I) -> Vec<(TrackKey, AudioError)>
    where
        I: IntoIterator<Item = AudioTrackConfig>,
    {
        let mut registered = 0;
        let mut failures = Vec::new();
        for config in configs {
            let key = config.key;
            match self.register(config) {
                Ok(()) => registered += 1,
                Err(err) => {
                    tracing::error!("Failed to register {}: {}", key, err);
                    failures.push((key, err));
                }
            }
        }
        tracing::info!(
            "Registered {} tracks ({} failed)",
            registered,
            failures.len()
        );
        failures
    }

    /// Switch a handle to its fallback source, once
    fn fall_back(
        resolver: &AssetResolver,
        events: &EventBus,
        config: &AudioTrackConfig,
        handle: &mut AudioHandle,
        cause: &AudioError,
    ) -> Result<(), AudioError> {
        let key = config.key;
        match (handle.stage, config.fallback_src.as_deref()) {
            (SourceStage::Primary, Some(fallback)) => {
                let path = resolver.resolve(fallback);
                tracing::warn!(
                    "Failed to load {} ({}), trying fallback {}",
                    config.src,
                    cause,
                    path.display()
                );
                handle.stage = SourceStage::Fallback;
                events.publish(PlaybackEvent::SourceFallback {
                    key,
                    path: path.clone(),
                });

                handle.element.load(&path, config.preload).map_err(|err| {
                    tracing::warn!("Fallback for {} failed too: {}", key, err);
                    Self::exhaust(events, handle, key)
                })
            }
            _ => {
                tracing::warn!("No playable source for {}: {}", key, cause);
                Err(Self::exhaust(events, handle, key))
            }
        }
    }

    fn exhaust(events: &EventBus, handle: &mut AudioHandle, key: TrackKey) -> AudioError {
        handle.stage = SourceStage::Exhausted;
        events.publish(PlaybackEvent::SourceExhausted { key });
        AudioError::FallbackExhausted(key)
    }

    /// Start an element, falling back once if its source turns out to be bad
    fn start_track(&mut self, key: TrackKey) -> Result<(), AudioError> {
        let config = self.configs.get(&key).ok_or(AudioError::UnknownTrack(key))?;
        let handle = self
            .handles
            .get_mut(&key)
            .ok_or(AudioError::UnknownTrack(key))?;

        if handle.stage == SourceStage::Exhausted {
            return Err(AudioError::FallbackExhausted(key));
        }

        match handle.element.play() {
            Err(err) if err.is_source_error() => {
                Self::fall_back(&self.resolver, &self.events, config, handle, &err)?;
                handle.element.play().map_err(|err| {
                    if err.is_source_error() {
                        Self::exhaust(&self.events, handle, key)
                    } else {
                        err
                    }
                })
            }
            result => result,
        }
    }

    // ---------------------------------------------------------------------
    // Transport
    // ---------------------------------------------------------------------

    /// Play a track, stopping whichever other track is current
    ///
    /// A fade holding `key` is cancelled and the track plays at its own
    /// target volume, whatever a fade last left it at.
    pub fn play(&mut self, key: TrackKey) -> Result<(), AudioError> {
        if !self.gate.is_open() {
            tracing::warn!("Audio blocked: waiting for user interaction ({})", key);
            self.events.publish(PlaybackEvent::PlaybackBlocked { key });
            return Err(AudioError::PlaybackBlocked);
        }

        if !self.handles.contains_key(&key) {
            tracing::error!("Audio not found: {}", key);
            return Err(AudioError::UnknownTrack(key));
        }

        self.cancel_fade(key);
        let target = self.target_volume(key);
        if let Some(handle) = self.handles.get_mut(&key) {
            handle.element.set_volume(target);
        }

        if let Some(current) = self.currently_playing {
            if current != key {
                self.stop(current);
            }
        }

        match self.start_track(key) {
            Ok(()) => {
                self.currently_playing = Some(key);
                tracing::info!("Playing {}", key);
                self.events.publish(PlaybackEvent::TrackStarted { key });
                Ok(())
            }
            Err(err) => {
                tracing::error!("Error playing {}: {}", key, err);
                self.events.publish(PlaybackEvent::PlaybackFailed {
                    key,
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Pause without rewinding
    pub fn pause(&mut self, key: TrackKey) {
        let Some(handle) = self.handles.get_mut(&key) else {
            tracing::debug!("Pause ignored for unregistered {}", key);
            return;
        };

        handle.element.pause();
        if self.currently_playing == Some(key) {
            self.currently_playing = None;
        }
        tracing::debug!("Paused {}", key);
        self.events.publish(PlaybackEvent::TrackPaused { key });
    }

    /// Pause and rewind to the start
    pub fn stop(&mut self, key: TrackKey) {
        let Some(handle) = self.handles.get_mut(&key) else {
            tracing::debug!("Stop ignored for unregistered {}", key);
            return;
        };

        Self::halt(key, handle);
        if self.currently_playing == Some(key) {
            self.currently_playing = None;
        }
        self.events.publish(PlaybackEvent::TrackStopped { key });
    }

    /// Stop every track and cancel every fade
    pub fn stop_all(&mut self) {
        for fade in self.fades.cancel_all() {
            tracing::debug!("{} cancelled", fade.id);
            fade.resolve(FadeOutcome::Cancelled);
        }

        let keys: Vec<TrackKey> = self.handles.keys().copied().collect();
        for key in keys {
            self.stop(key);
        }
        tracing::debug!("Stopped all audio tracks");
    }

    fn halt(key: TrackKey, handle: &mut AudioHandle) {
        handle.element.pause();
        if let Err(err) = handle.element.rewind() {
            tracing::warn!("Failed to rewind {}: {}", key, err);
        }
    }

    // ---------------------------------------------------------------------
    // Volume
    // ---------------------------------------------------------------------

    /// Set a track's own volume (clamped); output is scaled by the global volume
    pub fn set_volume(&mut self, key: TrackKey, volume: f32) {
        let (Some(config), Some(handle)) = (self.configs.get_mut(&key), self.handles.get_mut(&key))
        else {
            tracing::debug!("Volume change ignored for unregistered {}", key);
            return;
        };

        let volume = Volume::new(volume);
        config.volume = volume.level();
        handle
            .element
            .set_volume(Volume::effective(volume, self.global_volume));
        self.events.publish(PlaybackEvent::VolumeChanged {
            key,
            volume: volume.level(),
        });
    }

    /// Set the master volume (clamped) and rescale every track
    pub fn set_global_volume(&mut self, volume: f32) {
        self.global_volume = Volume::new(volume);
        for (key, handle) in self.handles.iter_mut() {
            let track = self
                .configs
                .get(key)
                .map(|c| Volume::new(c.volume))
                .unwrap_or_default();
            handle
                .element
                .set_volume(Volume::effective(track, self.global_volume));
        }
        tracing::debug!("Global volume set to {}", self.global_volume.level());
        self.events.publish(PlaybackEvent::GlobalVolumeChanged {
            volume: self.global_volume.level(),
        });
    }

    /// A track's own volume; 1.0 for unregistered keys
    pub fn volume(&self, key: TrackKey) -> f32 {
        self.configs.get(&key).map(|c| c.volume).unwrap_or(1.0)
    }

    pub fn global_volume(&self) -> f32 {
        self.global_volume.level()
    }

    fn target_volume(&self, key: TrackKey) -> f32 {
        Volume::effective(Volume::new(self.volume(key)), self.global_volume)
    }

    // ---------------------------------------------------------------------
    // Crossfade
    // ---------------------------------------------------------------------

    /// Crossfade using the configured default duration
    pub fn fade_default(&mut self, from: TrackKey, to: TrackKey) -> Result<FadeTicket, AudioError> {
        self.fade(from, to, self.settings.default_duration())
    }

    /// Crossfade from one track to another
    ///
    /// `to` starts at zero volume and becomes the current track immediately.
    /// Volumes then ramp linearly as time is advanced; on the last step `from`
    /// is stopped and the ticket resolves. Any fade already holding either
    /// track is preempted first.
    pub fn fade(
        &mut self,
        from: TrackKey,
        to: TrackKey,
        duration: Duration,
    ) -> Result<FadeTicket, AudioError> {
        if from == to {
            tracing::error!("Crossfade needs two different tracks, got {} twice", from);
            return Err(AudioError::InvalidFade(format!("{from} to itself")));
        }
        for key in [from, to] {
            if !self.handles.contains_key(&key) {
                tracing::error!("Tracks not found for crossfade {} -> {}", from, to);
                return Err(AudioError::UnknownTrack(key));
            }
        }
        if !self.gate.is_open() {
            tracing::warn!("Crossfade blocked: waiting for user interaction ({})", to);
            self.events.publish(PlaybackEvent::PlaybackBlocked { key: to });
            return Err(AudioError::PlaybackBlocked);
        }

        self.preempt(from, to);

        let from_target = self.target_volume(from);
        let to_target = self.target_volume(to);

        if let Some(handle) = self.handles.get_mut(&to) {
            handle.element.set_volume(0.0);
        }
        if let Err(err) = self.start_track(to) {
            if let Some(handle) = self.handles.get_mut(&to) {
                handle.element.set_volume(to_target);
            }
            tracing::error!("Crossfade {} -> {} failed to start: {}", from, to, err);
            self.events.publish(PlaybackEvent::PlaybackFailed {
                key: to,
                message: err.to_string(),
            });
            return Err(err);
        }
        self.currently_playing = Some(to);

        if self.fades.is_empty() {
            self.last_pump = Some(Instant::now());
        }
        let ticket = self
            .fades
            .start(from, to, from_target, to_target, duration, self.settings.steps);

        tracing::info!(
            "Crossfading {} -> {} over {}ms ({})",
            from,
            to,
            duration.as_millis(),
            ticket.id()
        );
        self.events.publish(PlaybackEvent::FadeStarted {
            id: ticket.id(),
            from,
            to,
            duration,
        });
        Ok(ticket)
    }

    /// Drop any fade holding `from` or `to`, applying the preemption policy
    fn preempt(&mut self, from: TrackKey, to: TrackKey) {
        for key in [from, to] {
            let Some(fade) = self.fades.cancel_touching(key) else {
                continue;
            };

            tracing::debug!("{} preempted by a new crossfade on {}", fade.id, key);
            if self.settings.preempt == PreemptPolicy::Settle {
                self.settle(fade.from, fade.from_target, from, to);
                self.settle(fade.to, fade.to_target, from, to);
            }

            self.events.publish(PlaybackEvent::FadePreempted {
                id: fade.id,
                from: fade.from,
                to: fade.to,
            });
            fade.resolve(FadeOutcome::Preempted);
        }
    }

    /// Restore a preempted endpoint's volume, stopping it unless the new fade uses it
    fn settle(&mut self, key: TrackKey, target: f32, from: TrackKey, to: TrackKey) {
        let Some(handle) = self.handles.get_mut(&key) else {
            return;
        };
        if key != from && key != to {
            Self::halt(key, handle);
            if self.currently_playing == Some(key) {
                self.currently_playing = None;
            }
        }
        handle.element.set_volume(target);
    }

    fn cancel_fade(&mut self, key: TrackKey) {
        if let Some(fade) = self.fades.cancel_touching(key) {
            tracing::debug!("{} cancelled", fade.id);
            fade.resolve(FadeOutcome::Cancelled);
        }
    }

    pub fn has_active_fades(&self) -> bool {
        !self.fades.is_empty()
    }

    /// The fade currently holding `key`, if any
    pub fn fade_for(&self, key: TrackKey) -> Option<&Crossfade> {
        self.fades.touching(key).and_then(|id| self.fades.get(id))
    }

    // ---------------------------------------------------------------------
    // Time
    // ---------------------------------------------------------------------

    /// Move fades and clock-driven elements forward by `elapsed`
    pub fn advance(&mut self, elapsed: Duration) {
        for handle in self.handles.values_mut() {
            handle.element.advance(elapsed);
        }

        for update in self.fades.advance(elapsed) {
            if let Some(handle) = self.handles.get_mut(&update.from) {
                handle.element.set_volume(update.from_volume);
            }
            if let Some(handle) = self.handles.get_mut(&update.to) {
                handle.element.set_volume(update.to_volume);
            }

            if let Some(fade) = update.completed {
                if let Some(handle) = self.handles.get_mut(&fade.from) {
                    Self::halt(fade.from, handle);
                }
                tracing::debug!("{} complete: {} -> {}", fade.id, fade.from, fade.to);
                self.events.publish(PlaybackEvent::FadeCompleted {
                    id: fade.id,
                    from: fade.from,
                    to: fade.to,
                });
                fade.resolve(FadeOutcome::Completed);
            }
        }
    }

    /// Advance by the wall-clock time since the previous pump
    pub fn pump(&mut self) {
        let now = Instant::now();
        let elapsed = self
            .last_pump
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_pump = Some(now);
        self.advance(elapsed);
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Snapshot of a track, or None if it is not registered
    pub fn state(&self, key: TrackKey) -> Option<TrackState> {
        let element = &self.handles.get(&key)?.element;
        let is_paused = element.is_paused();
        Some(TrackState {
            is_playing: !is_paused && !element.is_ended(),
            is_paused,
            volume: element.volume(),
            current_time: element.position(),
            duration: element.duration().unwrap_or_default(),
        })
    }

    pub fn is_playing(&self, key: TrackKey) -> bool {
        self.state(key).is_some_and(|s| s.is_playing)
    }

    pub fn currently_playing(&self) -> Option<TrackKey> {
        self.currently_playing
    }

    pub fn is_registered(&self, key: TrackKey) -> bool {
        self.handles.contains_key(&key)
    }

    /// Registered keys in catalog order
    pub fn registered(&self) -> Vec<TrackKey> {
        let mut keys: Vec<TrackKey> = self.handles.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn config(&self, key: TrackKey) -> Option<&AudioTrackConfig> {
        self.configs.get(&key)
    }

    // ---------------------------------------------------------------------
    // Teardown
    // ---------------------------------------------------------------------

    /// Cancel fades touching `key`, release its element and forget it
    fn discard(&mut self, key: TrackKey) {
        self.cancel_fade(key);
        if let Some(mut handle) = self.handles.remove(&key) {
            handle.element.pause();
            handle.element.release();
        }
        self.configs.remove(&key);
        if self.currently_playing == Some(key) {
            self.currently_playing = None;
        }
    }

    /// Release one track (useful when leaving a screen)
    pub fn unload(&mut self, key: TrackKey) {
        let registered = self.handles.contains_key(&key);
        self.discard(key);
        if registered {
            tracing::debug!("Unloaded {}", key);
            self.events.publish(PlaybackEvent::TrackUnloaded { key });
        }
    }

    /// Cancel every fade and release every track
    pub fn cleanup(&mut self) {
        for fade in self.fades.cancel_all() {
            fade.resolve(FadeOutcome::Cancelled);
        }

        let released = self.handles.len();
        for (_, mut handle) in self.handles.drain() {
            handle.element.pause();
            handle.element.release();
        }
        self.configs.clear();
        self.currently_playing = None;
        self.last_pump = None;

        tracing::info!("Audio manager cleaned up ({} tracks released)", released);
        self.events.publish(PlaybackEvent::CleanedUp);
    }
}

impl Drop for AudioManager {
    fn drop(&mut self) {
        if !self.handles.is_empty() || !self.fades.is_empty() {
            self.cleanup();
        }
    }
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("backend", &self.backend.name())
            .field("tracks", &self.registered())
            .field("global_volume", &self.global_volume.level())
            .field("currently_playing", &self.currently_playing)
            .field("active_fades", &self.fades.len())
            .finish()
    }
}
