// Integration tests for crossfades
// Default fades have 60 steps, so a 600ms fade moves one step every 10ms

mod common;

use std::thread;
use std::time::Duration;

use calmee_audio::audio_system::{
    catalog_entry, AssetResolver, FadeSettings, HeadlessBackend, PreemptPolicy,
};
use calmee_audio::{AudioError, AudioManager, FadeOutcome, PlaybackEvent, TrackKey};

use common::{assert_volume, manager_with, manager_with_tracks, primary_path};

const RAIN: TrackKey = TrackKey::AmbienteRain;
const WIND: TrackKey = TrackKey::AmbienteWind;
const OCEAN: TrackKey = TrackKey::AmbienteOcean;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn volume_of(manager: &AudioManager, key: TrackKey) -> f32 {
    manager.state(key).expect("track is registered").volume
}

#[test]
fn test_fade_switches_current_track_immediately() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();

    let ticket = manager.fade(RAIN, WIND, ms(100)).unwrap();

    assert_eq!(manager.currently_playing(), Some(WIND));
    assert!(manager.is_playing(WIND));
    assert!(manager.is_playing(RAIN));
    assert_volume(volume_of(&manager, WIND), 0.0);
    assert_volume(volume_of(&manager, RAIN), 0.7);
    assert!(!ticket.is_finished());
}

#[test]
fn test_fade_completes_after_duration() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();

    let ticket = manager.fade(RAIN, WIND, ms(100)).unwrap();
    manager.advance(ms(100));

    assert!(!manager.is_playing(RAIN));
    assert!(manager.is_playing(WIND));
    assert_volume(volume_of(&manager, WIND), 0.7);
    assert_eq!(manager.state(RAIN).unwrap().current_time, Duration::ZERO);
    assert_eq!(ticket.outcome(), Some(FadeOutcome::Completed));
    assert!(!manager.has_active_fades());
}

#[test]
fn test_fade_target_includes_global_volume() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.set_global_volume(0.5);
    manager.set_volume(WIND, 0.8);
    manager.play(RAIN).unwrap();

    manager.fade(RAIN, WIND, ms(100)).unwrap();
    manager.advance(ms(100));

    assert_volume(volume_of(&manager, WIND), 0.4);
}

#[test]
fn test_fade_ramps_in_discrete_steps() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();
    manager.fade(RAIN, WIND, ms(600)).unwrap();

    // Nothing moves before the first step boundary
    manager.advance(ms(9));
    assert_volume(volume_of(&manager, WIND), 0.0);
    assert_volume(volume_of(&manager, RAIN), 0.7);

    manager.advance(ms(1));
    assert_volume(volume_of(&manager, WIND), 0.7 / 60.0);
    assert_volume(volume_of(&manager, RAIN), 0.7 - 0.7 / 60.0);

    manager.advance(ms(290));
    assert_eq!(manager.fade_for(WIND).unwrap().step(), 30);
    assert_volume(volume_of(&manager, WIND), 0.35);
    assert_volume(volume_of(&manager, RAIN), 0.35);
}

#[test]
fn test_large_time_jump_finishes_fade() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();
    let ticket = manager.fade(RAIN, WIND, ms(600)).unwrap();

    manager.advance(Duration::from_secs(5));

    assert_eq!(ticket.outcome(), Some(FadeOutcome::Completed));
    assert_volume(volume_of(&manager, WIND), 0.7);
    assert_volume(volume_of(&manager, RAIN), 0.0);
}

#[test]
fn test_default_duration() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();
    let ticket = manager.fade_default(RAIN, WIND).unwrap();

    manager.advance(ms(990));
    assert!(!ticket.is_finished());

    manager.advance(ms(10));
    assert_eq!(ticket.outcome(), Some(FadeOutcome::Completed));
}

#[test]
fn test_fade_from_idle_track() {
    let mut manager = manager_with_tracks(&[TrackKey::MeditCrise, TrackKey::MeditDormir]);

    let ticket = manager
        .fade(TrackKey::MeditCrise, TrackKey::MeditDormir, ms(100))
        .unwrap();
    manager.advance(ms(100));

    assert_eq!(ticket.outcome(), Some(FadeOutcome::Completed));
    assert!(manager.is_playing(TrackKey::MeditDormir));
    assert!(!manager.is_playing(TrackKey::MeditCrise));
}

#[test]
fn test_fade_rejects_unknown_tracks() {
    let mut manager = manager_with_tracks(&[RAIN]);

    let err = manager.fade(RAIN, WIND, ms(100)).unwrap_err();
    assert!(matches!(err, AudioError::UnknownTrack(WIND)));

    let err = manager.fade(OCEAN, RAIN, ms(100)).unwrap_err();
    assert!(matches!(err, AudioError::UnknownTrack(OCEAN)));
    assert!(!manager.has_active_fades());
}

#[test]
fn test_fade_blocked_by_gesture_gate() {
    let mut manager =
        AudioManager::new(Box::new(HeadlessBackend::new()), AssetResolver::new("public"));
    manager.register(catalog_entry(RAIN)).unwrap();
    manager.register(catalog_entry(WIND)).unwrap();

    let err = manager.fade(RAIN, WIND, ms(100)).unwrap_err();

    assert!(matches!(err, AudioError::PlaybackBlocked));
    assert!(!manager.has_active_fades());
    assert_eq!(manager.currently_playing(), None);
    assert_volume(volume_of(&manager, WIND), 0.7);
}

#[test]
fn test_fade_target_that_cannot_start() {
    let backend = HeadlessBackend::new().failing_playback(primary_path(WIND));
    let mut manager = manager_with(&backend);
    manager.register(catalog_entry(RAIN)).unwrap();
    manager.register(catalog_entry(WIND)).unwrap();
    manager.play(RAIN).unwrap();

    let err = manager.fade(RAIN, WIND, ms(100)).unwrap_err();

    assert!(matches!(err, AudioError::PlaybackFailed { key: WIND, .. }));
    assert!(!manager.has_active_fades());
    assert_eq!(manager.currently_playing(), Some(RAIN));
    assert_volume(volume_of(&manager, WIND), 0.7);
    assert_volume(volume_of(&manager, RAIN), 0.7);
}

#[test]
fn test_preempted_fade_leaves_volumes() {
    let mut manager = manager_with_tracks(&[RAIN, WIND, OCEAN]);
    manager.play(RAIN).unwrap();
    let first = manager.fade(RAIN, WIND, ms(600)).unwrap();
    manager.advance(ms(300));

    let second = manager.fade(WIND, OCEAN, ms(600)).unwrap();

    assert_eq!(first.outcome(), Some(FadeOutcome::Preempted));
    assert!(!second.is_finished());
    assert_eq!(manager.currently_playing(), Some(OCEAN));

    // The abandoned track keeps playing at its mid-fade volume
    assert!(manager.is_playing(RAIN));
    assert_volume(volume_of(&manager, RAIN), 0.35);
    assert!(manager.fade_for(RAIN).is_none());

    manager.advance(ms(600));
    assert_eq!(second.outcome(), Some(FadeOutcome::Completed));
    assert!(!manager.is_playing(WIND));
    assert!(manager.is_playing(RAIN));
    assert_volume(volume_of(&manager, OCEAN), 0.7);
}

#[test]
fn test_preempted_fade_settles_when_configured() {
    let backend = HeadlessBackend::new();
    let mut manager = manager_with(&backend).with_fade_settings(FadeSettings {
        preempt: PreemptPolicy::Settle,
        ..FadeSettings::default()
    });
    assert!(manager
        .register_multiple([catalog_entry(RAIN), catalog_entry(WIND), catalog_entry(OCEAN)])
        .is_empty());
    manager.play(RAIN).unwrap();
    let first = manager.fade(RAIN, WIND, ms(600)).unwrap();
    manager.advance(ms(300));

    manager.fade(WIND, OCEAN, ms(600)).unwrap();

    assert_eq!(first.outcome(), Some(FadeOutcome::Preempted));

    // The outgoing track is stopped and restored to its target volume
    let rain = manager.state(RAIN).unwrap();
    assert!(!rain.is_playing);
    assert_eq!(rain.current_time, Duration::ZERO);
    assert_volume(rain.volume, 0.7);
}

#[test]
fn test_new_fade_on_same_pair_replaces_old() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();
    let first = manager.fade(RAIN, WIND, ms(600)).unwrap();
    manager.advance(ms(100));

    let second = manager.fade(WIND, RAIN, ms(600)).unwrap();

    assert_eq!(first.outcome(), Some(FadeOutcome::Preempted));
    assert_eq!(manager.currently_playing(), Some(RAIN));
    assert_ne!(first.id(), second.id());

    manager.advance(ms(600));
    assert_eq!(second.outcome(), Some(FadeOutcome::Completed));
    assert!(manager.is_playing(RAIN));
    assert!(!manager.is_playing(WIND));
}

#[test]
fn test_unrelated_fades_run_concurrently() {
    let mut manager = manager_with_tracks(&[RAIN, WIND, TrackKey::MeditCrise, TrackKey::MeditDormir]);
    let ambient = manager.fade(RAIN, WIND, ms(600)).unwrap();
    let meditation = manager
        .fade(TrackKey::MeditCrise, TrackKey::MeditDormir, ms(300))
        .unwrap();

    manager.advance(ms(300));
    assert_eq!(meditation.outcome(), Some(FadeOutcome::Completed));
    assert!(!ambient.is_finished());

    manager.advance(ms(300));
    assert_eq!(ambient.outcome(), Some(FadeOutcome::Completed));
}

#[test]
fn test_unload_cancels_fade() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();
    let ticket = manager.fade(RAIN, WIND, ms(600)).unwrap();
    manager.advance(ms(300));

    manager.unload(RAIN);

    assert_eq!(ticket.outcome(), Some(FadeOutcome::Cancelled));
    assert!(!manager.has_active_fades());

    // The incoming track stays where the fade left it
    manager.advance(ms(600));
    assert!(manager.is_playing(WIND));
    assert_volume(volume_of(&manager, WIND), 0.35);
}

#[test]
fn test_cleanup_cancels_fades() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    let ticket = manager.fade(RAIN, WIND, ms(600)).unwrap();

    manager.cleanup();

    assert_eq!(ticket.outcome(), Some(FadeOutcome::Cancelled));
    assert!(!manager.has_active_fades());
}

#[test]
fn test_pause_does_not_cancel_fade() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();
    let ticket = manager.fade(RAIN, WIND, ms(100)).unwrap();

    manager.pause(WIND);
    manager.advance(ms(100));

    assert_eq!(ticket.outcome(), Some(FadeOutcome::Completed));
    assert!(!manager.is_playing(WIND));
    assert_volume(volume_of(&manager, WIND), 0.7);
}

#[test]
fn test_dropped_ticket_does_not_stop_fade() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();
    drop(manager.fade(RAIN, WIND, ms(100)).unwrap());

    manager.advance(ms(100));

    assert!(!manager.is_playing(RAIN));
    assert_volume(volume_of(&manager, WIND), 0.7);
}

#[test]
fn test_ticket_receiver_delivers_outcome() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    let ticket = manager.fade(RAIN, WIND, ms(100)).unwrap();
    assert!(ticket.receiver().try_recv().is_err());

    manager.advance(ms(100));

    assert_eq!(ticket.receiver().try_recv(), Ok(FadeOutcome::Completed));
}

#[test]
fn test_fade_events() {
    let mut manager = manager_with_tracks(&[RAIN, WIND, OCEAN]);
    manager.play(RAIN).unwrap();
    let (events, _id) = manager.events().subscribe();

    let first = manager.fade(RAIN, WIND, ms(100)).unwrap();
    let second = manager.fade(WIND, OCEAN, ms(100)).unwrap();
    manager.advance(ms(100));

    let received: Vec<PlaybackEvent> = events
        .try_iter()
        .filter(|e| {
            matches!(
                e,
                PlaybackEvent::FadeStarted { .. }
                    | PlaybackEvent::FadePreempted { .. }
                    | PlaybackEvent::FadeCompleted { .. }
            )
        })
        .collect();

    assert_eq!(
        received,
        vec![
            PlaybackEvent::FadeStarted {
                id: first.id(),
                from: RAIN,
                to: WIND,
                duration: ms(100),
            },
            PlaybackEvent::FadePreempted {
                id: first.id(),
                from: RAIN,
                to: WIND,
            },
            PlaybackEvent::FadeStarted {
                id: second.id(),
                from: WIND,
                to: OCEAN,
                duration: ms(100),
            },
            PlaybackEvent::FadeCompleted {
                id: second.id(),
                from: WIND,
                to: OCEAN,
            },
        ]
    );
}

#[test]
fn test_fewer_steps_from_settings() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]).with_fade_settings(FadeSettings {
        steps: 4,
        ..FadeSettings::default()
    });
    manager.play(RAIN).unwrap();
    manager.fade(RAIN, WIND, ms(400)).unwrap();

    manager.advance(ms(100));
    assert_volume(volume_of(&manager, WIND), 0.175);

    manager.advance(ms(199));
    assert_volume(volume_of(&manager, WIND), 0.35);
}

#[test]
fn test_pump_drives_fade_in_real_time() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();
    let ticket = manager.fade(RAIN, WIND, ms(30)).unwrap();

    thread::sleep(ms(50));
    manager.pump();

    assert_eq!(ticket.outcome(), Some(FadeOutcome::Completed));
    assert!(!manager.is_playing(RAIN));
    assert_volume(volume_of(&manager, WIND), 0.7);
}

#[test]
fn test_stop_all_cancels_fades() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();
    let ticket = manager.fade(RAIN, WIND, ms(600)).unwrap();
    manager.advance(ms(100));

    manager.stop_all();

    assert_eq!(ticket.outcome(), Some(FadeOutcome::Cancelled));
    assert!(!manager.has_active_fades());
    assert_eq!(manager.currently_playing(), None);

    manager.advance(ms(600));
    assert!(!manager.is_playing(RAIN));
    assert!(!manager.is_playing(WIND));
}

#[test]
fn test_play_takes_track_back_from_fade() {
    let mut manager = manager_with_tracks(&[RAIN, WIND]);
    manager.play(RAIN).unwrap();
    let ticket = manager.fade(RAIN, WIND, ms(600)).unwrap();
    manager.advance(ms(300));

    manager.play(RAIN).unwrap();

    assert_eq!(ticket.outcome(), Some(FadeOutcome::Cancelled));
    assert!(!manager.has_active_fades());
    assert_eq!(manager.currently_playing(), Some(RAIN));
    assert_volume(volume_of(&manager, RAIN), 0.7);
    assert!(!manager.is_playing(WIND));

    manager.advance(ms(300));
    assert!(manager.is_playing(RAIN));
    assert_eq!(manager.currently_playing(), Some(RAIN));
}

#[test]
fn test_replay_after_fade_out_is_audible() {
    let mut manager = manager_with_tracks(&[RAIN, WIND, TrackKey::MeditCrise]);
    manager.set_global_volume(0.5);
    manager.play(RAIN).unwrap();
    manager.fade(RAIN, WIND, ms(100)).unwrap();
    manager.advance(ms(100));
    assert_volume(volume_of(&manager, RAIN), 0.0);

    manager.play(TrackKey::MeditCrise).unwrap();
    manager.play(RAIN).unwrap();

    assert!(manager.is_playing(RAIN));
    assert_volume(volume_of(&manager, RAIN), 0.35);
}

#[test]
fn test_settle_stops_abandoned_incoming_track() {
    let backend = HeadlessBackend::new();
    let mut manager = manager_with(&backend).with_fade_settings(FadeSettings {
        preempt: PreemptPolicy::Settle,
        ..FadeSettings::default()
    });
    assert!(manager
        .register_multiple([catalog_entry(RAIN), catalog_entry(WIND), catalog_entry(OCEAN)])
        .is_empty());
    manager.play(RAIN).unwrap();
    manager.fade(RAIN, WIND, ms(600)).unwrap();
    manager.advance(ms(300));

    manager.fade(RAIN, OCEAN, ms(600)).unwrap();

    let wind = manager.state(WIND).unwrap();
    assert!(!wind.is_playing);
    assert_eq!(wind.current_time, Duration::ZERO);
    assert_volume(wind.volume, 0.7);

    // The shared endpoint starts the new fade from its full volume
    assert!(manager.is_playing(RAIN));
    assert_volume(volume_of(&manager, RAIN), 0.7);
    assert_eq!(manager.currently_playing(), Some(OCEAN));

    manager.advance(ms(600));
    assert!(!manager.is_playing(RAIN));
    assert!(!manager.is_playing(WIND));
    assert!(manager.is_playing(OCEAN));
}
