// Shared fixtures for the integration tests
#![allow(dead_code)]

use std::path::PathBuf;

use calmee_audio::audio_system::{catalog_entry, AssetResolver, HeadlessBackend};
use calmee_audio::{AudioManager, GestureGate, TrackKey};

pub const ASSET_ROOT: &str = "public";

/// A manager on the headless backend with the gesture gate already open
pub fn manager_with(backend: &HeadlessBackend) -> AudioManager {
    AudioManager::new(Box::new(backend.clone()), AssetResolver::new(ASSET_ROOT))
        .with_gate(GestureGate::opened())
}

pub fn manager() -> AudioManager {
    manager_with(&HeadlessBackend::new())
}

/// A manager with the given catalog entries registered
pub fn manager_with_tracks(keys: &[TrackKey]) -> AudioManager {
    let mut manager = manager();
    let failures = manager.register_multiple(keys.iter().map(|&k| catalog_entry(k)));
    assert!(failures.is_empty(), "registration failed: {:?}", failures);
    manager
}

/// Where the resolver puts a catalog entry's primary source
pub fn primary_path(key: TrackKey) -> PathBuf {
    AssetResolver::new(ASSET_ROOT).resolve(&catalog_entry(key).src)
}

pub fn fallback_path(key: TrackKey) -> PathBuf {
    let entry = catalog_entry(key);
    let fallback = entry.fallback_src.expect("catalog entries carry a fallback");
    AssetResolver::new(ASSET_ROOT).resolve(&fallback)
}

pub fn assert_volume(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "volume {} != expected {}",
        actual,
        expected
    );
}
