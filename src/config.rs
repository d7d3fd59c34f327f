use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio_system::{default_catalog, AudioTrackConfig, FadeSettings, TrackKey};
use crate::error::ConfigError;

const APP_DIR: &str = "Calmee";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory the `/assets/...` locators are resolved against
    pub asset_root: PathBuf,

    /// Master volume (0.0-1.0)
    pub global_volume: f32,

    pub fade: FadeSettings,

    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,

    /// Per-track volume overrides applied on top of the built-in catalog
    pub track_volumes: BTreeMap<TrackKey, f32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("public"),
            global_volume: 1.0,
            fade: FadeSettings::default(),
            log_filter: "info".to_string(),
            track_volumes: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from the platform-specific config directory.
    /// Creates default config if file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Like `load`, also reporting whether the defaults were just written
    ///
    /// For callers that set up logging from the config and report afterwards.
    pub fn load_or_create() -> Result<(Self, bool), ConfigError> {
        Self::load_or_create_at(&Self::config_path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_or_create_at(path).map(|(config, _created)| config)
    }

    pub fn load_or_create_at(path: &Path) -> Result<(Self, bool), ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            tracing::info!("Created default config at: {}", path.display());
            return Ok((config, true));
        }

        let load_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            source,
        };

        let content = fs::read_to_string(path).map_err(|e| load_failed(Box::new(e)))?;
        let config: Config = serde_json::from_str(&content).map_err(|e| load_failed(Box::new(e)))?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok((config, false))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;
        Ok(())
    }

    /// Get the config file path (in the user's config directory)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Get the config file path for display purposes
    pub fn config_path_display() -> String {
        Self::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.global_volume) {
            return Err(ConfigError::Invalid(format!(
                "global_volume {} must be within 0.0-1.0",
                self.global_volume
            )));
        }
        if let Some((key, volume)) = self
            .track_volumes
            .iter()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(ConfigError::Invalid(format!(
                "volume {} for {} must be within 0.0-1.0",
                volume, key
            )));
        }
        if self.fade.steps == 0 {
            return Err(ConfigError::Invalid("fade.steps must be at least 1".to_string()));
        }
        if self.asset_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("asset_root must not be empty".to_string()));
        }
        Ok(())
    }

    /// The built-in catalog with this config's volume overrides applied
    pub fn catalog(&self) -> Vec<AudioTrackConfig> {
        default_catalog()
            .into_iter()
            .map(|entry| match self.track_volumes.get(&entry.key) {
                Some(&volume) => entry.with_volume(volume),
                None => entry,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::PreemptPolicy;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("calmee-config-{}-{}", name, std::process::id()))
            .join(CONFIG_FILE)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.asset_root, PathBuf::from("public"));
        assert_eq!(config.global_volume, 1.0);
        assert_eq!(config.fade.steps, 60);
        assert_eq!(config.fade.default_duration_ms, 1000);
        assert_eq!(config.fade.preempt, PreemptPolicy::Leave);
        assert_eq!(config.log_filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.track_volumes.insert(TrackKey::AmbienteRain, 0.4);
        config.fade.preempt = PreemptPolicy::Settle;

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"ambiente_rain\":0.4"));
        assert!(json.contains("\"preempt\":\"settle\""));

        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"global_volume":0.5}"#).unwrap();
        assert_eq!(config.global_volume, 0.5);
        assert_eq!(config.fade, FadeSettings::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = Config {
            global_volume: 1.5,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.fade.steps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.track_volumes.insert(TrackKey::MeditDormir, -0.1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_catalog_overrides() {
        let mut config = Config::default();
        config.track_volumes.insert(TrackKey::SleepStory, 0.3);

        let catalog = config.catalog();
        let story = catalog.iter().find(|c| c.key == TrackKey::SleepStory).unwrap();
        assert_eq!(story.volume, 0.3);
        let rain = catalog.iter().find(|c| c.key == TrackKey::AmbienteRain).unwrap();
        assert_eq!(rain.volume, 0.7);
    }

    #[test]
    fn test_load_creates_default_file() {
        let path = temp_config_path("create");
        let _ = fs::remove_file(&path);

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_or_create_reports_first_run() {
        let path = temp_config_path("first-run");
        let _ = fs::remove_dir_all(path.parent().unwrap());

        let (config, created) = Config::load_or_create_at(&path).unwrap();
        assert!(created);
        assert_eq!(config, Config::default());

        let (_, created) = Config::load_or_create_at(&path).unwrap();
        assert!(!created);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = temp_config_path("invalid");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"global_volume": 2.0}"#).unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
