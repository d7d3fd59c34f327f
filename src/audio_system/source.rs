/// Track keys
///
/// The closed set of audio tracks the app knows about.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Catalog grouping, used for asset folders and defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackCategory {
    /// Looping soundscape
    Ambient,

    /// Short guided meditation clip
    Meditation,

    /// Long-form sleep story, loaded on demand
    SleepStory,
}

/// Audio track identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKey {
    AmbienteRain,
    AmbienteWind,
    AmbienteOcean,
    AmbientePiano,
    AmbienteBirds,
    AmbienteWater,
    AmbienteFireplace,
    AmbienteBowl,
    AmbienteWhitenoise,
    AmbienteUnderwater,
    MeditCrise,
    MeditDormir,
    MeditAnsiedade,
    MeditProfunda,
    MeditAmbiente,
    #[serde(rename = "medit_30s")]
    Medit30s,
    #[serde(rename = "medit_60s")]
    Medit60s,
    #[serde(rename = "medit_90s")]
    Medit90s,
    SleepStory,
}

impl TrackKey {
    /// Every key, in catalog order
    pub const ALL: [TrackKey; 19] = [
        TrackKey::AmbienteRain,
        TrackKey::AmbienteWind,
        TrackKey::AmbienteOcean,
        TrackKey::AmbientePiano,
        TrackKey::AmbienteBirds,
        TrackKey::AmbienteWater,
        TrackKey::AmbienteFireplace,
        TrackKey::AmbienteBowl,
        TrackKey::AmbienteWhitenoise,
        TrackKey::AmbienteUnderwater,
        TrackKey::MeditCrise,
        TrackKey::MeditDormir,
        TrackKey::MeditAnsiedade,
        TrackKey::MeditProfunda,
        TrackKey::MeditAmbiente,
        TrackKey::Medit30s,
        TrackKey::Medit60s,
        TrackKey::Medit90s,
        TrackKey::SleepStory,
    ];

    /// Stable identifier used in config files, asset names and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKey::AmbienteRain => "ambiente_rain",
            TrackKey::AmbienteWind => "ambiente_wind",
            TrackKey::AmbienteOcean => "ambiente_ocean",
            TrackKey::AmbientePiano => "ambiente_piano",
            TrackKey::AmbienteBirds => "ambiente_birds",
            TrackKey::AmbienteWater => "ambiente_water",
            TrackKey::AmbienteFireplace => "ambiente_fireplace",
            TrackKey::AmbienteBowl => "ambiente_bowl",
            TrackKey::AmbienteWhitenoise => "ambiente_whitenoise",
            TrackKey::AmbienteUnderwater => "ambiente_underwater",
            TrackKey::Medit30s => "medit_30s",
            TrackKey::Medit60s => "medit_60s",
            TrackKey::Medit90s => "medit_90s",
            TrackKey::MeditCrise => "medit_crise",
            TrackKey::MeditDormir => "medit_dormir",
            TrackKey::MeditAnsiedade => "medit_ansiedade",
            TrackKey::MeditProfunda => "medit_profunda",
            TrackKey::MeditAmbiente => "medit_ambiente",
            TrackKey::SleepStory => "sleep_story",
        }
    }

    /// Human-readable name for logs and menus
    pub fn display_name(&self) -> &'static str {
        match self {
            TrackKey::AmbienteRain => "Rain",
            TrackKey::AmbienteWind => "Wind",
            TrackKey::AmbienteOcean => "Ocean Waves",
            TrackKey::AmbientePiano => "Soft Piano",
            TrackKey::AmbienteBirds => "Birdsong",
            TrackKey::AmbienteWater => "Running Water",
            TrackKey::AmbienteFireplace => "Fireplace",
            TrackKey::AmbienteBowl => "Singing Bowl",
            TrackKey::AmbienteWhitenoise => "White Noise",
            TrackKey::AmbienteUnderwater => "Underwater",
            TrackKey::Medit30s => "30 Second Pause",
            TrackKey::Medit60s => "One Minute Pause",
            TrackKey::Medit90s => "90 Second Pause",
            TrackKey::MeditCrise => "Crisis Support",
            TrackKey::MeditDormir => "Falling Asleep",
            TrackKey::MeditAnsiedade => "Easing Anxiety",
            TrackKey::MeditProfunda => "Deep Meditation",
            TrackKey::MeditAmbiente => "Ambient Meditation",
            TrackKey::SleepStory => "Sleep Story",
        }
    }

    pub fn category(&self) -> TrackCategory {
        match self {
            TrackKey::AmbienteRain
            | TrackKey::AmbienteWind
            | TrackKey::AmbienteOcean
            | TrackKey::AmbientePiano
            | TrackKey::AmbienteBirds
            | TrackKey::AmbienteWater
            | TrackKey::AmbienteFireplace
            | TrackKey::AmbienteBowl
            | TrackKey::AmbienteWhitenoise
            | TrackKey::AmbienteUnderwater => TrackCategory::Ambient,
            TrackKey::SleepStory => TrackCategory::SleepStory,
            _ => TrackCategory::Meditation,
        }
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown track identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTrackKey(pub String);

impl fmt::Display for UnknownTrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown track key: {}", self.0)
    }
}

impl std::error::Error for UnknownTrackKey {}

impl FromStr for TrackKey {
    type Err = UnknownTrackKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownTrackKey(s.to_string()))
    }
}
