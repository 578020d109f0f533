use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the show.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowConfig {
    /// Value the Phase 1 countdown starts from.
    pub countdown_from: u32,
    /// Seed for the emitter RNG. `None` draws from entropy.
    pub seed: Option<u64>,
    pub timings: Timings,
    pub cues: CueSet,
    pub assets: AssetConfig,
    pub texts: Texts,
}

impl Default for ShowConfig {
    fn default() -> Self {
        Self {
            countdown_from: 5,
            seed: None,
            timings: Timings::default(),
            cues: CueSet::default(),
            assets: AssetConfig::default(),
            texts: Texts::default(),
        }
    }
}

impl ShowConfig {
    /// Parses a JSON document. Missing fields fall back to their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Every delay of the show, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub countdown_tick_ms: u64,
    pub celebration_hold_ms: u64,
    pub title_ms: u64,
    pub balloons_ms: u64,
    pub greeting_ms: u64,
    pub blackout_ms: u64,
    pub video_reveal_ms: u64,
    pub curtain_delay_ms: u64,
    pub curtain_transition_ms: u64,
    pub quote_delay_ms: u64,
    pub quote_hold_ms: u64,
    pub cue_loop_interval_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            countdown_tick_ms: 1_000,
            celebration_hold_ms: 1_000,
            title_ms: 3_000,
            balloons_ms: 3_000,
            greeting_ms: 5_000,
            blackout_ms: 1_000,
            video_reveal_ms: 1_000,
            curtain_delay_ms: 2_000,
            curtain_transition_ms: 2_000,
            quote_delay_ms: 1_000,
            quote_hold_ms: 10_000,
            cue_loop_interval_ms: 1_000,
        }
    }
}

/// Location and loudness of a single audio cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueSpec {
    pub path: String,
    pub volume: f32,
}

impl CueSpec {
    pub fn new(path: impl Into<String>, volume: f32) -> Self {
        Self {
            path: path.into(),
            volume: volume.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CueSet {
    pub countdown: CueSpec,
    pub balloon_pop: CueSpec,
    pub firework: CueSpec,
    pub celebration: CueSpec,
    pub final_celebration: CueSpec,
}

impl Default for CueSet {
    fn default() -> Self {
        Self {
            countdown: CueSpec::new("sounds/countdown.mp3", 0.5),
            balloon_pop: CueSpec::new("sounds/balloon-pop.mp3", 0.3),
            firework: CueSpec::new("sounds/firework.mp3", 0.4),
            celebration: CueSpec::new("sounds/celebration.mp3", 0.4),
            final_celebration: CueSpec::new("sounds/final-celebration.mp3", 1.0),
        }
    }
}

/// Visual assets, relative to the asset root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub photo: String,
    pub video: String,
    /// Length of the feature clip. Only the simulated player uses it.
    pub video_duration_ms: u64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            photo: "img/portrait.jpg".to_string(),
            video: "video/feature.mp4".to_string(),
            video_duration_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Texts {
    pub title: String,
    pub headline: String,
    pub quote: String,
    pub closing: String,
}

impl Default for Texts {
    fn default() -> Self {
        Self {
            title: "The Curtain Is About to Rise on an Epic Moment".to_string(),
            headline: "Happy Birthday!".to_string(),
            quote: "May your journey ahead be filled with endless possibilities and \
                    achievements. Keep shining bright, just as you always do!"
                .to_string(),
            closing: "Thank You for Watching!".to_string(),
        }
    }
}
