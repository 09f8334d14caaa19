use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{audio::FRAME_SIZE, PlayLinkError, Result};

/// Top-level configuration structure for an editor instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub editor: EditorConfig,
}

impl AppConfig {
    /// Parses a JSON document and validates the result.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.audio.frame_size != FRAME_SIZE {
            return Err(PlayLinkError::InvalidInput(
                "audio.frame_size must be 128 sample pairs",
            ));
        }
        if self.audio.sample_rate == 0 {
            return Err(PlayLinkError::InvalidInput(
                "audio.sample_rate must be positive",
            ));
        }
        if !(self.editor.min_syllable_time_ms >= 1.0) {
            return Err(PlayLinkError::InvalidInput(
                "editor.min_syllable_time_ms must be at least 1",
            ));
        }
        if !(self.editor.default_syllable_time_ms >= self.editor.min_syllable_time_ms) {
            return Err(PlayLinkError::InvalidInput(
                "editor.default_syllable_time_ms is below the minimum",
            ));
        }
        Ok(())
    }
}

/// Configuration specific to audio exchange with the playback sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Rate the compiled audio is assumed to run at. Uploads at any other
    /// rate trigger a drift warning.
    pub sample_rate: u32,
    pub frame_size: usize,
    pub short_override: ShortOverridePolicy,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            frame_size: FRAME_SIZE,
            short_override: ShortOverridePolicy::Keep,
        }
    }
}

/// What to do when an uploaded clip is shorter than the compiled audio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortOverridePolicy {
    /// Publish the short clip unmodified and log a warning.
    #[default]
    Keep,
    /// Extend the clip with silent frames up to the target length.
    PadWithSilence,
}

/// Editor-facing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub default_syllable_time_ms: f64,
    pub min_syllable_time_ms: f64,
    pub initial_source: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_syllable_time_ms: 200.0,
            min_syllable_time_ms: 1.0,
            initial_source: String::new(),
        }
    }
}
