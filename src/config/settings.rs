//! Optional settings loaded from `~/.config/mispronounce/config.toml`.
//!
//! Every field has a default, so an absent file (or an absent table) gives the
//! stock 1920x1080, 5 second render with the Jenny neural voice.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable pointing at an alternative settings file.
pub const CONFIG_VAR: &str = "MISPRONOUNCE_CONFIG";
/// Environment variable replacing the region-derived synthesis URL.
pub const ENDPOINT_VAR: &str = "AZURE_SPEECH_ENDPOINT";
/// Environment variable selecting the synthesis voice.
pub const VOICE_VAR: &str = "AZURE_SPEECH_VOICE";
/// Environment variable with the ffmpeg binary to run.
pub const FFMPEG_VAR: &str = "FFMPEG_PATH";

/// Top-level settings file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub speech: SpeechSettings,
    pub video: VideoSettings,
}

/// Speech synthesis request settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SpeechSettings {
    /// Azure neural voice name.
    pub voice: String,
    /// Value of the `X-Microsoft-OutputFormat` header.
    pub output_format: String,
    /// Request timeout. `None` waits for the service indefinitely.
    pub timeout_secs: Option<u64>,
    /// Full synthesis URL, overriding the one derived from the region.
    pub endpoint: Option<String>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            voice: "en-US-JennyNeural".to_string(),
            output_format: "audio-24khz-96kbitrate-mono-mp3".to_string(),
            timeout_secs: None,
            endpoint: None,
        }
    }
}

/// Render settings for the captioned video.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VideoSettings {
    pub title: String,
    pub font_size: u32,
    pub font_color: String,
    pub background: String,
    pub width: u32,
    pub height: u32,
    pub duration_secs: u32,
    /// ffmpeg binary. `None` searches `PATH`.
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            title: "How to Pronounce Incorrectly".to_string(),
            font_size: 48,
            font_color: "white".to_string(),
            background: "black".to_string(),
            width: 1920,
            height: 1080,
            duration_secs: 5,
            ffmpeg_path: None,
        }
    }
}

impl Settings {
    /// Load settings from the configured path and apply environment overrides.
    ///
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let lookup = |name: &str| std::env::var(name).ok();
        let path = config_path(&lookup);

        let mut settings = Self::load_from(&path)?;
        settings.apply_overrides(&lookup);
        Ok(settings)
    }

    /// Load settings from an explicit path. A missing file gives defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Settings(format!("failed to read {}: {e}", path.display())))?;

        toml::from_str(&content)
            .map_err(|e| Error::Settings(format!("invalid TOML in {}: {e}", path.display())))
    }

    /// Apply environment overrides on top of file values.
    pub fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = non_empty(ENDPOINT_VAR) {
            self.speech.endpoint = Some(endpoint);
        }
        if let Some(voice) = non_empty(VOICE_VAR) {
            self.speech.voice = voice;
        }
        if let Some(ffmpeg) = non_empty(FFMPEG_VAR) {
            self.video.ffmpeg_path = Some(PathBuf::from(ffmpeg));
        }
    }
}

/// Return the path to the settings file.
fn config_path<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(CONFIG_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }

    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mispronounce")
        .join("config.toml")
}
