//! Configuration for the Moodlink system.
//!
//! Maps directly to `moodlink.toml`. Every field has a serde default, so an
//! empty file (or no file at all) yields a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MoodError, Result};
use crate::types::CaptureSettings;

/// Top-level Moodlink configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodlinkConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Camera and sensing loop tuning.
    #[serde(default)]
    pub sensing: SensingConfig,
    /// Dialogue generation client settings.
    #[serde(default)]
    pub dialogue: DialogueConfig,
    /// Dialogue box layout used for pagination.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Where persisted player settings live.
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
}

impl Default for MoodlinkConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            sensing: SensingConfig::default(),
            dialogue: DialogueConfig::default(),
            layout: LayoutConfig::default(),
            settings_path: default_settings_path(),
        }
    }
}

impl MoodlinkConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `MoodError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| MoodError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject values that would stall or break the runtime.
    ///
    /// # Errors
    /// Returns `MoodError::Config` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.sensing.history_capacity == 0, "sensing.history_capacity"),
            (self.sensing.inference_interval_ms == 0, "sensing.inference_interval_ms"),
            (self.sensing.restart_timeout_ms == 0, "sensing.restart_timeout_ms"),
            (self.dialogue.max_tokens == 0, "dialogue.max_tokens"),
            (self.dialogue.request_timeout_ms == 0, "dialogue.request_timeout_ms"),
            (self.layout.lines_per_page == 0, "layout.lines_per_page"),
            (
                self.layout.box_width_px <= self.layout.text_padding_px,
                "layout.box_width_px",
            ),
        ];
        for (invalid, field) in checks {
            if invalid {
                return Err(MoodError::Config(format!("{field} is out of range")));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Sensing loop cadence and capture parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensingConfig {
    /// Rolling window size of the emotion history.
    #[serde(default = "default_5_usize")]
    pub history_capacity: usize,
    /// Minimum time between two classifications.
    #[serde(default = "default_500")]
    pub inference_interval_ms: u64,
    /// Pause between frame reads (~30 Hz keeps the device alive).
    #[serde(default = "default_33")]
    pub frame_interval_ms: u64,
    /// Pause after a failed frame read.
    #[serde(default = "default_100")]
    pub read_retry_backoff_ms: u64,
    /// How long a restart waits for the old loop to stop.
    #[serde(default = "default_2000")]
    pub restart_timeout_ms: u64,
    /// Requested capture width.
    #[serde(default = "default_640")]
    pub capture_width: u32,
    /// Requested capture height.
    #[serde(default = "default_480")]
    pub capture_height: u32,
    /// Requested capture frame rate.
    #[serde(default = "default_30")]
    pub capture_fps: u32,
    /// Classifier and face-locator asset locations.
    #[serde(default)]
    pub models: ModelPaths,
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            history_capacity: 5,
            inference_interval_ms: 500,
            frame_interval_ms: 33,
            read_retry_backoff_ms: 100,
            restart_timeout_ms: 2000,
            capture_width: 640,
            capture_height: 480,
            capture_fps: 30,
            models: ModelPaths::default(),
        }
    }
}

impl SensingConfig {
    /// Minimum time between two classifications.
    #[must_use]
    pub fn inference_interval(&self) -> Duration {
        Duration::from_millis(self.inference_interval_ms)
    }

    /// Pause between frame reads.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Pause after a failed frame read.
    #[must_use]
    pub fn read_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.read_retry_backoff_ms)
    }

    /// Bounded wait used by restart and shutdown.
    #[must_use]
    pub fn restart_timeout(&self) -> Duration {
        Duration::from_millis(self.restart_timeout_ms)
    }

    /// Resolution and frame rate to request from an accepted device.
    #[must_use]
    pub fn capture(&self) -> CaptureSettings {
        CaptureSettings {
            width: self.capture_width,
            height: self.capture_height,
            fps: self.capture_fps,
        }
    }
}

/// On-disk locations of the sensing models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPaths {
    /// Emotion classifier weights.
    #[serde(default = "default_classifier_path")]
    pub classifier: PathBuf,
    /// Face locator cascade / weights.
    #[serde(default = "default_face_locator_path")]
    pub face_locator: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            classifier: default_classifier_path(),
            face_locator: default_face_locator_path(),
        }
    }
}

impl ModelPaths {
    /// Check that both model files exist.
    ///
    /// # Errors
    /// Returns `MoodError::ResourceLoad` naming the first missing file.
    pub fn verify(&self) -> Result<()> {
        for path in [&self.classifier, &self.face_locator] {
            if !path.is_file() {
                return Err(MoodError::ResourceLoad(format!(
                    "model file not found at {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Dialogue generation client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueConfig {
    /// JSON file holding `{ apiKey, baseUrl }`.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    /// Remote model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Output token cap per request.
    #[serde(default = "default_100_u32")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_0_8")]
    pub temperature: f32,
    /// Hard timeout for one generation request.
    #[serde(default = "default_5000")]
    pub request_timeout_ms: u64,
    /// Check reachability when the client initializes.
    #[serde(default = "default_true")]
    pub probe_on_initialize: bool,
    /// Timeout for the reachability check.
    #[serde(default = "default_2000")]
    pub probe_timeout_ms: u64,
    /// Per-field character cap applied when building prompts.
    #[serde(default = "default_200")]
    pub max_field_chars: usize,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            model: default_model(),
            max_tokens: 100,
            temperature: 0.8,
            request_timeout_ms: 5000,
            probe_on_initialize: true,
            probe_timeout_ms: 2000,
            max_field_chars: 200,
        }
    }
}

/// Dialogue box geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Outer width of the dialogue box.
    #[serde(default = "default_1200")]
    pub box_width_px: u32,
    /// Horizontal padding subtracted from the box width.
    #[serde(default = "default_40")]
    pub text_padding_px: u32,
    /// Lines shown per page.
    #[serde(default = "default_4")]
    pub lines_per_page: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            box_width_px: 1200,
            text_padding_px: 40,
            lines_per_page: 4,
        }
    }
}

impl LayoutConfig {
    /// Usable text width inside the box.
    #[must_use]
    pub fn wrap_width_px(&self) -> u32 {
        self.box_width_px.saturating_sub(self.text_padding_px)
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }
fn default_settings_path() -> PathBuf { PathBuf::from("settings.json") }
fn default_classifier_path() -> PathBuf { PathBuf::from("ai_materials/emotion_model.pth") }
fn default_face_locator_path() -> PathBuf { PathBuf::from("haarcascade_frontalface_default.xml") }
fn default_credentials_path() -> PathBuf { PathBuf::from("ai_materials/navigator_api_key.json") }
fn default_model() -> String { "llama-3.1-8b-instruct".to_string() }
fn default_0_8() -> f32 { 0.8 }
fn default_4() -> usize { 4 }
fn default_5_usize() -> usize { 5 }
fn default_30() -> u32 { 30 }
fn default_33() -> u64 { 33 }
fn default_40() -> u32 { 40 }
fn default_100() -> u64 { 100 }
fn default_100_u32() -> u32 { 100 }
fn default_200() -> usize { 200 }
fn default_480() -> u32 { 480 }
fn default_500() -> u64 { 500 }
fn default_640() -> u32 { 640 }
fn default_1200() -> u32 { 1200 }
fn default_2000() -> u64 { 2000 }
fn default_5000() -> u64 { 5000 }
