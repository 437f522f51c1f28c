//! Persisted player settings and the components that react to them.
//!
//! Settings live in a small JSON file. Components that must react to a change
//! are handed to the [`SettingsController`] as observers when it is built, so
//! nothing looks up "the current level" or "the current camera" globally.
//!
//! Volume changes apply immediately. Camera changes are delivered as a new
//! [`CameraConfig`] and take effect through a sensing restart.

use std::path::{Path, PathBuf};
use std::sync::Weak;

use moodlink_core::camera::CameraInfo;
use moodlink_core::error::{MoodError, Result};
use moodlink_core::{CameraConfig, CameraManager};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

/// Player settings as stored on disk. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Master volume, 0.0 to 1.0.
    pub master_volume: f32,
    /// Music volume, 0.0 to 1.0.
    pub music_volume: f32,
    /// Sound effect volume, 0.0 to 1.0.
    pub sfx_volume: f32,
    /// Selected camera device.
    pub camera_index: u32,
    /// Run emotion sensing at all.
    pub enable_camera: bool,
    /// Use the remote dialogue service.
    pub enable_ai_dialogue: bool,
    /// Show the camera debug preview.
    pub camera_preview: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            music_volume: 0.7,
            sfx_volume: 0.8,
            camera_index: 0,
            enable_camera: true,
            enable_ai_dialogue: true,
            camera_preview: false,
        }
    }
}

impl GameSettings {
    /// Camera configuration derived from these settings.
    #[must_use]
    pub fn camera_config(&self) -> CameraConfig {
        CameraConfig {
            device_index: self.camera_index,
            preview_enabled: self.camera_preview,
        }
    }

    /// Volume value for `kind`.
    #[must_use]
    pub fn volume(&self, kind: VolumeKind) -> f32 {
        match kind {
            VolumeKind::Master => self.master_volume,
            VolumeKind::Music => self.music_volume,
            VolumeKind::Sfx => self.sfx_volume,
        }
    }

    fn volume_mut(&mut self, kind: VolumeKind) -> &mut f32 {
        match kind {
            VolumeKind::Master => &mut self.master_volume,
            VolumeKind::Music => &mut self.music_volume,
            VolumeKind::Sfx => &mut self.sfx_volume,
        }
    }
}

/// Which volume slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeKind {
    /// Overall volume.
    Master,
    /// Background music.
    Music,
    /// Sound effects.
    Sfx,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// JSON file holding [`GameSettings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings. A missing or malformed file yields defaults.
    #[must_use]
    pub fn load(&self) -> GameSettings {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return GameSettings::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not read settings, using defaults");
                return GameSettings::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Malformed settings file, using defaults");
            GameSettings::default()
        })
    }

    /// Write settings as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, settings: &GameSettings) -> Result<()> {
        let json = serde_json::to_string_pretty(settings).map_err(|e| MoodError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Observers
// ---------------------------------------------------------------------------

/// A component that reacts to settings changes.
pub trait SettingsObserver {
    /// The camera selection or preview flag changed.
    fn camera_changed(&self, _config: CameraConfig) {}

    /// A volume changed. Applies immediately.
    fn volume_changed(&self, _kind: VolumeKind, _value: f32) {}
}

/// Held weakly, so a shut-down camera manager is not restarted.
impl SettingsObserver for Weak<Mutex<CameraManager>> {
    fn camera_changed(&self, config: CameraConfig) {
        let Some(camera) = self.upgrade() else { return };
        if let Err(e) = camera.lock().restart(config) {
            warn!(error = %e, "Could not restart emotion sensing");
        }
    }
}

/// Owns the current settings and pushes changes to its observers.
pub struct SettingsController {
    store: SettingsStore,
    settings: GameSettings,
    observers: Vec<Box<dyn SettingsObserver>>,
}

impl SettingsController {
    /// Load settings from `store`.
    #[must_use]
    pub fn new(store: SettingsStore) -> Self {
        let settings = store.load();
        Self {
            store,
            settings,
            observers: Vec::new(),
        }
    }

    /// Register an observer.
    pub fn add_observer(&mut self, observer: Box<dyn SettingsObserver>) {
        self.observers.push(observer);
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Select a camera. Persists and notifies only if the index changed.
    pub fn set_camera_index(&mut self, index: u32) -> bool {
        if self.settings.camera_index == index {
            return false;
        }
        info!(from = self.settings.camera_index, to = index, "Camera selection changed");
        self.settings.camera_index = index;
        self.persist();
        let config = self.settings.camera_config();
        for observer in &self.observers {
            observer.camera_changed(config);
        }
        true
    }

    /// Step through `cameras` with wrap-around, starting from the current selection.
    ///
    /// Returns the newly selected index, or `None` if nothing changed.
    pub fn cycle_camera(&mut self, step: i32, cameras: &[CameraInfo]) -> Option<u32> {
        if cameras.is_empty() {
            return None;
        }
        let len = i64::try_from(cameras.len()).ok()?;
        let current = cameras
            .iter()
            .position(|c| c.index == self.settings.camera_index)
            .unwrap_or(0);
        let next = (i64::try_from(current).ok()? + i64::from(step)).rem_euclid(len);
        let index = cameras[usize::try_from(next).ok()?].index;
        self.set_camera_index(index).then_some(index)
    }

    /// Toggle the debug preview. Delivered as a camera change.
    pub fn set_camera_preview(&mut self, enabled: bool) {
        if self.settings.camera_preview == enabled {
            return;
        }
        self.settings.camera_preview = enabled;
        self.persist();
        let config = self.settings.camera_config();
        for observer in &self.observers {
            observer.camera_changed(config);
        }
    }

    /// Set a volume from a 0 to 100 percentage. Applies immediately.
    pub fn set_volume_percentage(&mut self, kind: VolumeKind, percentage: u8) {
        let value = f32::from(percentage.min(100)) / 100.0;
        *self.settings.volume_mut(kind) = value;
        self.persist();
        for observer in &self.observers {
            observer.volume_changed(kind, value);
        }
    }

    /// Volume as a 0 to 100 percentage.
    #[must_use]
    pub fn volume_percentage(&self, kind: VolumeKind) -> u8 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pct = (self.settings.volume(kind).clamp(0.0, 1.0) * 100.0).round() as u8;
        pct
    }

    /// Enable or disable emotion sensing. Read at startup only.
    pub fn set_enable_camera(&mut self, enabled: bool) {
        self.settings.enable_camera = enabled;
        self.persist();
    }

    /// Enable or disable remote dialogue. Read at startup only.
    pub fn set_enable_ai_dialogue(&mut self, enabled: bool) {
        self.settings.enable_ai_dialogue = enabled;
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.settings) {
            warn!(path = %self.store.path().display(), error = %e, "Error saving settings");
        }
    }
}

impl std::fmt::Debug for SettingsController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsController")
            .field("store", &self.store)
            .field("settings", &self.settings)
            .field("observers", &self.observers.len())
            .finish()
    }
}
