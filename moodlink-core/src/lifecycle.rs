//! Camera lifecycle manager. Starts, stops and hot-restarts the sensing loop.
//!
//! Camera configuration is read only when a loop starts. Changing the
//! selected device therefore needs an explicit [`CameraManager::restart`],
//! which stops the old loop with a bounded wait and starts a fresh one.
//! A loop that does not stop in time is detached: its last few labels may
//! still land in the history, where they simply age out.

use std::sync::Arc;

use tracing::{info, warn};

use crate::camera::CaptureBackend;
use crate::config::SensingConfig;
use crate::error::Result;
use crate::history::EmotionHistory;
use crate::sensing::{PreviewSink, SensingContext, SensingLoop, SensingResources, SensingState};
use crate::types::CameraConfig;

/// Builds a fresh preview sink for each loop start.
pub type PreviewFactory = Box<dyn Fn() -> Box<dyn PreviewSink> + Send + Sync>;

/// How a restart went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// The old loop (if any) stopped within the timeout.
    Clean,
    /// The old loop was still running at the deadline and was detached.
    TimedOut,
}

/// Owns the sensing loop and the configuration it was started with.
pub struct CameraManager {
    backends: Vec<Arc<dyn CaptureBackend>>,
    resources: Arc<dyn SensingResources>,
    history: EmotionHistory,
    settings: SensingConfig,
    config: CameraConfig,
    preview: Option<PreviewFactory>,
    current: Option<SensingLoop>,
}

impl CameraManager {
    /// Create a manager. Nothing runs until [`CameraManager::start`].
    #[must_use]
    pub fn new(
        backends: Vec<Arc<dyn CaptureBackend>>,
        resources: Arc<dyn SensingResources>,
        history: EmotionHistory,
        settings: SensingConfig,
        config: CameraConfig,
    ) -> Self {
        Self {
            backends,
            resources,
            history,
            settings,
            config,
            preview: None,
            current: None,
        }
    }

    /// Attach a preview sink factory, used when the camera config enables preview.
    #[must_use]
    pub fn with_preview(mut self, factory: PreviewFactory) -> Self {
        self.preview = Some(factory);
        self
    }

    /// Start a loop with the current configuration.
    ///
    /// A loop that is still alive is left alone.
    ///
    /// # Errors
    /// Returns an error only if the sensing thread could not be spawned.
    pub fn start(&mut self) -> Result<()> {
        if self.current.as_ref().is_some_and(|l| !l.is_stopped()) {
            return Ok(());
        }

        let preview = if self.config.preview_enabled {
            self.preview.as_ref().map(|factory| factory())
        } else {
            None
        };

        let sensing = SensingLoop::spawn(SensingContext {
            backends: self.backends.clone(),
            resources: Arc::clone(&self.resources),
            camera: self.config,
            settings: self.settings.clone(),
            history: self.history.clone(),
            preview,
        })?;
        info!(device_index = self.config.device_index, "Sensing loop started");
        self.current = Some(sensing);
        Ok(())
    }

    /// Stop the current loop, waiting up to the restart timeout.
    ///
    /// Returns `true` if there was nothing to stop or it stopped in time.
    pub fn stop(&mut self) -> bool {
        match self.current.take() {
            Some(sensing) => sensing.stop(self.settings.restart_timeout()),
            None => true,
        }
    }

    /// Stop the current loop and start a new one with `config`.
    ///
    /// # Errors
    /// Returns an error only if the new sensing thread could not be spawned.
    pub fn restart(&mut self, config: CameraConfig) -> Result<RestartOutcome> {
        info!(
            from = self.config.device_index,
            to = config.device_index,
            "Restarting emotion sensing with new camera settings"
        );
        let outcome = if self.stop() {
            RestartOutcome::Clean
        } else {
            warn!("Previous sensing loop still running after timeout, continuing restart");
            RestartOutcome::TimedOut
        };

        self.config = config;
        self.start()?;
        Ok(outcome)
    }

    /// State of the current loop, `Idle` if none was ever started.
    #[must_use]
    pub fn state(&self) -> SensingState {
        self.current
            .as_ref()
            .map_or(SensingState::Idle, SensingLoop::state)
    }

    /// Configuration the current (or next) loop uses.
    #[must_use]
    pub fn config(&self) -> CameraConfig {
        self.config
    }

    /// The shared emotion history this manager feeds.
    #[must_use]
    pub fn history(&self) -> &EmotionHistory {
        &self.history
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CameraManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraManager")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("backends", &self.backends.len())
            .finish()
    }
}
