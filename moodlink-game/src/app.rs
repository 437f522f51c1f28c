//! Application wiring: settings, sensing, generation and the dialogue session.

use std::sync::Arc;

use moodlink_core::camera::CaptureBackend;
use moodlink_core::sensing::{SensingResources, SensingState, VerifiedResources};
use moodlink_core::{CameraManager, EmotionHistory, MoodlinkConfig};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::context::{build_context, NpcProfile};
use crate::generation::{BlockingDialogueClient, DialogueSource};
use crate::pagination::{DialogueLayout, TextMeasure};
use crate::session::{DialogueSession, FinishCallback};
use crate::settings::{SettingsController, SettingsStore};

/// Platform pieces the host supplies for emotion sensing.
pub struct SensingParts {
    /// Capture backends in priority order.
    pub backends: Vec<Arc<dyn CaptureBackend>>,
    /// Model loader. Runs only once the configured model files are found.
    pub resources: Arc<dyn SensingResources>,
}

/// The assembled Moodlink runtime for one game process.
pub struct MoodApp {
    settings: SettingsController,
    history: EmotionHistory,
    camera: Option<Arc<Mutex<CameraManager>>>,
    session: DialogueSession,
}

impl MoodApp {
    /// Build everything from `config` and the persisted player settings.
    ///
    /// Sensing starts only if the player enabled the camera and `sensing`
    /// parts were supplied. Remote dialogue is attempted only if the player
    /// enabled it. Neither failing stops the app from starting.
    pub fn new(config: &MoodlinkConfig, sensing: Option<SensingParts>, measure: impl TextMeasure + 'static) -> Self {
        let mut settings = SettingsController::new(SettingsStore::new(&config.settings_path));
        let history = EmotionHistory::new(config.sensing.history_capacity);

        let camera = match sensing {
            Some(parts) if settings.settings().enable_camera => {
                let resources = VerifiedResources::new(config.sensing.models.clone(), parts.resources);
                let mut manager = CameraManager::new(
                    parts.backends,
                    Arc::new(resources),
                    history.clone(),
                    config.sensing.clone(),
                    settings.settings().camera_config(),
                );
                if let Err(e) = manager.start() {
                    error!(error = %e, "Could not start emotion sensing");
                }
                let manager = Arc::new(Mutex::new(manager));
                settings.add_observer(Box::new(Arc::downgrade(&manager)));
                Some(manager)
            }
            Some(_) => {
                info!("Emotion sensing disabled in settings");
                None
            }
            None => None,
        };

        let mut session = DialogueSession::new(DialogueLayout::from(&config.layout), measure);
        if settings.settings().enable_ai_dialogue {
            match BlockingDialogueClient::initialize(&config.dialogue.credentials_path, config.dialogue.clone()) {
                Ok(client) => {
                    info!(mode = %client.mode(), "Dialogue source ready");
                    session = session.with_source(Box::new(client));
                }
                Err(e) => warn!(error = %e, "Could not create dialogue runtime, using static dialogue"),
            }
        }

        Self {
            settings,
            history,
            camera,
            session,
        }
    }

    /// Start a conversation with `npc`, using the latest detected emotion.
    pub fn interact(&mut self, npc: &NpcProfile, situation: &str, on_finish: Option<FinishCallback>) {
        let ctx = build_context(npc, situation, &self.history);
        info!(npc = %npc.name, emotion = %ctx.emotion, "Starting dialogue");
        self.session.start(&npc.id, &ctx, on_finish);
    }

    /// The dialogue session, for rendering.
    #[must_use]
    pub fn session(&self) -> &DialogueSession {
        &self.session
    }

    /// The dialogue session, for input routing.
    pub fn session_mut(&mut self) -> &mut DialogueSession {
        &mut self.session
    }

    /// Player settings.
    #[must_use]
    pub fn settings(&self) -> &SettingsController {
        &self.settings
    }

    /// Player settings, for the settings menu.
    pub fn settings_mut(&mut self) -> &mut SettingsController {
        &mut self.settings
    }

    /// The shared emotion history.
    #[must_use]
    pub fn history(&self) -> &EmotionHistory {
        &self.history
    }

    /// Sensing loop state, `None` if sensing is not running in this process.
    #[must_use]
    pub fn sensing_state(&self) -> Option<SensingState> {
        self.camera.as_ref().map(|camera| camera.lock().state())
    }

    /// Stop sensing and end any open dialogue.
    pub fn shutdown(&mut self) {
        self.session.end();
        if let Some(camera) = self.camera.take() {
            if !camera.lock().stop() {
                warn!("Emotion sensing did not stop in time");
            }
        }
        info!("Moodlink shut down");
    }
}

impl std::fmt::Debug for MoodApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MoodApp")
            .field("settings", &self.settings)
            .field("history", &self.history)
            .field("sensing", &self.sensing_state())
            .field("session", &self.session)
            .finish()
    }
}
