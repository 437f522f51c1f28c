//! Dialogue generator: mode selection plus typed fallback.

use std::path::Path;
use std::time::Duration;

use moodlink_core::config::DialogueConfig;
use tracing::{info, warn};

use crate::client::ChatClient;
use crate::credentials::Credentials;
use crate::error::LlmError;
use crate::fallback::fallback_line;
use crate::prompt::build_request;
use crate::types::{DialogueMode, DialogueRequestContext, FallbackReason, GenerationOutcome};

/// Slack on top of the request timeout before the outer bound fires.
const TIMEOUT_GRACE: Duration = Duration::from_millis(250);

/// Produces NPC lines, online when possible and from the rule table otherwise.
#[derive(Debug)]
pub struct DialogueGenerator {
    mode: DialogueMode,
    client: Option<ChatClient>,
    settings: DialogueConfig,
}

impl DialogueGenerator {
    /// A generator that never touches the network.
    #[must_use]
    pub fn offline(settings: DialogueConfig) -> Self {
        Self {
            mode: DialogueMode::Offline,
            client: None,
            settings,
        }
    }

    /// Decide the mode from `credentials`, probing the endpoint if configured.
    ///
    /// Never fails: every problem resolves to Offline.
    pub async fn initialize(credentials: Option<Credentials>, settings: DialogueConfig) -> Self {
        let Some(credentials) = credentials else {
            info!("Dialogue generator initialized in offline mode");
            return Self::offline(settings);
        };

        let client = match ChatClient::new(credentials) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Could not build dialogue client, falling back to offline mode");
                return Self::offline(settings);
            }
        };

        if settings.probe_on_initialize {
            let probe_timeout = Duration::from_millis(settings.probe_timeout_ms);
            if let Err(e) = client.probe(probe_timeout).await {
                warn!(error = %e, base_url = client.base_url(), "Dialogue service unreachable, falling back to offline mode");
                return Self::offline(settings);
            }
        }

        info!(base_url = client.base_url(), model = %settings.model, "Dialogue generator initialized with API access");
        Self {
            mode: DialogueMode::Online,
            client: Some(client),
            settings,
        }
    }

    /// Load credentials from `path` and initialize.
    pub async fn initialize_from_file(path: &Path, settings: DialogueConfig) -> Self {
        let credentials = match Credentials::load(path) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                warn!(error = %e, "Dialogue credentials unavailable");
                None
            }
        };
        Self::initialize(credentials, settings).await
    }

    /// Mode chosen at initialization.
    #[must_use]
    pub fn mode(&self) -> DialogueMode {
        self.mode
    }

    /// Settings in use.
    #[must_use]
    pub fn settings(&self) -> &DialogueConfig {
        &self.settings
    }

    /// Produce one line for `ctx`.
    ///
    /// Returns within the request timeout (plus a small grace) and always
    /// carries non-empty text. Failures fall back for this call only.
    pub async fn generate(&self, ctx: &DialogueRequestContext) -> GenerationOutcome {
        let client = match (&self.mode, &self.client) {
            (DialogueMode::Online, Some(client)) => client,
            _ => return fallback(ctx, FallbackReason::Offline),
        };

        let request = build_request(ctx, &self.settings);
        let timeout = Duration::from_millis(self.settings.request_timeout_ms);

        let result = match tokio::time::timeout(timeout + TIMEOUT_GRACE, client.complete(&request, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.settings.request_timeout_ms)),
        };

        match result {
            Ok(response) => {
                info!(
                    character = %ctx.character_name,
                    emotion = %ctx.emotion,
                    latency_ms = response.latency_ms,
                    "Generated NPC dialogue"
                );
                GenerationOutcome::Generated(response.text)
            }
            Err(e) => {
                warn!(error = %e, character = %ctx.character_name, "Dialogue generation failed, using fallback");
                fallback(ctx, reason_for(&e))
            }
        }
    }
}

fn fallback(ctx: &DialogueRequestContext, reason: FallbackReason) -> GenerationOutcome {
    GenerationOutcome::Fallback {
        text: fallback_line(ctx).to_string(),
        reason,
    }
}

fn reason_for(err: &LlmError) -> FallbackReason {
    match err {
        LlmError::Timeout(_) => FallbackReason::Timeout,
        LlmError::ParseError(_) => FallbackReason::MalformedResponse,
        LlmError::EmptyResponse => FallbackReason::EmptyResponse,
        LlmError::RequestFailed(_)
        | LlmError::Unavailable(_)
        | LlmError::Credentials(_)
        | LlmError::ConfigError(_) => FallbackReason::RequestFailed,
    }
}
