//! Core types for dialogue requests and outcomes.

use std::fmt;

use moodlink_core::EmotionLabel;
use serde::{Deserialize, Serialize};

/// Everything the generator needs to produce one NPC line.
///
/// Built fresh for each interaction, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueRequestContext {
    /// Display name of the NPC, e.g. "Merchant Pete".
    pub character_name: String,
    /// Short role description, e.g. "friendly trader".
    pub character_role: String,
    /// One-sentence summary of the player's situation.
    pub situation: String,
    /// Player's detected emotion, `Neutral` when nothing was detected.
    #[serde(default)]
    pub emotion: EmotionLabel,
}

impl DialogueRequestContext {
    /// Create a request context.
    #[must_use]
    pub fn new(
        character_name: impl Into<String>,
        character_role: impl Into<String>,
        situation: impl Into<String>,
        emotion: EmotionLabel,
    ) -> Self {
        Self {
            character_name: character_name.into(),
            character_role: character_role.into(),
            situation: situation.into(),
            emotion,
        }
    }
}

/// Whether the generator talks to the remote service.
///
/// Set once at initialisation. A single failed request never changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogueMode {
    /// Credentials loaded and the service looked reachable.
    Online,
    /// Static rule table only.
    Offline,
}

impl fmt::Display for DialogueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => f.write_str("online"),
            Self::Offline => f.write_str("offline"),
        }
    }
}

/// Why a fallback line was used instead of a generated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The generator is in Offline mode.
    Offline,
    /// Transport failure or non-success HTTP status.
    RequestFailed,
    /// The request did not finish within its bound.
    Timeout,
    /// The response body could not be understood.
    MalformedResponse,
    /// The service answered with blank text.
    EmptyResponse,
}

/// Result of [`crate::DialogueGenerator::generate`]. Always carries non-empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Text produced by the remote model, trimmed.
    Generated(String),
    /// Text taken from the fallback rule table.
    Fallback {
        /// The fallback line.
        text: String,
        /// What prevented generation.
        reason: FallbackReason,
    },
}

impl GenerationOutcome {
    /// The line to show, whatever its origin.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) | Self::Fallback { text, .. } => text,
        }
    }

    /// Consume the outcome, keeping only the line.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) | Self::Fallback { text, .. } => text,
        }
    }

    /// Whether the fallback table was used.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// The fallback reason, if any.
    #[must_use]
    pub fn fallback_reason(&self) -> Option<FallbackReason> {
        match self {
            Self::Generated(_) => None,
            Self::Fallback { reason, .. } => Some(*reason),
        }
    }
}

/// One chat completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Remote model name.
    pub model: String,
    /// System instruction.
    pub system: String,
    /// Assembled user prompt.
    pub user: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A successful chat completion.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The generated text, trimmed.
    pub text: String,
    /// Completion tokens reported by the service, 0 if absent.
    pub tokens_generated: u32,
    /// Latency in milliseconds.
    pub latency_ms: u64,
    /// Model that answered.
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_text_is_the_same_for_both_variants() {
        let generated = GenerationOutcome::Generated("Hi there".into());
        let fallback = GenerationOutcome::Fallback {
            text: "Hi there".into(),
            reason: FallbackReason::Timeout,
        };
        assert_eq!(generated.text(), fallback.text());
        assert!(!generated.is_fallback());
        assert_eq!(fallback.fallback_reason(), Some(FallbackReason::Timeout));
        assert_eq!(fallback.into_text(), "Hi there");
    }

    #[test]
    fn context_emotion_defaults_to_neutral() {
        let ctx: DialogueRequestContext = serde_json::from_str(
            r#"{"character_name":"Merchant Pete","character_role":"friendly trader","situation":"x"}"#,
        )
        .expect("parse");
        assert_eq!(ctx.emotion, EmotionLabel::Neutral);
    }
}
