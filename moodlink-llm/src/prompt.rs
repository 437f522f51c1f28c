//! Prompt templates for NPC dialogue.
//!
//! One system instruction, one user template, and a fixed guidance hint per
//! emotion. Every interpolated field is truncated so the prompt stays bounded
//! no matter what the game passes in.

use moodlink_core::EmotionLabel;
use moodlink_core::config::DialogueConfig;

use crate::types::{ChatRequest, DialogueRequestContext};

/// System instruction sent with every request.
pub const DIALOGUE_SYSTEM: &str = "You are a helpful NPC in a farming simulation game. \
Keep responses brief, friendly, and appropriate for all ages.";

/// User prompt template.
pub const DIALOGUE_USER: &str = r"You are {character_name}, a {character_role} in a cozy farming game.

Player context: {situation}
Player's current emotion: {emotion}
Emotional guidance: {emotion_hint}

Generate a short, friendly dialogue response (1-2 sentences) that:
1. Matches your character's role and personality.
2. Responds appropriately to the player's context and emotional state.
3. Uses the emotional guidance to tailor your response.
4. Maintains the game's wholesome, encouraging tone.

Important: Make sure your response clearly reflects awareness of the player's {emotion} emotional state.

Dialogue:";

/// Guidance hint for an emotion.
#[must_use]
pub fn emotion_guidance(emotion: EmotionLabel) -> &'static str {
    match emotion {
        EmotionLabel::Happy => {
            "The player seems cheerful and upbeat. Match their positive energy and share in their good mood."
        }
        EmotionLabel::Sad => {
            "The player appears down or disappointed. Be comforting, encouraging, and offer gentle support."
        }
        EmotionLabel::Angry => {
            "The player seems frustrated or upset. Be calming, understanding, and help them feel better."
        }
        EmotionLabel::Surprised => {
            "The player looks amazed or shocked. Share in their wonder and excitement about what's happening."
        }
        EmotionLabel::Fearful => {
            "The player appears worried or anxious. Be reassuring, supportive, and help them feel safe."
        }
        EmotionLabel::Neutral => {
            "The player seems calm and focused. Be friendly and helpful in a straightforward way."
        }
    }
}

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Keep at most `max_chars` characters, collapsing newlines to spaces.
#[must_use]
pub fn truncate_field(value: &str, max_chars: usize) -> String {
    value
        .trim()
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(max_chars)
        .collect()
}

/// Render the user prompt for a context.
#[must_use]
pub fn render_user_prompt(ctx: &DialogueRequestContext, max_field_chars: usize) -> String {
    let name = truncate_field(&ctx.character_name, max_field_chars);
    let role = truncate_field(&ctx.character_role, max_field_chars);
    let situation = truncate_field(&ctx.situation, max_field_chars);
    render_template(
        DIALOGUE_USER,
        &[
            ("character_name", &name),
            ("character_role", &role),
            ("situation", &situation),
            ("emotion", ctx.emotion.as_str()),
            ("emotion_hint", emotion_guidance(ctx.emotion)),
        ],
    )
}

/// Build the chat request for a context.
#[must_use]
pub fn build_request(ctx: &DialogueRequestContext, settings: &DialogueConfig) -> ChatRequest {
    ChatRequest {
        model: settings.model.clone(),
        system: DIALOGUE_SYSTEM.to_string(),
        user: render_user_prompt(ctx, settings.max_field_chars),
        max_tokens: settings.max_tokens,
        temperature: settings.temperature,
    }
}
