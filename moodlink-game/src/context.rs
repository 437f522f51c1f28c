//! Request context assembly from game state and the emotion history.

use moodlink_core::{EmotionHistory, EmotionLabel};
use moodlink_llm::DialogueRequestContext;
use serde::{Deserialize, Serialize};

/// Identity of a talking NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcProfile {
    /// Stable id used for static fallbacks.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Short role description.
    pub role: String,
}

impl NpcProfile {
    /// Create a profile.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
        }
    }

    /// The trader at the market stall.
    #[must_use]
    pub fn merchant_pete() -> Self {
        Self::new("trader", "Merchant Pete", "friendly trader")
    }
}

/// Describe the player's progress from their money.
#[must_use]
pub fn situation_for_money(money: u64) -> &'static str {
    if money > 1000 {
        "player has lots of money and is doing well farming"
    } else if money < 100 {
        "player is just starting out and has limited funds"
    } else {
        "player is making steady progress with their farm"
    }
}

/// The player's current emotion: the most recent detection, or `Neutral`.
#[must_use]
pub fn current_emotion(history: &EmotionHistory) -> EmotionLabel {
    history.latest().unwrap_or_default()
}

/// Build the generator request for talking to `npc`.
#[must_use]
pub fn build_context(npc: &NpcProfile, situation: &str, history: &EmotionHistory) -> DialogueRequestContext {
    DialogueRequestContext::new(&npc.name, &npc.role, situation, current_emotion(history))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_thresholds() {
        assert!(situation_for_money(0).contains("just starting out"));
        assert!(situation_for_money(99).contains("just starting out"));
        assert!(situation_for_money(100).contains("steady progress"));
        assert!(situation_for_money(1000).contains("steady progress"));
        assert!(situation_for_money(1001).contains("lots of money"));
    }

    #[test]
    fn empty_history_reads_as_neutral() {
        assert_eq!(current_emotion(&EmotionHistory::default()), EmotionLabel::Neutral);
    }

    #[test]
    fn context_uses_latest_emotion() {
        let history = EmotionHistory::default();
        history.push(EmotionLabel::Sad);
        history.push(EmotionLabel::Surprised);

        let ctx = build_context(&NpcProfile::merchant_pete(), situation_for_money(50), &history);
        assert_eq!(ctx.character_name, "Merchant Pete");
        assert_eq!(ctx.character_role, "friendly trader");
        assert_eq!(ctx.emotion, EmotionLabel::Surprised);
    }
}
