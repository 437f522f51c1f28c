//! Offline fallback lines.
//!
//! The table is plain data scanned top to bottom; the first rule whose
//! character and condition both match wins. The last rule matches anything,
//! so a lookup always yields a non-empty line.

use moodlink_core::EmotionLabel;

use crate::types::DialogueRequestContext;

/// Which characters a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterMatch {
    /// Character name contains this text.
    NameContains(&'static str),
    /// Any character.
    Any,
}

/// What must hold about the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Player shows this emotion.
    Emotion(EmotionLabel),
    /// Situation text contains any of these keywords.
    SituationContains(&'static [&'static str]),
    /// Always true.
    Always,
}

/// One row of the fallback table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackRule {
    /// Character filter.
    pub character: CharacterMatch,
    /// Request filter.
    pub condition: Condition,
    /// Line to say.
    pub line: &'static str,
}

const PETE: CharacterMatch = CharacterMatch::NameContains("Merchant Pete");

/// Generic greeting, also the table's final catch-all.
pub const GENERIC_GREETING: &str = "Hello there! Nice to see you around the farm today.";

/// The fallback table, in priority order.
pub static FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        character: PETE,
        condition: Condition::Emotion(EmotionLabel::Happy),
        line: "I can see you're in great spirits today! That positive energy will help your crops grow beautifully. What can I get you?",
    },
    FallbackRule {
        character: PETE,
        condition: Condition::Emotion(EmotionLabel::Sad),
        line: "I notice you seem a bit down, friend. Remember, every farmer has tough days, but I've got just the things to brighten your mood!",
    },
    FallbackRule {
        character: PETE,
        condition: Condition::Emotion(EmotionLabel::Angry),
        line: "Take a deep breath, friend. Farming can be frustrating sometimes, but you're doing better than you think. Let me help you out.",
    },
    FallbackRule {
        character: PETE,
        condition: Condition::Emotion(EmotionLabel::Surprised),
        line: "You look amazed! There's always something wonderful to discover in farming. I've got some interesting items you might like!",
    },
    FallbackRule {
        character: PETE,
        condition: Condition::Emotion(EmotionLabel::Fearful),
        line: "Don't worry, you're safe here with me. Farming can feel overwhelming at first, but I'll help you get what you need.",
    },
    FallbackRule {
        character: PETE,
        condition: Condition::SituationContains(&["rich"]),
        line: "Welcome back, esteemed farmer! Your success is impressive. I have some premium items that might interest you.",
    },
    FallbackRule {
        character: PETE,
        condition: Condition::SituationContains(&["new", "starting"]),
        line: "Hello there! New to farming? Don't worry, I've got just the tools and seeds to get you started on your adventure!",
    },
    FallbackRule {
        character: PETE,
        condition: Condition::Always,
        line: "Welcome! It's a fine day for farming, isn't it? Let me know if you need anything.",
    },
    FallbackRule {
        character: CharacterMatch::Any,
        condition: Condition::Emotion(EmotionLabel::Happy),
        line: "I can see you're having a great day! How wonderful!",
    },
    FallbackRule {
        character: CharacterMatch::Any,
        condition: Condition::Emotion(EmotionLabel::Sad),
        line: "You seem a bit down, friend. I hope things look up soon!",
    },
    FallbackRule {
        character: CharacterMatch::Any,
        condition: Condition::Always,
        line: GENERIC_GREETING,
    },
];

impl FallbackRule {
    /// Whether this rule applies to `ctx`.
    #[must_use]
    pub fn matches(&self, ctx: &DialogueRequestContext) -> bool {
        let character = match self.character {
            CharacterMatch::NameContains(needle) => ctx.character_name.contains(needle),
            CharacterMatch::Any => true,
        };
        character
            && match self.condition {
                Condition::Emotion(emotion) => ctx.emotion == emotion,
                Condition::SituationContains(keywords) => {
                    keywords.iter().any(|k| ctx.situation.contains(k))
                }
                Condition::Always => true,
            }
    }
}

/// Pick the fallback line for `ctx`. Pure and never empty.
#[must_use]
pub fn fallback_line(ctx: &DialogueRequestContext) -> &'static str {
    FALLBACK_RULES
        .iter()
        .find(|rule| rule.matches(ctx))
        .map_or(GENERIC_GREETING, |rule| rule.line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pete(situation: &str, emotion: EmotionLabel) -> DialogueRequestContext {
        DialogueRequestContext::new("Merchant Pete", "friendly trader", situation, emotion)
    }

    #[test]
    fn emotion_beats_situation_keywords() {
        let line = fallback_line(&pete("player is rich", EmotionLabel::Angry));
        assert!(line.starts_with("Take a deep breath"));
    }

    #[test]
    fn keywords_apply_for_neutral_player() {
        assert!(fallback_line(&pete("player is rich", EmotionLabel::Neutral)).contains("esteemed farmer"));
        assert!(fallback_line(&pete("player is just starting out", EmotionLabel::Neutral)).contains("New to farming"));
        assert!(fallback_line(&pete("steady progress", EmotionLabel::Neutral)).starts_with("Welcome!"));
    }

    #[test]
    fn other_characters_get_generic_lines() {
        let ctx = DialogueRequestContext::new("Farmer Joe", "neighbour", "player is rich", EmotionLabel::Fearful);
        assert_eq!(fallback_line(&ctx), GENERIC_GREETING);
        let ctx = DialogueRequestContext::new("Farmer Joe", "neighbour", "", EmotionLabel::Happy);
        assert!(fallback_line(&ctx).contains("great day"));
    }

    #[test]
    fn table_ends_with_a_catch_all() {
        let last = FALLBACK_RULES.last().expect("non-empty table");
        assert_eq!(last.character, CharacterMatch::Any);
        assert_eq!(last.condition, Condition::Always);
        assert!(FALLBACK_RULES.iter().all(|rule| !rule.line.trim().is_empty()));
    }
}
