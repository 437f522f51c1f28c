//! # moodlink-llm: Dialogue Generation for Moodlink
//!
//! Turns a [`DialogueRequestContext`] (who is speaking, what the player is
//! doing, how the player looks) into one short NPC line.
//!
//! Two modes, fixed at initialisation:
//!   - **Online**: an OpenAI-compatible chat endpoint, one bounded request per line
//!   - **Offline**: a static rule table keyed by character and emotion
//!
//! Generation never fails from the caller's point of view. Every error is
//! absorbed into [`GenerationOutcome::Fallback`], which still carries a line.
//!
//! ```text
//! initialize(credentials) ──► DialogueMode ─┬─ Online  ──► prompt ──► ChatClient ──┐
//!                                           │                                      ├──► GenerationOutcome
//!                                           └─ Offline ──► fallback table ─────────┘
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod credentials;
pub mod dialogue;
pub mod error;
pub mod fallback;
pub mod prompt;
pub mod types;

pub use client::ChatClient;
pub use credentials::Credentials;
pub use dialogue::DialogueGenerator;
pub use error::LlmError;
pub use types::{DialogueMode, DialogueRequestContext, FallbackReason, GenerationOutcome};
