//! Synchronous access to dialogue generation for the foreground loop.
//!
//! The game loop is not async. [`BlockingDialogueClient`] owns a
//! current-thread tokio runtime and drives the generator to completion on
//! the calling thread. Each call is bounded by the request timeout, and it
//! only happens when a dialogue starts.

use std::path::Path;

use moodlink_core::config::DialogueConfig;
use moodlink_llm::{DialogueGenerator, DialogueMode, DialogueRequestContext, GenerationOutcome};
use tokio::runtime::{Builder, Runtime};

/// Anything that can turn a request context into one line of dialogue.
pub trait DialogueSource {
    /// Produce a line. Must not fail and should not return blank text.
    fn generate_line(&self, ctx: &DialogueRequestContext) -> String;

    /// Mode the source operates in.
    fn mode(&self) -> DialogueMode {
        DialogueMode::Offline
    }
}

/// Line used when generation is bypassed, keyed by character id.
#[must_use]
pub fn static_fallback(character_id: &str) -> &'static str {
    match character_id {
        "trader" => {
            "Welcome, friend! I have many fine goods for a hardworking farmer like you. Let's see what you need."
        }
        _ => "Hello there! Nice day for farming.",
    }
}

/// Blocking wrapper around [`DialogueGenerator`].
///
/// Must not be used from inside another tokio runtime.
#[derive(Debug)]
pub struct BlockingDialogueClient {
    runtime: Runtime,
    generator: DialogueGenerator,
}

impl BlockingDialogueClient {
    /// Load credentials from `credentials_path` and initialize the generator.
    ///
    /// # Errors
    /// Returns an error only if the local runtime cannot be created. Credential
    /// and connectivity problems resolve to Offline mode instead.
    pub fn initialize(credentials_path: &Path, settings: DialogueConfig) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let generator = runtime.block_on(DialogueGenerator::initialize_from_file(credentials_path, settings));
        Ok(Self { runtime, generator })
    }

    /// Wrap an already-initialized generator.
    ///
    /// # Errors
    /// Returns an error if the local runtime cannot be created.
    pub fn from_generator(generator: DialogueGenerator) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self { runtime, generator })
    }

    /// Generate with full outcome details.
    pub fn generate(&self, ctx: &DialogueRequestContext) -> GenerationOutcome {
        self.runtime.block_on(self.generator.generate(ctx))
    }
}

impl DialogueSource for BlockingDialogueClient {
    fn generate_line(&self, ctx: &DialogueRequestContext) -> String {
        self.generate(ctx).into_text()
    }

    fn mode(&self) -> DialogueMode {
        self.generator.mode()
    }
}
