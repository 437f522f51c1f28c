//! Dialogue session: one NPC interaction from start to completion callback.
//!
//! ```text
//! Inactive ──start──► Active ──advance past last page / end──► Inactive
//!                        │
//!                        └── no pages ──► Inactive (callback fires at once)
//! ```
//!
//! While a session is active the host must route all input through
//! [`DialogueSession::handle_input`], which consumes it.

use moodlink_llm::DialogueRequestContext;
use tracing::debug;

use crate::generation::{static_fallback, DialogueSource};
use crate::pagination::{paginate, DialogueLayout, TextMeasure};

/// Called once when a session ends.
pub type FinishCallback = Box<dyn FnOnce()>;

/// Hint to show under the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuePrompt {
    /// More pages follow.
    Continue,
    /// This is the last page.
    Finish,
}

impl ContinuePrompt {
    /// Text shown to the player.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::Continue => "Press ENTER to continue...",
            Self::Finish => "Press ENTER to finish...",
        }
    }
}

/// Input delivered to an active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueInput {
    /// The designated continue key.
    Continue,
    /// Anything else. Swallowed while active.
    Other,
}

/// Paged dialogue state machine.
pub struct DialogueSession {
    active: bool,
    pages: Vec<Vec<String>>,
    page_index: usize,
    on_finish: Option<FinishCallback>,
    layout: DialogueLayout,
    measure: Box<dyn TextMeasure>,
    source: Option<Box<dyn DialogueSource>>,
}

impl DialogueSession {
    /// Create an inactive session that uses static fallbacks until a source is attached.
    #[must_use]
    pub fn new(layout: DialogueLayout, measure: impl TextMeasure + 'static) -> Self {
        Self {
            active: false,
            pages: Vec::new(),
            page_index: 0,
            on_finish: None,
            layout,
            measure: Box::new(measure),
            source: None,
        }
    }

    /// Generate lines with `source` instead of the static fallbacks.
    #[must_use]
    pub fn with_source(mut self, source: Box<dyn DialogueSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Start talking to `character_id`.
    ///
    /// An active session is ended first, firing its callback.
    pub fn start(&mut self, character_id: &str, ctx: &DialogueRequestContext, on_finish: Option<FinishCallback>) {
        let text = match &self.source {
            Some(source) => source.generate_line(ctx),
            None => static_fallback(character_id).to_string(),
        };
        self.start_with_text(&text, on_finish);
    }

    /// Start a session showing already-generated `text`.
    pub fn start_with_text(&mut self, text: &str, on_finish: Option<FinishCallback>) {
        if self.active {
            self.end();
        }

        self.active = true;
        self.page_index = 0;
        self.on_finish = on_finish;
        self.pages = paginate(text, &self.layout, self.measure.as_ref());
        debug!(pages = self.pages.len(), "Dialogue started");

        if self.pages.is_empty() {
            self.end();
        }
    }

    /// Move to the next page, ending the session after the last one.
    /// No-op when inactive.
    pub fn advance(&mut self) {
        if !self.active {
            return;
        }
        self.page_index += 1;
        if self.page_index >= self.pages.len() {
            self.end();
        }
    }

    /// End the session and fire the callback once. No-op when inactive.
    pub fn end(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.pages.clear();
        self.page_index = 0;
        debug!("Dialogue ended");
        if let Some(callback) = self.on_finish.take() {
            callback();
        }
    }

    /// Route one input event. Returns whether it was consumed.
    pub fn handle_input(&mut self, input: DialogueInput) -> bool {
        if !self.active {
            return false;
        }
        if input == DialogueInput::Continue {
            self.advance();
        }
        true
    }

    /// Whether a session is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Lines of the page on screen.
    #[must_use]
    pub fn current_page(&self) -> Option<&[String]> {
        if !self.active {
            return None;
        }
        self.pages.get(self.page_index).map(Vec::as_slice)
    }

    /// Zero-based index of the page on screen.
    #[must_use]
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Number of pages in the session.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether the page on screen is the last one.
    #[must_use]
    pub fn is_final_page(&self) -> bool {
        self.active && self.page_index + 1 == self.pages.len()
    }

    /// Continue/finish hint for the page on screen.
    #[must_use]
    pub fn prompt(&self) -> Option<ContinuePrompt> {
        if !self.active {
            None
        } else if self.is_final_page() {
            Some(ContinuePrompt::Finish)
        } else {
            Some(ContinuePrompt::Continue)
        }
    }
}

impl std::fmt::Debug for DialogueSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueSession")
            .field("active", &self.active)
            .field("page_index", &self.page_index)
            .field("page_count", &self.pages.len())
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}
