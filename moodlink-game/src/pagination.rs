//! Width-constrained wrapping and paging of dialogue text.

use moodlink_core::config::LayoutConfig;

/// Measures the rendered width of a string, in pixels.
pub trait TextMeasure {
    /// Rendered width of `text`.
    fn width(&self, text: &str) -> u32;
}

impl<F: Fn(&str) -> u32> TextMeasure for F {
    fn width(&self, text: &str) -> u32 {
        self(text)
    }
}

/// Fixed advance per character. Good enough for terminals and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monospace {
    /// Advance of one character.
    pub char_width_px: u32,
}

impl TextMeasure for Monospace {
    fn width(&self, text: &str) -> u32 {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        chars.saturating_mul(self.char_width_px)
    }
}

/// Dialogue box geometry used for pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogueLayout {
    /// Maximum rendered line width.
    pub wrap_width_px: u32,
    /// Lines per page, at least 1.
    pub lines_per_page: usize,
}

impl Default for DialogueLayout {
    fn default() -> Self {
        Self::from(&LayoutConfig::default())
    }
}

impl From<&LayoutConfig> for DialogueLayout {
    fn from(config: &LayoutConfig) -> Self {
        Self {
            wrap_width_px: config.wrap_width_px(),
            lines_per_page: config.lines_per_page.max(1),
        }
    }
}

/// Greedy word wrap.
///
/// A word joins the current line while the joined line still measures within
/// `max_width`. A single word wider than `max_width` gets a line of its own.
#[must_use]
pub fn wrap_lines(text: &str, max_width: u32, measure: &dyn TextMeasure) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure.width(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap `text` and group the lines into pages. Blank text yields no pages.
#[must_use]
pub fn paginate(text: &str, layout: &DialogueLayout, measure: &dyn TextMeasure) -> Vec<Vec<String>> {
    wrap_lines(text, layout.wrap_width_px, measure)
        .chunks(layout.lines_per_page.max(1))
        .map(<[String]>::to_vec)
        .collect()
}
