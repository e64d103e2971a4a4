//! Character-by-character transcript reveal

/// Progressive typing of a line of text
///
/// Each step exposes one more character. The pace is set by whoever drives
/// the steps and is unrelated to how long the audio takes.
#[derive(Debug, Clone)]
pub struct TranscriptReveal {
    text: String,
    shown: usize,
    total: usize,
}

impl TranscriptReveal {
    /// Start revealing `text` from an empty display
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let total = text.chars().count();
        Self {
            text,
            shown: 0,
            total,
        }
    }

    /// Advance one character and return the visible prefix
    ///
    /// Returns `None` once the full text is visible.
    pub fn step(&mut self) -> Option<&str> {
        if self.shown >= self.total {
            return None;
        }
        self.shown += 1;
        let end = self
            .text
            .char_indices()
            .nth(self.shown)
            .map_or(self.text.len(), |(i, _)| i);
        Some(&self.text[..end])
    }

    /// Whether characters remain hidden
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.shown < self.total
    }

    /// Full text being revealed
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_respects_char_boundaries() {
        let mut reveal = TranscriptReveal::new("¡Sí!");
        assert_eq!(reveal.step(), Some("¡"));
        assert_eq!(reveal.step(), Some("¡S"));
        assert_eq!(reveal.step(), Some("¡Sí"));
        assert_eq!(reveal.step(), Some("¡Sí!"));
        assert!(!reveal.is_pending());
        assert_eq!(reveal.step(), None);
    }

    #[test]
    fn test_empty_text_is_never_pending() {
        let mut reveal = TranscriptReveal::new("");
        assert!(!reveal.is_pending());
        assert_eq!(reveal.step(), None);
    }
}
