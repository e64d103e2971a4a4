//! Presentation surface
//!
//! The session renders everything the user sees through this trait: the
//! transcript, the speaking/listening indicators and page scrolling. Hosts
//! inject their own implementation; [`TerminalSurface`] is the one the
//! binary uses.

mod reveal;

use std::io::Write;

pub use reveal::TranscriptReveal;

/// Header shown when the surface opens
pub const TITLE: &str = "JJ TECH AI";

/// Text shown while the greeting is being prepared
pub const ACTIVATING_TEXT: &str = "Activando sistemas...";

/// Instruction shown when no speech input is available
pub const MANUAL_CONTROLS_TEXT: &str = "Micrófono no disponible. Usa los controles manuales.";

/// Rendering target for one session
pub trait PresentationSurface: Send {
    /// Create the surface, or bring an existing one back into focus
    fn open(&mut self);

    /// Hide the surface without destroying it
    fn hide(&mut self);

    /// Replace the transcript display
    fn render(&mut self, transcript: &str);

    /// Toggle the speaking cue
    fn set_speaking_indicator(&mut self, on: bool);

    /// Toggle the listening cue
    fn set_listening_indicator(&mut self, on: bool);

    /// Scroll the host page to a named section
    fn scroll_to_section(&mut self, section_id: &str);

    /// Show the static manual-controls instruction
    fn show_instruction(&mut self, text: &str);
}

/// Wrap a user transcript so it reads as the user's speech
#[must_use]
pub fn quote_user(transcript: &str) -> String {
    format!("\u{201c}{transcript}\u{201d}")
}

/// Line-oriented surface for terminals
///
/// Reveal steps rewrite the current line with a carriage return; any
/// other update finishes the line first.
pub struct TerminalSurface<W: Write + Send> {
    out: W,
    visible: bool,
    line_open: bool,
}

impl TerminalSurface<std::io::Stdout> {
    /// Surface writing to stdout
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalSurface<W> {
    /// Surface writing to an arbitrary sink
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self {
            out,
            visible: false,
            line_open: false,
        }
    }

    /// Consume the surface, returning the sink
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn finish_line(&mut self) {
        if self.line_open {
            let _ = writeln!(self.out);
            self.line_open = false;
        }
    }

    fn line(&mut self, text: &str) {
        self.finish_line();
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W: Write + Send> PresentationSurface for TerminalSurface<W> {
    fn open(&mut self) {
        if !self.visible {
            self.visible = true;
            self.line(&format!("== {TITLE} =="));
        }
    }

    fn hide(&mut self) {
        if self.visible {
            self.visible = false;
            self.line("== cerrado ==");
        }
    }

    fn render(&mut self, transcript: &str) {
        if !self.visible {
            return;
        }
        if let Err(e) = write!(self.out, "\r{transcript}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
        self.line_open = true;
    }

    fn set_speaking_indicator(&mut self, on: bool) {
        if on && self.visible {
            self.finish_line();
        }
    }

    fn set_listening_indicator(&mut self, on: bool) {
        if on && self.visible {
            self.line("[Escuchando...]");
        }
    }

    fn scroll_to_section(&mut self, section_id: &str) {
        if self.visible {
            self.line(&format!("-> #{section_id}"));
        }
    }

    fn show_instruction(&mut self, text: &str) {
        if self.visible {
            self.line(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(surface: TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8(surface.into_inner()).unwrap()
    }

    #[test]
    fn test_quote_user() {
        assert_eq!(quote_user("precio"), "\u{201c}precio\u{201d}");
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.open();
        surface.open();
        assert_eq!(output(surface).matches(TITLE).count(), 1);
    }

    #[test]
    fn test_hidden_surface_ignores_render() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.render("hola");
        assert!(output(surface).is_empty());
    }

    #[test]
    fn test_reveal_rewrites_line() {
        let mut surface = TerminalSurface::new(Vec::new());
        surface.open();
        surface.render("h");
        surface.render("ho");
        surface.set_listening_indicator(true);
        let out = output(surface);
        assert!(out.contains("\rh\rho\n[Escuchando...]\n"));
    }
}
