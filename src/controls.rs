//! Terminal controls
//!
//! Reads stdin for the terminal host. Command lines press the session's
//! activation and close controls; every other line is typed speech for the
//! console recognizer when that backend is in use.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::Result;
use crate::session::SessionHandle;
use crate::voice::TypedLineSender;

/// Help line printed by hosts
pub const CONTROLS_HELP: &str = ":a activar | :c cerrar | :q salir";

/// A control command typed by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Open the session or restart the greeting
    Activate,
    /// Close the session, keep the program running
    Close,
    /// Exit the program
    Quit,
}

impl Control {
    /// Parse a command line
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            ":a" | ":activate" => Some(Self::Activate),
            ":c" | ":close" => Some(Self::Close),
            ":q" | ":quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Why the control reader stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlsExit {
    /// User asked to quit
    Quit,
    /// Input reached end of file
    EndOfInput,
}

/// Line reader driving a [`SessionHandle`]
pub struct TerminalControls<R> {
    lines: Lines<R>,
    handle: SessionHandle,
    typed: Option<TypedLineSender>,
}

impl TerminalControls<BufReader<Stdin>> {
    /// Controls reading from standard input
    #[must_use]
    pub fn stdin(handle: SessionHandle, typed: Option<TypedLineSender>) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), handle, typed)
    }
}

impl<R: AsyncBufRead + Unpin> TerminalControls<R> {
    /// Controls reading from `reader`
    ///
    /// Non-command lines go to `typed` when present. Without it, a blank
    /// line activates the session.
    #[must_use]
    pub fn new(reader: R, handle: SessionHandle, typed: Option<TypedLineSender>) -> Self {
        Self {
            lines: reader.lines(),
            handle,
            typed,
        }
    }

    /// Read lines until quit or end of input
    ///
    /// # Errors
    ///
    /// Returns error if reading fails or the session runtime has stopped
    pub async fn run(mut self) -> Result<ControlsExit> {
        while let Some(line) = self.lines.next_line().await? {
            match Control::parse(&line) {
                Some(Control::Activate) => self.handle.activate()?,
                Some(Control::Close) => self.handle.close()?,
                Some(Control::Quit) => {
                    tracing::info!("quit requested");
                    return Ok(ControlsExit::Quit);
                }
                None => self.typed_line(line)?,
            }
        }
        Ok(ControlsExit::EndOfInput)
    }

    fn typed_line(&self, line: String) -> Result<()> {
        match &self.typed {
            Some(typed) => {
                if typed.send(line).is_err() {
                    tracing::debug!("console recognizer gone, dropping line");
                }
                Ok(())
            }
            None if line.trim().is_empty() => self.handle.activate(),
            None => {
                tracing::info!(help = CONTROLS_HELP, "not a control command");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{self, SessionEvent};
    use crate::voice::typed_lines;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Control::parse(" :a "), Some(Control::Activate));
        assert_eq!(Control::parse(":close"), Some(Control::Close));
        assert_eq!(Control::parse(":q"), Some(Control::Quit));
        assert_eq!(Control::parse("precio"), None);
        assert_eq!(Control::parse(""), None);
    }

    #[tokio::test]
    async fn test_commands_and_typed_speech_are_split() {
        let (events, mut rx) = session::channel();
        let (typed, mut lines) = typed_lines();
        let input = tokio_test::io::Builder::new()
            .read(b":activate\n")
            .read(b"precio\n\n")
            .read(b":c\n:q\n")
            .build();

        let controls =
            TerminalControls::new(BufReader::new(input), SessionHandle::new(events), Some(typed));
        assert_eq!(controls.run().await.unwrap(), ControlsExit::Quit);

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Activate);
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Close);
        assert!(rx.try_recv().is_err());
        assert_eq!(lines.try_recv().unwrap(), "precio");
        assert_eq!(lines.try_recv().unwrap(), "");
    }

    #[tokio::test]
    async fn test_blank_line_activates_without_console_input() {
        let (events, mut rx) = session::channel();
        let input = tokio_test::io::Builder::new().read(b"\nhola\n").build();

        let controls = TerminalControls::new(BufReader::new(input), SessionHandle::new(events), None);
        assert_eq!(controls.run().await.unwrap(), ControlsExit::EndOfInput);

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Activate);
        assert!(rx.try_recv().is_err());
    }
}
