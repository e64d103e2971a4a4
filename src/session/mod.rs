//! Voice session loop
//!
//! A [`Session`] owns the state machine, both speech adapters and the
//! presentation surface. Every input (user controls, adapter completions,
//! timers) arrives as a [`SessionEvent`]; the machine decides what happens
//! and the session carries it out.

mod event;
mod machine;
mod runtime;

pub use event::{EventReceiver, EventSender, ListenId, SessionEvent, UtteranceId, channel};
pub use machine::{Action, GREETING, REPROMPT, SessionMachine, SessionState};
pub use runtime::{SessionHandle, SessionRuntime};

use crate::Result;
use crate::surface::{
    ACTIVATING_TEXT, MANUAL_CONTROLS_TEXT, PresentationSurface, TranscriptReveal, quote_user,
};
use crate::voice::{SpeechInput, SpeechOutput};

/// One voice-assistant activation and everything it drives
pub struct Session {
    machine: SessionMachine,
    output: SpeechOutput,
    input: Option<SpeechInput>,
    surface: Box<dyn PresentationSurface>,
    transcript: String,
    reveal: Option<TranscriptReveal>,
    speaking_indicator: bool,
    listening_indicator: bool,
}

impl Session {
    /// Create a session
    ///
    /// `input` is `None` when no speech-input capability exists; the
    /// session then never listens and shows the manual-controls
    /// instruction instead.
    #[must_use]
    pub fn new(
        output: SpeechOutput,
        input: Option<SpeechInput>,
        surface: Box<dyn PresentationSurface>,
        recognition_retries: u32,
    ) -> Self {
        Self {
            machine: SessionMachine::new(input.is_some(), recognition_retries),
            output,
            input,
            surface,
            transcript: String::new(),
            reveal: None,
            speaking_indicator: false,
            listening_indicator: false,
        }
    }

    /// Open the session, or restart the greeting if already open
    pub fn activate(&mut self) {
        if let Err(e) = self.handle(SessionEvent::Activate) {
            tracing::error!(error = %e, "activation rejected");
        }
    }

    /// Close the session; no-op if not open
    pub fn close(&mut self) {
        if let Err(e) = self.handle(SessionEvent::Close) {
            tracing::error!(error = %e, "close rejected");
        }
    }

    /// Feed one event through the session
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::IllegalTransition`] if the event cannot occur
    /// in the current state; nothing is changed in that case.
    pub fn handle(&mut self, event: SessionEvent) -> Result<()> {
        if event == SessionEvent::RevealTick {
            self.reveal_step();
            return Ok(());
        }

        for action in self.machine.step(event)? {
            self.perform(action);
        }
        self.sync_indicators();
        Ok(())
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        self.machine.state()
    }

    /// Whether the session is open
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.machine.state().is_active()
    }

    /// Text last rendered in the transcript display
    #[must_use]
    pub fn transcript_display(&self) -> &str {
        &self.transcript
    }

    /// Whether part of the spoken text is still hidden
    #[must_use]
    pub fn reveal_pending(&self) -> bool {
        self.reveal.as_ref().is_some_and(TranscriptReveal::is_pending)
    }

    /// Whether a transcript is waiting for the echo delay
    #[must_use]
    pub const fn route_pending(&self) -> bool {
        matches!(self.machine.state(), SessionState::Routing { .. })
    }

    /// Speaking indicator as last sent to the surface
    #[must_use]
    pub const fn speaking_indicator(&self) -> bool {
        self.speaking_indicator
    }

    /// Listening indicator as last sent to the surface
    #[must_use]
    pub const fn listening_indicator(&self) -> bool {
        self.listening_indicator
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::OpenSurface => {
                self.surface.open();
                self.reveal = None;
                self.render(ACTIVATING_TEXT);
                if self.input.is_none() {
                    self.surface.show_instruction(MANUAL_CONTROLS_TEXT);
                }
            }
            Action::HideSurface => {
                self.reveal = None;
                self.surface.hide();
            }
            Action::CancelSpeech => {
                self.reveal = None;
                self.output.cancel();
            }
            Action::StopListening => {
                if let Some(input) = self.input.as_mut() {
                    input.stop();
                }
            }
            Action::Speak { utterance, text } => {
                self.reveal = Some(TranscriptReveal::new(text.as_str()));
                self.reveal_step();
                self.output.speak(utterance, &text);
            }
            Action::Listen { listen } => match self.input.as_mut() {
                Some(input) => input.listen(listen),
                None => tracing::error!(listen = listen.0, "listen requested without speech input"),
            },
            Action::EchoUser(transcript) => {
                self.reveal = None;
                self.render(&quote_user(&transcript));
            }
            Action::ScrollTo(section) => self.surface.scroll_to_section(section),
        }
    }

    fn reveal_step(&mut self) {
        let Some(prefix) = self
            .reveal
            .as_mut()
            .and_then(|r| r.step().map(ToString::to_string))
        else {
            return;
        };
        self.render(&prefix);
    }

    fn render(&mut self, text: &str) {
        self.transcript.clear();
        self.transcript.push_str(text);
        self.surface.render(text);
    }

    /// Bring the indicators in line with the state, switching off before on
    fn sync_indicators(&mut self) {
        let speaking = matches!(self.machine.state(), SessionState::Speaking { .. });
        let listening = matches!(self.machine.state(), SessionState::Listening { .. });

        if self.speaking_indicator && !speaking {
            self.speaking_indicator = false;
            self.surface.set_speaking_indicator(false);
        }
        if self.listening_indicator && !listening {
            self.listening_indicator = false;
            self.surface.set_listening_indicator(false);
        }
        if speaking && !self.speaking_indicator {
            self.speaking_indicator = true;
            self.surface.set_speaking_indicator(true);
        }
        if listening && !self.listening_indicator {
            self.listening_indicator = true;
            self.surface.set_listening_indicator(true);
        }
    }
}
