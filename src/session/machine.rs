//! Session state machine
//!
//! A single state variable plus one transition function. The machine is
//! pure: it decides what should happen and returns [`Action`]s, the
//! [`Session`](super::Session) carries them out against the adapters and
//! the surface.

use std::fmt;

use crate::intent::{self, SideEffect, Utterance};
use crate::voice::RecognitionError;
use crate::{Error, Result};

use super::event::{ListenId, SessionEvent, UtteranceId};

/// Line spoken when a session is activated
pub const GREETING: &str =
    "¡Hola! Soy tu asistente inteligente. ¿Listo para agendar una demo y digitalizar tu negocio?";

/// Line spoken after a transient recognition failure
pub const REPROMPT: &str = "No te escuché bien. ¿Puedes repetirlo?";

/// Lifecycle state of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Never activated
    Idle,
    /// Surface opening, greeting about to be spoken
    Activating,
    /// Speech output in progress
    Speaking { utterance: UtteranceId },
    /// Speech input in progress
    Listening { listen: ListenId },
    /// Transcript shown, waiting for the echo delay before answering
    Routing { transcript: String },
    /// Open but idle, waiting for manual activation
    Waiting,
    /// Closed by the user
    Closed,
}

impl SessionState {
    /// Short name for logs and transition errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Activating => "activating",
            Self::Speaking { .. } => "speaking",
            Self::Listening { .. } => "listening",
            Self::Routing { .. } => "routing",
            Self::Waiting => "waiting",
            Self::Closed => "closed",
        }
    }

    /// Whether the session surface is open
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Work the session must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open or focus the surface
    OpenSurface,
    /// Hide the surface
    HideSurface,
    /// Stop any speech in progress
    CancelSpeech,
    /// Stop any listening in progress
    StopListening,
    /// Start speaking a line
    Speak { utterance: UtteranceId, text: String },
    /// Start listening for one utterance
    Listen { listen: ListenId },
    /// Show the user's transcript
    EchoUser(String),
    /// Scroll the host page
    ScrollTo(&'static str),
}

/// Transition table for one session
#[derive(Debug)]
pub struct SessionMachine {
    state: SessionState,
    input_available: bool,
    recognition_retries: u32,
    failures: u32,
    last_utterance: u64,
    last_listen: u64,
}

impl SessionMachine {
    /// Create a machine in the `Idle` state
    #[must_use]
    pub const fn new(input_available: bool, recognition_retries: u32) -> Self {
        Self {
            state: SessionState::Idle,
            input_available,
            recognition_retries,
            failures: 0,
            last_utterance: 0,
            last_listen: 0,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether a listen will follow each speech end
    #[must_use]
    pub const fn input_available(&self) -> bool {
        self.input_available
    }

    /// Apply an event, returning the actions it requires
    ///
    /// Completion events carrying an id that is no longer current are
    /// ignored and produce no actions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalTransition`] if the event cannot occur in the
    /// current state. The state is left unchanged.
    pub fn step(&mut self, event: SessionEvent) -> Result<Vec<Action>> {
        let event_name = event.name();
        let from = self.state.name();

        let actions = match event {
            SessionEvent::Activate => self.activate(),
            SessionEvent::Close => self.close(),
            SessionEvent::SpeechEnded(utterance) => self.speech_ended(utterance)?,
            SessionEvent::Recognized { listen, transcript } => {
                self.recognized(listen, transcript)?
            }
            SessionEvent::RecognitionFailed { listen, error } => {
                self.recognition_failed(listen, &error)?
            }
            SessionEvent::RouteDue => self.route_due()?,
            SessionEvent::RevealTick => Vec::new(),
        };

        if from != self.state.name() {
            tracing::debug!(from, to = self.state.name(), event = event_name, "session transition");
        }

        Ok(actions)
    }

    fn activate(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        match self.state {
            SessionState::Listening { .. } => actions.push(Action::StopListening),
            SessionState::Speaking { .. } => actions.push(Action::CancelSpeech),
            _ => {}
        }

        self.state = SessionState::Activating;
        self.failures = 0;
        actions.push(Action::OpenSurface);
        actions.push(self.speak(GREETING));
        actions
    }

    fn close(&mut self) -> Vec<Action> {
        if !self.state.is_active() {
            return Vec::new();
        }

        self.state = SessionState::Closed;
        vec![
            Action::CancelSpeech,
            Action::StopListening,
            Action::HideSurface,
        ]
    }

    fn speech_ended(&mut self, utterance: UtteranceId) -> Result<Vec<Action>> {
        match self.state {
            SessionState::Speaking { utterance: current } if current == utterance => {
                if self.input_available {
                    Ok(vec![self.listen()])
                } else {
                    self.state = SessionState::Waiting;
                    Ok(Vec::new())
                }
            }
            _ if utterance.0 <= self.last_utterance => {
                tracing::debug!(utterance = utterance.0, state = %self.state, "ignoring stale speech end");
                Ok(Vec::new())
            }
            _ => Err(self.illegal("speech_ended")),
        }
    }

    fn recognized(&mut self, listen: ListenId, transcript: String) -> Result<Vec<Action>> {
        match self.state {
            SessionState::Listening { listen: current } if current == listen => {
                tracing::info!(transcript = %transcript, "user said");
                self.failures = 0;
                let echo = Action::EchoUser(transcript.clone());
                self.state = SessionState::Routing { transcript };
                Ok(vec![echo])
            }
            _ if listen.0 <= self.last_listen => {
                tracing::debug!(listen = listen.0, state = %self.state, "ignoring stale transcript");
                Ok(Vec::new())
            }
            _ => Err(self.illegal("recognized")),
        }
    }

    fn recognition_failed(
        &mut self,
        listen: ListenId,
        error: &RecognitionError,
    ) -> Result<Vec<Action>> {
        match self.state {
            SessionState::Listening { listen: current } if current == listen => {
                tracing::warn!(code = error.code(), "speech recognition error");
                if error.is_transient() && self.failures < self.recognition_retries {
                    self.failures += 1;
                    Ok(vec![self.speak(REPROMPT)])
                } else {
                    self.failures = 0;
                    self.state = SessionState::Waiting;
                    Ok(Vec::new())
                }
            }
            _ if listen.0 <= self.last_listen => {
                tracing::debug!(listen = listen.0, code = error.code(), "ignoring stale recognition error");
                Ok(Vec::new())
            }
            _ => Err(self.illegal("recognition_failed")),
        }
    }

    fn route_due(&mut self) -> Result<Vec<Action>> {
        let SessionState::Routing { transcript } = &self.state else {
            return Err(self.illegal("route_due"));
        };

        let routed = intent::route(&Utterance::new(transcript.as_str()));
        tracing::info!(category = %routed.category, "intent routed");

        let mut actions = vec![self.speak(routed.response)];
        if let Some(SideEffect::ScrollTo(section)) = routed.side_effect {
            actions.push(Action::ScrollTo(section));
        }
        Ok(actions)
    }

    fn speak(&mut self, text: &str) -> Action {
        self.last_utterance += 1;
        let utterance = UtteranceId(self.last_utterance);
        self.state = SessionState::Speaking { utterance };
        Action::Speak {
            utterance,
            text: text.to_string(),
        }
    }

    fn listen(&mut self) -> Action {
        self.last_listen += 1;
        let listen = ListenId(self.last_listen);
        self.state = SessionState::Listening { listen };
        Action::Listen { listen }
    }

    const fn illegal(&self, event: &'static str) -> Error {
        Error::IllegalTransition {
            state: self.state.name(),
            event,
        }
    }
}
