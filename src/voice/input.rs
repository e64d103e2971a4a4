//! Speech input adapter

use thiserror::Error;

use crate::Result;
use crate::session::{EventSender, ListenId, SessionEvent};

/// Why a listen attempt produced no transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// Nothing was said before the capability gave up
    #[error("no-speech")]
    NoSpeech,
    /// Listening was stopped before a result
    #[error("aborted")]
    Aborted,
    /// Microphone could not be opened or read
    #[error("audio-capture")]
    AudioCapture,
    /// Recognition service unreachable
    #[error("network")]
    Network,
    /// User denied microphone access
    #[error("not-allowed")]
    NotAllowed,
    /// Recognition service refused the request
    #[error("service-not-allowed")]
    ServiceNotAllowed,
    /// Locale not supported by the recognizer
    #[error("language-not-supported")]
    LanguageNotSupported,
}

impl RecognitionError {
    /// Wire-style error code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::Aborted => "aborted",
            Self::AudioCapture => "audio-capture",
            Self::Network => "network",
            Self::NotAllowed => "not-allowed",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::LanguageNotSupported => "language-not-supported",
        }
    }

    /// Parse an error code
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "no-speech" => Some(Self::NoSpeech),
            "aborted" => Some(Self::Aborted),
            "audio-capture" => Some(Self::AudioCapture),
            "network" => Some(Self::Network),
            "not-allowed" => Some(Self::NotAllowed),
            "service-not-allowed" => Some(Self::ServiceNotAllowed),
            "language-not-supported" => Some(Self::LanguageNotSupported),
            _ => None,
        }
    }

    /// Whether asking the user again can help
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::NoSpeech | Self::Network)
    }
}

/// A speech-to-text capability
///
/// Implementations listen for a single utterance per `start` and report
/// exactly one [`SessionEvent::Recognized`] or
/// [`SessionEvent::RecognitionFailed`] for it.
pub trait Recognizer: Send {
    /// Begin a one-shot recognition
    ///
    /// # Errors
    ///
    /// Returns error if recognition cannot be started
    fn start(&mut self, listen: ListenId, events: EventSender) -> Result<()>;

    /// Stop the recognition in progress, if any
    fn stop(&mut self);
}

/// Session-facing wrapper around a [`Recognizer`]
pub struct SpeechInput {
    recognizer: Box<dyn Recognizer>,
    events: EventSender,
    active: Option<ListenId>,
}

impl SpeechInput {
    /// Wrap a recognizer reporting to `events`
    #[must_use]
    pub fn new(recognizer: Box<dyn Recognizer>, events: EventSender) -> Self {
        Self {
            recognizer,
            events,
            active: None,
        }
    }

    /// Listen for one utterance
    ///
    /// A recognizer that fails to start is reported as an
    /// `audio-capture` failure for this listen.
    pub fn listen(&mut self, listen: ListenId) {
        if self.active.is_some() {
            self.recognizer.stop();
        }
        self.active = Some(listen);

        tracing::debug!(listen = listen.0, "listening");
        if let Err(e) = self.recognizer.start(listen, self.events.clone()) {
            tracing::warn!(error = %e, "failed to start speech recognition");
            let _ = self.events.send(SessionEvent::RecognitionFailed {
                listen,
                error: RecognitionError::AudioCapture,
            });
        }
    }

    /// Stop listening; safe to call while idle
    pub fn stop(&mut self) {
        if let Some(listen) = self.active.take() {
            tracing::debug!(listen = listen.0, "stopping recognition");
            self.recognizer.stop();
        }
    }
}
