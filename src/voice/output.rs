//! Speech output adapter

use crate::Result;
use crate::session::{EventSender, SessionEvent, UtteranceId};

/// A text-to-speech capability
///
/// Implementations must send exactly one [`SessionEvent::SpeechEnded`] for
/// every successful `speak`, including when the speech is later cancelled.
pub trait Synthesizer: Send {
    /// Start speaking `text`
    ///
    /// # Errors
    ///
    /// Returns error if speech cannot be started
    fn speak(&mut self, utterance: UtteranceId, text: &str, events: EventSender) -> Result<()>;

    /// Stop the speech in progress, if any
    fn cancel(&mut self);

    /// Whether speech is currently playing
    fn is_speaking(&self) -> bool;
}

/// Session-facing wrapper around an optional [`Synthesizer`]
///
/// Without a synthesizer, or when it fails to start, speech is skipped and
/// completion is signalled immediately so the session never stalls.
pub struct SpeechOutput {
    synthesizer: Option<Box<dyn Synthesizer>>,
    events: EventSender,
}

impl SpeechOutput {
    /// Wrap a synthesizer reporting to `events`
    #[must_use]
    pub fn new(synthesizer: Option<Box<dyn Synthesizer>>, events: EventSender) -> Self {
        if synthesizer.is_none() {
            tracing::info!("speech output unavailable, using text only");
        }
        Self {
            synthesizer,
            events,
        }
    }

    /// Whether audible speech is available
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Speak `text`, replacing any speech in progress
    pub fn speak(&mut self, utterance: UtteranceId, text: &str) {
        tracing::debug!(utterance = utterance.0, text, "speaking");

        let Some(synthesizer) = self.synthesizer.as_mut() else {
            self.finished(utterance);
            return;
        };

        if synthesizer.is_speaking() {
            synthesizer.cancel();
        }

        if text.trim().is_empty() {
            self.finished(utterance);
            return;
        }

        if let Err(e) = synthesizer.speak(utterance, text, self.events.clone()) {
            tracing::warn!(error = %e, "speech synthesis failed, continuing silently");
            self.finished(utterance);
        }
    }

    /// Stop speaking; safe to call while idle
    pub fn cancel(&mut self) {
        if let Some(synthesizer) = self.synthesizer.as_mut() {
            synthesizer.cancel();
        }
    }

    /// Whether speech is currently playing
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.synthesizer.as_ref().is_some_and(|s| s.is_speaking())
    }

    fn finished(&self, utterance: UtteranceId) {
        let _ = self.events.send(SessionEvent::SpeechEnded(utterance));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session;

    struct Broken;

    impl Synthesizer for Broken {
        fn speak(&mut self, _: UtteranceId, _: &str, _: EventSender) -> Result<()> {
            Err(crate::Error::Tts("no voice".to_string()))
        }

        fn cancel(&mut self) {}

        fn is_speaking(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_unavailable_output_completes_immediately() {
        let (tx, mut rx) = session::channel();
        let mut output = SpeechOutput::new(None, tx);
        assert!(!output.is_available());

        output.speak(UtteranceId(7), "hola");
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::SpeechEnded(UtteranceId(7)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failed_synthesis_completes_immediately() {
        let (tx, mut rx) = session::channel();
        let mut output = SpeechOutput::new(Some(Box::new(Broken)), tx);

        output.speak(UtteranceId(1), "hola");
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::SpeechEnded(UtteranceId(1)));
    }

    #[test]
    fn test_cancel_without_synthesizer() {
        let (tx, _rx) = session::channel();
        let mut output = SpeechOutput::new(None, tx);
        output.cancel();
        assert!(!output.is_speaking());
    }
}
