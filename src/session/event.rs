//! Events that drive a session

use tokio::sync::mpsc;

use crate::voice::RecognitionError;

/// Identifies one speak request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

/// Identifies one listen request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenId(pub u64);

/// Everything the session reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// User pressed the activation control
    Activate,
    /// User pressed the close control
    Close,
    /// Speech output finished (or was skipped) for an utterance
    SpeechEnded(UtteranceId),
    /// Speech input produced a final transcript
    Recognized {
        listen: ListenId,
        transcript: String,
    },
    /// Speech input failed
    RecognitionFailed {
        listen: ListenId,
        error: RecognitionError,
    },
    /// Echo delay elapsed and the pending transcript can be routed
    RouteDue,
    /// Reveal one more character of the transcript
    RevealTick,
}

impl SessionEvent {
    /// Short name for logs and transition errors
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Close => "close",
            Self::SpeechEnded(_) => "speech_ended",
            Self::Recognized { .. } => "recognized",
            Self::RecognitionFailed { .. } => "recognition_failed",
            Self::RouteDue => "route_due",
            Self::RevealTick => "reveal_tick",
        }
    }
}

/// Sending half adapters use to report back to the session
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

/// Receiving half consumed by the session runtime
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Create a session event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
