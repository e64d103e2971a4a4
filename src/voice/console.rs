//! Typed-transcript recognizer
//!
//! Treats one typed line as the final transcript of an utterance. Lines
//! arrive over a channel fed by the terminal controls, so control commands
//! never reach it. Lines typed while nobody is listening are dropped.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::Result;
use crate::session::{EventSender, ListenId, SessionEvent};

use super::input::{RecognitionError, Recognizer};

/// Sending half for typed lines
pub type TypedLineSender = mpsc::UnboundedSender<String>;

/// Receiving half consumed by [`ConsoleRecognizer`]
pub type TypedLines = mpsc::UnboundedReceiver<String>;

/// Create a typed-line channel
#[must_use]
pub fn typed_lines() -> (TypedLineSender, TypedLines) {
    mpsc::unbounded_channel()
}

/// Takes the next typed line per listen
pub struct ConsoleRecognizer {
    lines: Arc<Mutex<TypedLines>>,
    task: Option<JoinHandle<()>>,
}

impl ConsoleRecognizer {
    /// Recognizer reading from `lines`
    #[must_use]
    pub fn new(lines: TypedLines) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
            task: None,
        }
    }
}

impl Recognizer for ConsoleRecognizer {
    fn start(&mut self, listen: ListenId, events: EventSender) -> Result<()> {
        self.stop();

        let lines = Arc::clone(&self.lines);
        self.task = Some(tokio::spawn(async move {
            let mut lines = lines.lock().await;
            while let Ok(early) = lines.try_recv() {
                tracing::debug!(line = %early, "dropping line typed before listening");
            }

            let event = match lines.recv().await {
                Some(line) if !line.trim().is_empty() => SessionEvent::Recognized {
                    listen,
                    transcript: line.trim().to_string(),
                },
                Some(_) => SessionEvent::RecognitionFailed {
                    listen,
                    error: RecognitionError::NoSpeech,
                },
                None => SessionEvent::RecognitionFailed {
                    listen,
                    error: RecognitionError::Aborted,
                },
            };
            let _ = events.send(event);
        }));

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
