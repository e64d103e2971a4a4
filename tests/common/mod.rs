//! Shared test utilities: recording fakes for the session's collaborators

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voice_concierge::PresentationSurface;
use voice_concierge::Result;
use voice_concierge::session::{EventSender, ListenId, SessionEvent, UtteranceId};
use voice_concierge::voice::{RecognitionError, Recognizer, Synthesizer};

/// Every call a surface received, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Open,
    Hide,
    Render(String),
    Speaking(bool),
    Listening(bool),
    Scroll(String),
    Instruction(String),
}

#[derive(Debug, Default)]
pub struct SurfaceLog {
    pub calls: Vec<SurfaceCall>,
    pub speaking: bool,
    pub listening: bool,
    /// Set if both indicators were ever on at the same time
    pub overlap_seen: bool,
}

/// Surface that records calls into a shared log
#[derive(Clone, Default)]
pub struct RecordingSurface {
    pub log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.log.lock().unwrap().calls.clone()
    }

    pub fn overlap_seen(&self) -> bool {
        self.log.lock().unwrap().overlap_seen
    }

    pub fn rendered(&self, text: &str) -> bool {
        self.calls()
            .iter()
            .any(|c| matches!(c, SurfaceCall::Render(t) if t == text))
    }

    fn push(&self, call: SurfaceCall) {
        let mut log = self.log.lock().unwrap();
        match call {
            SurfaceCall::Speaking(on) => log.speaking = on,
            SurfaceCall::Listening(on) => log.listening = on,
            _ => {}
        }
        if log.speaking && log.listening {
            log.overlap_seen = true;
        }
        log.calls.push(call);
    }
}

impl PresentationSurface for RecordingSurface {
    fn open(&mut self) {
        self.push(SurfaceCall::Open);
    }

    fn hide(&mut self) {
        self.push(SurfaceCall::Hide);
    }

    fn render(&mut self, transcript: &str) {
        self.push(SurfaceCall::Render(transcript.to_string()));
    }

    fn set_speaking_indicator(&mut self, on: bool) {
        self.push(SurfaceCall::Speaking(on));
    }

    fn set_listening_indicator(&mut self, on: bool) {
        self.push(SurfaceCall::Listening(on));
    }

    fn scroll_to_section(&mut self, section_id: &str) {
        self.push(SurfaceCall::Scroll(section_id.to_string()));
    }

    fn show_instruction(&mut self, text: &str) {
        self.push(SurfaceCall::Instruction(text.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct SynthLog {
    pub spoken: Vec<(UtteranceId, String)>,
    pub cancels: usize,
    pub speaking: bool,
}

/// Synthesizer that records what it was asked to say
///
/// With `auto_complete` it reports the end of speech right away; otherwise
/// the test delivers `SpeechEnded` itself.
#[derive(Clone, Default)]
pub struct FakeSynthesizer {
    pub log: Arc<Mutex<SynthLog>>,
    pub auto_complete: bool,
}

impl FakeSynthesizer {
    pub fn auto() -> Self {
        Self {
            auto_complete: true,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<(UtteranceId, String)> {
        self.log.lock().unwrap().spoken.clone()
    }

    pub fn last_id(&self) -> UtteranceId {
        self.spoken().last().expect("nothing spoken").0
    }

    pub fn cancels(&self) -> usize {
        self.log.lock().unwrap().cancels
    }
}

impl Synthesizer for FakeSynthesizer {
    fn speak(&mut self, utterance: UtteranceId, text: &str, events: EventSender) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.spoken.push((utterance, text.to_string()));
        if self.auto_complete {
            let _ = events.send(SessionEvent::SpeechEnded(utterance));
        } else {
            log.speaking = true;
        }
        Ok(())
    }

    fn cancel(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.cancels += 1;
        log.speaking = false;
    }

    fn is_speaking(&self) -> bool {
        self.log.lock().unwrap().speaking
    }
}

#[derive(Debug, Default)]
pub struct RecognizerLog {
    pub started: Vec<ListenId>,
    pub stops: usize,
    pub script: VecDeque<std::result::Result<String, RecognitionError>>,
}

/// Recognizer that records listens and answers from a script
///
/// When the script is empty a listen never completes.
#[derive(Clone, Default)]
pub struct FakeRecognizer {
    pub log: Arc<Mutex<RecognizerLog>>,
}

impl FakeRecognizer {
    pub fn scripted(
        script: impl IntoIterator<Item = std::result::Result<&'static str, RecognitionError>>,
    ) -> Self {
        let recognizer = Self::default();
        recognizer.log.lock().unwrap().script = script
            .into_iter()
            .map(|r| r.map(ToString::to_string))
            .collect();
        recognizer
    }

    pub fn started(&self) -> Vec<ListenId> {
        self.log.lock().unwrap().started.clone()
    }

    pub fn last_id(&self) -> ListenId {
        *self.started().last().expect("never listened")
    }

    pub fn stops(&self) -> usize {
        self.log.lock().unwrap().stops
    }
}

impl Recognizer for FakeRecognizer {
    fn start(&mut self, listen: ListenId, events: EventSender) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        log.started.push(listen);
        if let Some(next) = log.script.pop_front() {
            let event = match next {
                Ok(transcript) => SessionEvent::Recognized { listen, transcript },
                Err(error) => SessionEvent::RecognitionFailed { listen, error },
            };
            let _ = events.send(event);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.log.lock().unwrap().stops += 1;
    }
}

/// Poll `condition` until it holds or two seconds pass
pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
