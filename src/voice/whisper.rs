//! Microphone + Whisper recognizer

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::session::{EventSender, ListenId, SessionEvent};
use crate::{Error, Result};

use super::capture::{Microphone, SAMPLE_RATE, samples_to_wav};
use super::endpoint::{Endpoint, EndpointConfig, UtteranceEndpointer};
use super::input::{RecognitionError, Recognizer};
use super::stt::WhisperClient;

/// How often captured audio is pulled from the microphone
const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum Captured {
    Speech(Vec<f32>),
    Silence,
    Stopped,
}

/// Records one utterance from the default microphone and transcribes it
pub struct WhisperRecognizer {
    client: Arc<WhisperClient>,
    endpoint: EndpointConfig,
    stop: Option<Arc<AtomicBool>>,
}

impl WhisperRecognizer {
    /// Create a recognizer using `client` for transcription
    #[must_use]
    pub fn new(client: WhisperClient, endpoint: EndpointConfig) -> Self {
        Self {
            client: Arc::new(client),
            endpoint,
            stop: None,
        }
    }
}

impl Recognizer for WhisperRecognizer {
    fn start(&mut self, listen: ListenId, events: EventSender) -> Result<()> {
        self.stop();

        let stop = Arc::new(AtomicBool::new(false));
        self.stop = Some(Arc::clone(&stop));
        let client = Arc::clone(&self.client);
        let endpoint = self.endpoint;

        tokio::spawn(async move {
            let capture_stop = Arc::clone(&stop);
            let captured =
                tokio::task::spawn_blocking(move || capture_utterance(&capture_stop, endpoint))
                    .await
                    .map_err(|e| Error::Audio(e.to_string()))
                    .and_then(|r| r);

            let outcome = match captured {
                Ok(Captured::Speech(samples)) => transcribe(&client, &samples).await,
                Ok(Captured::Silence) => Err(RecognitionError::NoSpeech),
                Ok(Captured::Stopped) => Err(RecognitionError::Aborted),
                Err(e) => {
                    tracing::warn!(error = %e, "microphone capture failed");
                    Err(RecognitionError::AudioCapture)
                }
            };

            let event = match outcome {
                _ if stop.load(Ordering::Relaxed) => SessionEvent::RecognitionFailed {
                    listen,
                    error: RecognitionError::Aborted,
                },
                Ok(transcript) if transcript.is_empty() => SessionEvent::RecognitionFailed {
                    listen,
                    error: RecognitionError::NoSpeech,
                },
                Ok(transcript) => SessionEvent::Recognized { listen, transcript },
                Err(error) => SessionEvent::RecognitionFailed { listen, error },
            };
            let _ = events.send(event);
        });

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.store(true, Ordering::Relaxed);
        }
    }
}

fn capture_utterance(stop: &AtomicBool, config: EndpointConfig) -> Result<Captured> {
    let mut microphone = Microphone::open()?;
    let mut endpointer = UtteranceEndpointer::new(config);
    microphone.start()?;

    loop {
        std::thread::sleep(POLL_INTERVAL);
        if stop.load(Ordering::Relaxed) {
            return Ok(Captured::Stopped);
        }
        match endpointer.process(&microphone.drain()) {
            Endpoint::Pending => {}
            Endpoint::Complete => return Ok(Captured::Speech(endpointer.take_utterance())),
            Endpoint::NoSpeech => return Ok(Captured::Silence),
        }
    }
}

async fn transcribe(
    client: &WhisperClient,
    samples: &[f32],
) -> std::result::Result<String, RecognitionError> {
    let wav = samples_to_wav(samples, SAMPLE_RATE).map_err(|e| {
        tracing::warn!(error = %e, "failed to encode utterance");
        RecognitionError::AudioCapture
    })?;

    client
        .transcribe(wav, super::language())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "transcription failed");
            match e {
                Error::Config(_) => RecognitionError::ServiceNotAllowed,
                _ => RecognitionError::Network,
            }
        })
}
