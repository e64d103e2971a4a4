//! Assistant - wires configuration into a runnable session
//!
//! Picks the speech backends named in the config, degrading to text-only
//! output or manual-only input when a capability is missing.

use tokio::sync::mpsc;

use crate::config::{InputBackend, OutputBackend, VoiceConfig};
use crate::session::{self, Session, SessionHandle, SessionRuntime};
use crate::surface::PresentationSurface;
use crate::voice::{
    CommandSynthesizer, ConsoleRecognizer, EndpointConfig, Recognizer, SpeechInput, SpeechOutput,
    Synthesizer, TypedLines, WhisperClient, WhisperRecognizer,
};
use crate::{Config, Result};

/// A configured voice session ready to run
pub struct Assistant {
    runtime: SessionRuntime,
    handle: SessionHandle,
}

impl Assistant {
    /// Build the adapters and session described by `config`
    ///
    /// `typed` feeds the console recognizer and is unused by other input
    /// backends.
    ///
    /// # Errors
    ///
    /// Returns error if an explicitly configured backend cannot be created
    pub fn new(
        config: &Config,
        surface: Box<dyn PresentationSurface>,
        typed: TypedLines,
    ) -> Result<Self> {
        let synthesizer = build_synthesizer(&config.voice)?;
        let recognizer = build_recognizer(&config.voice, typed)?;
        Ok(Self::with_backends(config, surface, synthesizer, recognizer))
    }

    /// Build a session around already-constructed backends
    #[must_use]
    pub fn with_backends(
        config: &Config,
        surface: Box<dyn PresentationSurface>,
        synthesizer: Option<Box<dyn Synthesizer>>,
        recognizer: Option<Box<dyn Recognizer>>,
    ) -> Self {
        let (events, rx) = session::channel();

        let output = SpeechOutput::new(synthesizer, events.clone());
        let input = recognizer.map(|r| SpeechInput::new(r, events.clone()));
        if input.is_none() {
            tracing::info!("speech input unavailable, manual controls only");
        }

        let session = Session::new(output, input, surface, config.session.recognition_retries);
        let runtime = SessionRuntime::new(
            session,
            rx,
            config.session.echo_delay,
            config.session.reveal_interval,
        );

        Self {
            runtime,
            handle: SessionHandle::new(events),
        }
    }

    /// Handle for the activation and close controls
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Run the session until `shutdown` fires
    pub async fn run(self, shutdown: &mut mpsc::Receiver<()>) -> Session {
        self.runtime.run(shutdown).await
    }
}

/// Create the configured text-to-speech backend
///
/// # Errors
///
/// Returns error if an explicit TTS command cannot be resolved
pub fn build_synthesizer(voice: &VoiceConfig) -> Result<Option<Box<dyn Synthesizer>>> {
    if voice.output == OutputBackend::None {
        return Ok(None);
    }

    let synthesizer = match voice.tts_command.as_deref() {
        Some(command) => Some(CommandSynthesizer::from_command_line(command)?),
        None => CommandSynthesizer::detect(),
    };

    match synthesizer {
        Some(s) => {
            tracing::info!(program = %s.program().display(), "speech output ready");
            Ok(Some(Box::new(s)))
        }
        None => {
            tracing::warn!("no TTS program found, responses will be text only");
            Ok(None)
        }
    }
}

/// Create the configured speech-to-text backend
///
/// # Errors
///
/// Returns error if the Whisper client cannot be created
pub fn build_recognizer(
    voice: &VoiceConfig,
    typed: TypedLines,
) -> Result<Option<Box<dyn Recognizer>>> {
    match voice.input {
        InputBackend::None => Ok(None),
        InputBackend::Console => Ok(Some(Box::new(ConsoleRecognizer::new(typed)))),
        InputBackend::Whisper => {
            let Some(api_key) = voice.openai_api_key.clone() else {
                tracing::warn!("no OpenAI API key, speech input disabled");
                return Ok(None);
            };
            let mut client = WhisperClient::new(api_key, voice.stt_model.clone())?;
            if let Some(base_url) = &voice.stt_base_url {
                client = client.with_base_url(base_url.as_str());
            }
            let endpoint = EndpointConfig {
                no_speech_timeout: voice.no_speech_timeout,
                ..EndpointConfig::default()
            };
            Ok(Some(Box::new(WhisperRecognizer::new(client, endpoint))))
        }
    }
}
