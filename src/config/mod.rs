//! Configuration management
//!
//! Values resolve as environment > TOML file > default.

pub mod file;

use std::time::Duration;

use crate::{Error, Result};

use file::ConciergeConfigFile;

/// Default pause between echoing the user's words and answering
pub const DEFAULT_ECHO_DELAY: Duration = Duration::from_millis(1000);

/// Default pace of the transcript reveal
pub const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(30);

/// Default silence before a listen gives up
pub const DEFAULT_NO_SPEECH_TIMEOUT: Duration = Duration::from_secs(8);

/// Voice concierge configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Speech adapter configuration
    pub voice: VoiceConfig,

    /// Turn-taking configuration
    pub session: SessionConfig,
}

/// Where transcripts come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InputBackend {
    /// Microphone capture transcribed by Whisper
    #[default]
    #[value(alias = "mic", alias = "microphone")]
    Whisper,
    /// Typed lines on stdin
    #[value(alias = "stdin", alias = "text")]
    Console,
    /// No speech input; manual controls only
    #[value(alias = "off")]
    None,
}

impl InputBackend {
    /// Parse a backend name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whisper" | "mic" | "microphone" => Some(Self::Whisper),
            "console" | "stdin" | "text" => Some(Self::Console),
            "none" | "off" => Some(Self::None),
            _ => None,
        }
    }
}

/// How responses are voiced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputBackend {
    /// System TTS program
    #[default]
    #[value(alias = "tts")]
    System,
    /// Text only
    #[value(alias = "off", alias = "text")]
    None,
}

impl OutputBackend {
    /// Parse a backend name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" | "tts" => Some(Self::System),
            "none" | "off" | "text" => Some(Self::None),
            _ => None,
        }
    }
}

/// Speech adapter configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Input backend
    pub input: InputBackend,

    /// Output backend
    pub output: OutputBackend,

    /// Explicit TTS command line; autodetected when unset
    pub tts_command: Option<String>,

    /// STT model for Whisper
    pub stt_model: String,

    /// Override for the transcription server
    pub stt_base_url: Option<String>,

    /// `OpenAI` API key (for Whisper)
    pub openai_api_key: Option<String>,

    /// Silence before a listen gives up
    pub no_speech_timeout: Duration,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            input: InputBackend::default(),
            output: OutputBackend::default(),
            tts_command: None,
            stt_model: "whisper-1".to_string(),
            stt_base_url: None,
            openai_api_key: None,
            no_speech_timeout: DEFAULT_NO_SPEECH_TIMEOUT,
        }
    }
}

/// Turn-taking configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between echoing the user and answering
    pub echo_delay: Duration,

    /// Delay between revealed transcript characters
    pub reveal_interval: Duration,

    /// Re-prompts after a transient recognition failure
    pub recognition_retries: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            echo_delay: DEFAULT_ECHO_DELAY,
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
            recognition_retries: 1,
        }
    }
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if an environment variable holds an invalid value
    pub fn load() -> Result<Self> {
        Self::resolve(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a value cannot be parsed
    pub fn resolve(fc: ConciergeConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let openai_api_key = env("OPENAI_API_KEY")
            .or(fc.api_keys.openai)
            .filter(|k| !k.is_empty());

        let input = match env("CONCIERGE_INPUT").or(fc.voice.input) {
            Some(s) => InputBackend::parse(&s)
                .ok_or_else(|| Error::Config(format!("unknown input backend: {s}")))?,
            None => defaults.voice.input,
        };
        let input = if input == InputBackend::Whisper && openai_api_key.is_none() {
            tracing::warn!("no OpenAI API key, speech input disabled");
            InputBackend::None
        } else {
            input
        };

        let output = match env("CONCIERGE_OUTPUT").or(fc.voice.output) {
            Some(s) => OutputBackend::parse(&s)
                .ok_or_else(|| Error::Config(format!("unknown output backend: {s}")))?,
            None => defaults.voice.output,
        };

        let no_speech_timeout = fc
            .voice
            .no_speech_timeout_secs
            .map_or(defaults.voice.no_speech_timeout, Duration::from_secs);

        let voice = VoiceConfig {
            input,
            output,
            tts_command: env("CONCIERGE_TTS_COMMAND").or(fc.voice.tts_command),
            stt_model: env("CONCIERGE_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or(defaults.voice.stt_model),
            stt_base_url: env("CONCIERGE_STT_BASE_URL").or(fc.voice.stt_base_url),
            openai_api_key,
            no_speech_timeout,
        };

        let session = SessionConfig {
            echo_delay: parse_env(&env, "CONCIERGE_ECHO_DELAY_MS")?
                .or(fc.session.echo_delay_ms)
                .map_or(defaults.session.echo_delay, Duration::from_millis),
            reveal_interval: parse_env(&env, "CONCIERGE_REVEAL_INTERVAL_MS")?
                .or(fc.session.reveal_interval_ms)
                .filter(|ms| *ms > 0)
                .map_or(defaults.session.reveal_interval, Duration::from_millis),
            recognition_retries: parse_env(&env, "CONCIERGE_RECOGNITION_RETRIES")?
                .or(fc.session.recognition_retries)
                .unwrap_or(defaults.session.recognition_retries),
        };

        Ok(Self { voice, session })
    }
}

fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("{key}: invalid value {raw:?}")))
        })
        .transpose()
}
