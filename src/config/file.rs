//! TOML configuration file loading
//!
//! Supports `~/.config/voice-concierge/config.toml` as a persistent config
//! source. All fields are optional: the file is a partial overlay on top of
//! defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConciergeConfigFile {
    /// Speech adapter configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Turn-taking configuration
    #[serde(default)]
    pub session: SessionFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Speech adapter configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Input backend ("whisper", "console", "none")
    pub input: Option<String>,

    /// Output backend ("system", "none")
    pub output: Option<String>,

    /// TTS command line, text is appended as the last argument
    pub tts_command: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Base URL of an OpenAI-compatible transcription server
    pub stt_base_url: Option<String>,

    /// Seconds of silence before a listen gives up
    pub no_speech_timeout_secs: Option<u64>,
}

/// Turn-taking configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Pause between echoing the user and answering
    pub echo_delay_ms: Option<u64>,

    /// Delay between revealed transcript characters
    pub reveal_interval_ms: Option<u64>,

    /// Re-prompts after a transient recognition failure
    pub recognition_retries: Option<u32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ConciergeConfigFile::default()` if the file doesn't exist or
/// can't be parsed.
pub fn load_config_file() -> ConciergeConfigFile {
    config_file_path().map_or_else(ConciergeConfigFile::default, |path| load_config_file_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Missing or unreadable files fall back to defaults with a warning.
pub fn load_config_file_from(path: &Path) -> ConciergeConfigFile {
    if !path.exists() {
        return ConciergeConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConciergeConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConciergeConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/voice-concierge/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("voice-concierge").join("config.toml"))
}
