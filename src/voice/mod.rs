//! Speech adapters
//!
//! Output wraps a text-to-speech capability, input wraps a speech-to-text
//! capability. Both report completion to the session as events and never
//! touch the presentation surface.

mod capture;
mod console;
mod endpoint;
mod input;
mod output;
mod stt;
mod synth;
mod whisper;

pub use capture::{Microphone, SAMPLE_RATE, rms, samples_to_wav};
pub use console::{ConsoleRecognizer, TypedLineSender, TypedLines, typed_lines};
pub use endpoint::{Endpoint, EndpointConfig, UtteranceEndpointer};
pub use input::{RecognitionError, Recognizer, SpeechInput};
pub use output::{SpeechOutput, Synthesizer};
pub use stt::WhisperClient;
pub use synth::CommandSynthesizer;
pub use whisper::WhisperRecognizer;

/// Spoken language and region for both directions
pub const LOCALE: &str = "es-ES";

/// Language part of [`LOCALE`], as STT APIs expect it
#[must_use]
pub fn language() -> &'static str {
    LOCALE.split('-').next().unwrap_or(LOCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_locale() {
        assert_eq!(language(), "es");
    }
}
