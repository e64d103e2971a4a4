//! Utterance endpointing
//!
//! Decides when a single spoken utterance is complete from RMS energy:
//! enough speech followed by enough silence. Gives up with
//! [`Endpoint::NoSpeech`] if nothing is said before the timeout.

use std::time::Duration;

use super::capture::{SAMPLE_RATE, rms};

/// Tuning for [`UtteranceEndpointer`]
#[derive(Debug, Clone, Copy)]
pub struct EndpointConfig {
    /// RMS energy above which a block counts as speech
    pub energy_threshold: f32,
    /// Minimum speech before an utterance can end
    pub min_speech: Duration,
    /// Trailing silence that ends an utterance
    pub trailing_silence: Duration,
    /// Silence before any speech after which listening gives up
    pub no_speech_timeout: Duration,
    /// Hard cap on utterance length
    pub max_utterance: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 0.03,
            min_speech: Duration::from_millis(300),
            trailing_silence: Duration::from_millis(800),
            no_speech_timeout: Duration::from_secs(8),
            max_utterance: Duration::from_secs(15),
        }
    }
}

/// Result of feeding one block of samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Keep feeding samples
    Pending,
    /// Utterance complete; take it with [`UtteranceEndpointer::take_utterance`]
    Complete,
    /// Timed out before any speech
    NoSpeech,
}

/// Energy-based single-utterance detector
#[derive(Debug)]
pub struct UtteranceEndpointer {
    config: EndpointConfig,
    utterance: Vec<f32>,
    speech_samples: usize,
    silence_samples: usize,
    /// Samples heard before any real speech, noise bursts included
    waited_samples: usize,
    in_speech: bool,
}

#[allow(clippy::cast_possible_truncation)]
const fn samples_for(duration: Duration) -> usize {
    (duration.as_millis() as usize) * (SAMPLE_RATE as usize) / 1000
}

impl UtteranceEndpointer {
    /// Create an endpointer waiting for speech
    #[must_use]
    pub const fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            utterance: Vec::new(),
            speech_samples: 0,
            silence_samples: 0,
            waited_samples: 0,
            in_speech: false,
        }
    }

    /// Feed the next block of samples
    pub fn process(&mut self, samples: &[f32]) -> Endpoint {
        if samples.is_empty() {
            return Endpoint::Pending;
        }
        let is_speech = rms(samples) > self.config.energy_threshold;

        if !self.in_speech {
            if is_speech {
                self.in_speech = true;
                self.silence_samples = 0;
                self.speech_samples = samples.len();
                self.utterance.extend_from_slice(samples);
                tracing::trace!("speech started");
            } else {
                self.silence_samples += samples.len();
                self.waited_samples += samples.len();
                if self.waited_timed_out() {
                    return Endpoint::NoSpeech;
                }
            }
            return Endpoint::Pending;
        }

        self.utterance.extend_from_slice(samples);
        if is_speech {
            self.speech_samples += samples.len();
            self.silence_samples = 0;
        } else {
            self.silence_samples += samples.len();
        }

        let ended = self.silence_samples >= samples_for(self.config.trailing_silence)
            && self.speech_samples >= samples_for(self.config.min_speech);
        if ended || self.utterance.len() >= samples_for(self.config.max_utterance) {
            tracing::debug!(samples = self.utterance.len(), "utterance complete");
            return Endpoint::Complete;
        }

        // Short blip followed by long silence: start over, still on the clock
        if self.silence_samples >= samples_for(self.config.trailing_silence) * 2 {
            tracing::trace!("discarding short noise burst");
            self.waited_samples += self.utterance.len();
            self.discard_capture();
            if self.waited_timed_out() {
                return Endpoint::NoSpeech;
            }
        }

        Endpoint::Pending
    }

    /// Take the captured utterance and reset
    pub fn take_utterance(&mut self) -> Vec<f32> {
        let utterance = std::mem::take(&mut self.utterance);
        self.discard_capture();
        self.waited_samples = 0;
        utterance
    }

    fn waited_timed_out(&self) -> bool {
        self.waited_samples >= samples_for(self.config.no_speech_timeout)
    }

    fn discard_capture(&mut self) {
        self.utterance.clear();
        self.speech_samples = 0;
        self.silence_samples = 0;
        self.in_speech = false;
    }
}
