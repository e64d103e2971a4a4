//! Whisper transcription client

use crate::{Error, Result};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes WAV audio through the `OpenAI` transcription endpoint
#[derive(Clone)]
pub struct WhisperClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for WhisperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl WhisperClient {
    /// Create a client for the given model
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a compatible server
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model used for transcription
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Transcribe WAV audio spoken in `language`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the service rejects the credentials,
    /// [`Error::Http`] on transport failure and [`Error::Stt`] for any other
    /// unsuccessful response
    pub async fn transcribe(&self, wav: Vec<u8>, language: &str) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), language, "starting Whisper transcription");

        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Stt(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("language", language.to_string());

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Config(format!("Whisper rejected credentials ({status})")));
        }
        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result = parse_transcript(&body)?;
        tracing::info!(transcript = %result, "transcription complete");
        Ok(result)
    }
}

fn parse_transcript(body: &str) -> Result<String> {
    let response: WhisperResponse = serde_json::from_str(body)?;
    Ok(response.text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_rejected() {
        assert!(WhisperClient::new(String::new(), "whisper-1".to_string()).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = WhisperClient::new("sk-test".to_string(), "whisper-1".to_string())
            .unwrap()
            .with_base_url("http://localhost:8000/v1/");
        assert_eq!(client.base_url, "http://localhost:8000/v1");
        assert_eq!(client.model(), "whisper-1");
    }

    #[test]
    fn test_parse_transcript() {
        assert_eq!(
            parse_transcript(r#"{"text":" ¿Cuánto vale una web? "}"#).unwrap(),
            "¿Cuánto vale una web?"
        );
        assert!(matches!(
            parse_transcript("not json"),
            Err(Error::Serialization(_))
        ));
    }
}
