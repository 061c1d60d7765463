//! OpenAI Whisper transcription provider.
//!
//! Uses the `/v1/audio/transcriptions` endpoint with multipart form upload.

use async_trait::async_trait;
use reqwest::multipart;
use secrecy::{ExposeSecret, SecretString};

use crate::transcription::{AudioFormat, TranscriptionError, TranscriptionProvider};

/// Maximum file size for the Whisper API (25 MB).
const WHISPER_MAX_FILE_SIZE: usize = 25 * 1024 * 1024;

/// OpenAI Whisper transcription provider.
pub struct OpenAiWhisper {
    api_key: SecretString,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiWhisper {
    /// Create a new OpenAI Whisper provider.
    pub fn new(api_key: SecretString, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: "https://api.openai.com".to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Set a custom base URL (for testing or alternative endpoints).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl TranscriptionProvider for OpenAiWhisper {
    fn name(&self) -> &str {
        "openai"
    }

    fn max_file_size(&self) -> usize {
        WHISPER_MAX_FILE_SIZE
    }

    async fn transcribe(
        &self,
        audio: &[u8],
        format: AudioFormat,
        language: Option<&str>,
    ) -> Result<String, TranscriptionError> {
        if audio.len() > WHISPER_MAX_FILE_SIZE {
            return Err(TranscriptionError::FileTooLarge {
                size: audio.len(),
                max: WHISPER_MAX_FILE_SIZE,
            });
        }

        let filename = format!("audio.{}", format.extension());

        let file_part = multipart::Part::bytes(audio.to_vec())
            .file_name(filename)
            .mime_str(format.mime_type())
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "text");

        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let url = format!("{}/v1/audio/transcriptions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(TranscriptionError::ApiError {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        // response_format=text returns raw text, trim whitespace
        Ok(body.trim().to_string())
    }
}
