//! Audio transcription for spoken answers.
//!
//! The pipeline core never touches audio itself; the gateway hands
//! uploaded bytes to a [`TranscriptionProvider`] and records only the
//! returned text. The provider is optional at configuration time — answer
//! submission with an inline transcript needs none.

pub mod openai;

use async_trait::async_trait;

/// Supported audio formats for transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// OGG with Opus codec (browser voice recordings).
    OggOpus,
    /// MP3.
    Mp3,
    /// WAV.
    Wav,
    /// WebM.
    Webm,
    /// M4A / AAC.
    M4a,
}

impl AudioFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::OggOpus => "ogg",
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Webm => "webm",
            Self::M4a => "m4a",
        }
    }

    /// MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::OggOpus => "audio/ogg",
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Webm => "audio/webm",
            Self::M4a => "audio/mp4",
        }
    }

    /// Detect format from a MIME type string.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        // Normalize: strip parameters (e.g., "audio/ogg; codecs=opus" → "audio/ogg")
        let base = mime.split(';').next().unwrap_or(mime).trim();
        match base {
            "audio/ogg" | "audio/opus" => Some(Self::OggOpus),
            "audio/mpeg" | "audio/mp3" => Some(Self::Mp3),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(Self::Wav),
            "audio/webm" => Some(Self::Webm),
            "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "audio/aac" => Some(Self::M4a),
            _ => None,
        }
    }
}

/// Errors from transcription operations.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    /// Unsupported audio format.
    #[error("unsupported audio format: {mime_type}")]
    UnsupportedFormat { mime_type: String },

    /// Audio file exceeds the provider's size limit.
    #[error("audio file too large: {size} bytes (max {max})")]
    FileTooLarge { size: usize, max: usize },

    /// Provider API returned an error.
    #[error("transcription API error: {message}")]
    ApiError { message: String },

    /// Network or HTTP error.
    #[error("transcription request failed: {0}")]
    RequestFailed(String),

    /// Provider is not configured.
    #[error("transcription provider not configured: {reason}")]
    NotConfigured { reason: String },
}

/// Trait for speech-to-text transcription providers.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Maximum file size in bytes.
    fn max_file_size(&self) -> usize;

    /// Transcribe audio bytes to text.
    async fn transcribe(
        &self,
        audio: &[u8],
        format: AudioFormat,
        language: Option<&str>,
    ) -> Result<String, TranscriptionError>;
}
