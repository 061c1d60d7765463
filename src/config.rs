//! Configuration for Greenroom.
//!
//! Everything is driven by environment variables (a `.env` file is honored
//! via `dotenvy`). Each section has its own `from_env` constructor so a
//! component can be configured in isolation in tests.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Main configuration for the service.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub model: ModelConfig,
    pub transcription: TranscriptionConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            server: ServerConfig::from_env()?,
            store: StoreConfig::from_env()?,
            model: ModelConfig::from_env()?,
            transcription: TranscriptionConfig::from_env()?,
        })
    }
}

/// HTTP gateway bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let host = optional_env("GREENROOM_HOST")?.unwrap_or_else(|| "127.0.0.1".to_string());
        let port = optional_env("GREENROOM_PORT")?
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: "GREENROOM_PORT".to_string(),
                message: format!("must be a port number: {e}"),
            })?
            .unwrap_or(8080);

        Ok(Self { host, port })
    }
}

/// Durable store configuration.
///
/// With `database_path` unset the service runs against the in-memory store
/// and loses all sessions on restart; set `GREENROOM_DB` for durability.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_path: Option<PathBuf>,
}

impl StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let database_path = optional_env("GREENROOM_DB")?.map(PathBuf::from);
        Ok(Self { database_path })
    }
}

/// Generative model endpoint configuration.
///
/// Any OpenAI-compatible Chat Completions endpoint works: the hosted API,
/// a local server, or a proxy.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
}

impl ModelConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = optional_env("GREENROOM_MODEL_BASE_URL")?
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        let api_key = optional_env("GREENROOM_MODEL_API_KEY")?.map(SecretString::from);
        let model =
            optional_env("GREENROOM_MODEL")?.unwrap_or_else(|| "gpt-4o-mini".to_string());

        Ok(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Transcription provider configuration.
///
/// Transcription is optional: without an API key the `/answer` endpoint
/// still accepts inline transcripts, it just cannot accept raw audio.
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    pub api_key: Option<SecretString>,
    pub model: String,
}

impl TranscriptionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = optional_env("GREENROOM_TRANSCRIPTION_API_KEY")?
            .or(optional_env("GREENROOM_MODEL_API_KEY")?)
            .map(SecretString::from);
        let model =
            optional_env("GREENROOM_TRANSCRIPTION_MODEL")?.unwrap_or_else(|| "whisper-1".to_string());

        Ok(Self { api_key, model })
    }

    /// Whether a transcription provider can be constructed.
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Read an optional environment variable, treating empty strings as unset.
fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(key.to_string())),
    }
}
