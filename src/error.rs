//! Error types for Greenroom.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Transcription error: {0}")]
    Transcription(#[from] crate::transcription::TranscriptionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Environment variable {0} is not valid unicode")]
    NotUnicode(String),
}

/// Pipeline state machine errors.
///
/// `Validation` means the caller's input was malformed and nothing was
/// mutated. `NotFound` means no pipeline exists under the given id.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("No pipeline found with id {id}")]
    NotFound { id: uuid::Uuid },
}

impl PipelineError {
    /// Shorthand for a validation failure on a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Durable store errors. Fatal for the operation that hit them; the
/// operation persists nothing.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store query failed: {0}")]
    Query(String),

    #[error("Failed to open store at {path}: {message}")]
    Open { path: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Contract violations in an external model response.
///
/// The model's output is untrusted JSON; any response that does not match
/// the expected schema is rejected before it can touch pipeline state.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Model response is not a JSON object")]
    NotAnObject,

    #[error("Model response missing required key: {key}")]
    MissingKey { key: &'static str },

    #[error("Model response key {key} has wrong shape: expected {expected}")]
    WrongShape {
        key: &'static str,
        expected: &'static str,
    },

    #[error("Model response key {key} is empty")]
    Empty { key: &'static str },
}

/// Generative model invocation errors.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Model endpoint rejected credentials")]
    AuthFailed,

    #[error("Model endpoint rate limited the request")]
    RateLimited,

    #[error("Model returned an unparseable response: {reason}")]
    InvalidResponse { reason: String },
}
