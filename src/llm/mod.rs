//! Generative model invocation.
//!
//! The pipeline drives the model through one narrow seam: send a
//! `{system, user}` prompt, get decoded JSON back. Transport, auth, and
//! JSON-mode negotiation live behind [`ModelInvoker`]; contract validation
//! of the returned value happens in [`crate::contracts`], never here.

mod openai_compatible;

pub use openai_compatible::OpenAiCompatibleInvoker;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::error::ModelError;

/// Seam to the external generative model.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Send one prompt and return the model's decoded JSON response.
    ///
    /// A timeout or transport failure is fatal for the calling operation;
    /// there are no retries here and never a partial result.
    async fn invoke(
        &self,
        system: &str,
        user: &serde_json::Value,
    ) -> Result<serde_json::Value, ModelError>;
}

/// Create the model invoker from configuration.
pub fn create_model_invoker(config: &ModelConfig) -> Result<Arc<dyn ModelInvoker>, ModelError> {
    let invoker = OpenAiCompatibleInvoker::new(config.clone())?;
    tracing::info!(
        base_url = %config.base_url,
        model = %config.model,
        "Using OpenAI-compatible model endpoint"
    );
    Ok(Arc::new(invoker))
}
