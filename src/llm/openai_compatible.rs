//! OpenAI-compatible model invoker.
//!
//! Works against any endpoint that implements the OpenAI Chat Completions
//! API: the hosted service, local model servers, or proxies. The user
//! payload is sent as serialized JSON inside the user message, and the
//! endpoint is asked for a JSON-object response.

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::llm::ModelInvoker;

use async_trait::async_trait;

/// Chat Completions invoker.
pub struct OpenAiCompatibleInvoker {
    client: Client,
    config: ModelConfig,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiCompatibleInvoker {
    /// Create a new invoker from model configuration.
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ModelError::RequestFailed {
                reason: format!("Failed to build reqwest client: {e}"),
            })?;

        Ok(Self { client, config })
    }

    /// Construct the API URL. Strips a trailing `/v1` from the base URL to
    /// avoid doubled `/v1/v1` paths.
    fn api_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        format!("{base}/v1/chat/completions")
    }

    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key.as_ref() {
            Some(key) => request.header("Authorization", format!("Bearer {}", key.expose_secret())),
            None => request,
        }
    }
}

#[async_trait]
impl ModelInvoker for OpenAiCompatibleInvoker {
    async fn invoke(
        &self,
        system: &str,
        user: &serde_json::Value,
    ) -> Result<serde_json::Value, ModelError> {
        let url = self.api_url();
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user.to_string()}
            ],
            "temperature": 0.2,
            "response_format": {"type": "json_object"}
        });

        tracing::debug!(%url, "Sending model request");

        let request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        let request = self.add_auth_header(request);

        let response = request.send().await.map_err(|e| {
            tracing::error!("Model request failed: {e}");
            ModelError::RequestFailed {
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::RequestFailed {
                reason: format!("Failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            if status.as_u16() == 401 {
                return Err(ModelError::AuthFailed);
            }
            if status.as_u16() == 429 {
                return Err(ModelError::RateLimited);
            }
            return Err(ModelError::RequestFailed {
                reason: format!("HTTP {}: {}", status, &text[..text.len().min(200)]),
            });
        }

        let decoded: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| ModelError::InvalidResponse {
                reason: format!("JSON parse error: {}. Raw: {}", e, &text[..text.len().min(200)]),
            })?;

        let content = decoded
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ModelError::InvalidResponse {
                reason: "response carried no choices".to_string(),
            })?;

        let payload = extract_json_payload(&content);
        serde_json::from_str(payload).map_err(|e| ModelError::InvalidResponse {
            reason: format!(
                "model content is not JSON: {}. Content: {}",
                e,
                &content[..content.len().min(200)]
            ),
        })
    }
}

/// Unwrap a markdown code fence if the endpoint ignored JSON mode and
/// wrapped its output in one.
fn extract_json_payload(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
