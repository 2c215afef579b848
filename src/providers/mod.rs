#[cfg(feature = "router")]
pub mod router;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::options::GenerationOptions;
use crate::core::template::PromptTemplate;

/// Errors surfaced by a completion client.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("No provider serves model '{0}'")]
    UnknownProvider(String),

    #[error("API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),

    #[error("Request to {provider} API failed: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} API authentication failed. Check the {key_env} environment variable: {message}")]
    AuthFailed {
        provider: String,
        key_env: String,
        message: String,
    },

    #[error("{provider} API rate limit hit. Try again in a moment: {message}")]
    RateLimited { provider: String, message: String },

    #[error("{provider} API returned HTTP {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Malformed completion response: {0}")]
    InvalidResponse(String),
}

/// Trait for completion-client backends.
///
/// This is the dependency boundary: everything past it (provider routing,
/// HTTP, auth) belongs to the backend, not to the generation layer.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Resolve the provider that serves `model`, or an error if none does.
    fn detect_provider(&self, model: &str) -> Result<String, CompletionError>;

    /// Register a prompt template to apply to outbound messages for `model`.
    fn register_template(&self, model: &str, template: PromptTemplate);

    /// Issue a single chat completion request.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<ChatCompletion, CompletionError>;
}

/// Request to a completion client
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u64,
    /// Open-ended options forwarded verbatim in the request body
    #[serde(flatten)]
    pub options: GenerationOptions,
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// ---------- Structured completion response ----------

/// Chat completion in the common `choices[].message.content` shape
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// The compiled-in completion backend, if any.
///
/// Returns `None` when the crate was built without the `router` feature.
/// Callers treat that as "dependency absent" and fail construction with a
/// configuration error.
#[cfg(feature = "router")]
pub fn default_client() -> Option<Arc<dyn CompletionClient>> {
    Some(Arc::new(router::RouterClient::new()))
}

#[cfg(not(feature = "router"))]
pub fn default_client() -> Option<Arc<dyn CompletionClient>> {
    None
}
