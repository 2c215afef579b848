use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::core::options::GenerationOptions;
use crate::core::template::PromptTemplate;
use crate::providers::{self, ChatMessage, CompletionClient, CompletionRequest};

/// Uniform text-generation interface.
///
/// Implementations take a batch of input texts and return one completion
/// per input, in the same order.
#[async_trait]
pub trait Generation: Send + Sync {
    async fn execute(
        &self,
        texts: &[String],
        max_length: u64,
        options: &GenerationOptions,
    ) -> Result<Vec<String>>;
}

/// Generation backed by the multi-provider completion client.
///
/// Each input text becomes one single-turn chat completion request; the
/// first choice's message content is the completion for that input.
pub struct RouterGeneration {
    model: String,
    client: Arc<dyn CompletionClient>,
    defaults: GenerationOptions,
}

impl RouterGeneration {
    /// Check whether `id` names a model the completion backend can serve.
    ///
    /// Speculative: any detection failure (including an absent backend)
    /// is reported as `false`, never propagated, and nothing is printed.
    pub fn is_model(id: &str) -> bool {
        match providers::default_client() {
            Some(client) => client.detect_provider(id).is_ok(),
            None => false,
        }
    }

    /// Create a generation for `model` using the default backend.
    ///
    /// Registers the given template (passthrough when `None`) with the
    /// client and stores `defaults` for later calls. Fails with a
    /// configuration error when no backend is compiled in.
    pub fn new(
        model: impl Into<String>,
        template: Option<PromptTemplate>,
        defaults: GenerationOptions,
    ) -> Result<Self> {
        let Some(client) = providers::default_client() else {
            bail!(
                "Completion backend is not available. \
                 Rebuild with the \"router\" feature enabled."
            );
        };

        Ok(Self::with_client(model, template, defaults, client))
    }

    /// Create a generation with an injected completion client.
    pub fn with_client(
        model: impl Into<String>,
        template: Option<PromptTemplate>,
        defaults: GenerationOptions,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        let model = model.into();
        client.register_template(&model, template.unwrap_or_else(PromptTemplate::passthrough));

        Self {
            model,
            client,
            defaults,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Generation for RouterGeneration {
    async fn execute(
        &self,
        texts: &[String],
        max_length: u64,
        options: &GenerationOptions,
    ) -> Result<Vec<String>> {
        // Call-time options win over construction-time defaults
        let merged = self.defaults.merged(options);

        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            let request = CompletionRequest {
                model: self.model.clone(),
                messages: vec![ChatMessage::user(text)],
                max_tokens: max_length,
                options: merged.clone(),
            };

            let completion = self
                .client
                .complete(request)
                .await
                .with_context(|| format!("Completion request failed for model {}", self.model))?;

            let content = completion
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content);

            match content {
                Some(content) => results.push(content),
                None => bail!(
                    "Completion response for model {} contained no message content",
                    self.model
                ),
            }
        }

        Ok(results)
    }
}

// ---------- Tests ----------
