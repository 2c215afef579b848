use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{
    ChatCompletion, ChatMessage, CompletionClient, CompletionError, CompletionRequest,
};
use crate::core::options::GenerationOptions;
use crate::core::template::PromptTemplate;

/// Routing entry: maps model identifiers to an OpenAI-compatible endpoint.
#[derive(Debug)]
struct Route {
    provider: &'static str,
    base_url: &'static str,
    /// Environment variable holding the API key. Empty means no auth.
    key_env: &'static str,
    /// Model name prefixes served by this provider.
    prefixes: &'static [&'static str],
}

/// Known providers, matched by model prefix or by the explicit
/// `provider/model` form.
const ROUTES: &[Route] = &[
    Route {
        provider: "openai",
        base_url: "https://api.openai.com/v1",
        key_env: "OPENAI_API_KEY",
        prefixes: &["gpt-", "chatgpt-", "o1", "o3", "o4"],
    },
    Route {
        provider: "groq",
        base_url: "https://api.groq.com/openai/v1",
        key_env: "GROQ_API_KEY",
        prefixes: &["llama-", "llama3", "gemma2-"],
    },
    Route {
        provider: "mistral",
        base_url: "https://api.mistral.ai/v1",
        key_env: "MISTRAL_API_KEY",
        prefixes: &["mistral-", "open-mistral-", "open-mixtral-", "codestral-"],
    },
    Route {
        provider: "deepseek",
        base_url: "https://api.deepseek.com/v1",
        key_env: "DEEPSEEK_API_KEY",
        prefixes: &["deepseek-"],
    },
    Route {
        provider: "together",
        base_url: "https://api.together.xyz/v1",
        key_env: "TOGETHER_API_KEY",
        prefixes: &[],
    },
    Route {
        provider: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        key_env: "OPENROUTER_API_KEY",
        prefixes: &[],
    },
    Route {
        provider: "ollama",
        base_url: "http://localhost:11434/v1",
        key_env: "",
        prefixes: &[],
    },
];

/// Completion client that routes model identifiers to OpenAI-compatible
/// chat completion endpoints.
pub struct RouterClient {
    client: Client,
    templates: Mutex<HashMap<String, PromptTemplate>>,
}

// ---------- API request/response types ----------

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u64,
    messages: Vec<ChatMessage>,
    #[serde(flatten)]
    options: GenerationOptions,
}

#[derive(Debug, serde::Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ---------- Implementation ----------

impl RouterClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            templates: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a model identifier to its route and the model name to send
    /// to the remote API.
    ///
    /// The explicit `provider/model` form wins over prefix matching, so
    /// `openrouter/meta-llama/llama-3-70b` routes to openrouter with the
    /// remainder as the remote model name.
    fn resolve(model: &str) -> Result<(&'static Route, String), CompletionError> {
        if let Some((provider, rest)) = model.split_once('/') {
            if let Some(route) = ROUTES.iter().find(|r| r.provider == provider) {
                if !rest.is_empty() {
                    return Ok((route, rest.to_string()));
                }
            }
        }

        for route in ROUTES {
            if route.prefixes.iter().any(|p| model.starts_with(p)) {
                return Ok((route, model.to_string()));
            }
        }

        Err(CompletionError::UnknownProvider(model.to_string()))
    }

    /// Classify a non-success API response.
    ///
    /// Prefers the structured error message when the body parses;
    /// authentication and rate-limit failures get their own variants so the
    /// caller sees actionable guidance instead of a bare status code.
    fn api_error(route: &Route, status: u16, body: String) -> CompletionError {
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        match status {
            401 | 403 => CompletionError::AuthFailed {
                provider: route.provider.to_string(),
                key_env: route.key_env.to_string(),
                message,
            },
            429 => CompletionError::RateLimited {
                provider: route.provider.to_string(),
                message,
            },
            status => CompletionError::Api {
                provider: route.provider.to_string(),
                status,
                message,
            },
        }
    }

    /// Apply the registered template (if any) to outbound messages.
    fn templated_messages(&self, model: &str, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        let templates = self.templates.lock().unwrap();
        let Some(template) = templates.get(model) else {
            return messages.to_vec();
        };

        messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.clone(),
                content: template.apply(&m.role, &m.content),
            })
            .collect()
    }
}

impl Default for RouterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionClient for RouterClient {
    fn detect_provider(&self, model: &str) -> Result<String, CompletionError> {
        Self::resolve(model).map(|(route, _)| route.provider.to_string())
    }

    fn register_template(&self, model: &str, template: PromptTemplate) {
        self.templates
            .lock()
            .unwrap()
            .insert(model.to_string(), template);
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<ChatCompletion, CompletionError> {
        let (route, remote_model) = Self::resolve(&request.model)?;

        let api_key = if route.key_env.is_empty() {
            None
        } else {
            Some(
                std::env::var(route.key_env)
                    .map_err(|_| CompletionError::MissingApiKey(route.key_env.to_string()))?,
            )
        };

        let api_request = ApiRequest {
            model: remote_model,
            max_tokens: request.max_tokens,
            messages: self.templated_messages(&request.model, &request.messages),
            options: request.options,
        };

        let url = format!("{}/chat/completions", route.base_url);
        let mut builder = self.client.post(&url).json(&api_request);
        if let Some(key) = api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| CompletionError::Transport {
            provider: route.provider.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| CompletionError::Transport {
            provider: route.provider.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(Self::api_error(route, status.as_u16(), body));
        }

        serde_json::from_str::<ChatCompletion>(&body)
            .map_err(|e| CompletionError::InvalidResponse(e.to_string()))
    }
}

// ---------- Tests ----------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_openai_by_prefix() {
        let (route, model) = RouterClient::resolve("gpt-4o-mini").unwrap();
        assert_eq!(route.provider, "openai");
        assert_eq!(model, "gpt-4o-mini");
    }

    #[test]
    fn test_resolve_mistral_by_prefix() {
        let (route, model) = RouterClient::resolve("mistral-large-latest").unwrap();
        assert_eq!(route.provider, "mistral");
        assert_eq!(model, "mistral-large-latest");
    }

    #[test]
    fn test_resolve_explicit_provider_form() {
        let (route, model) = RouterClient::resolve("groq/llama-3.3-70b-versatile").unwrap();
        assert_eq!(route.provider, "groq");
        assert_eq!(model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_resolve_explicit_form_with_nested_slash() {
        let (route, model) =
            RouterClient::resolve("openrouter/meta-llama/llama-3-70b").unwrap();
        assert_eq!(route.provider, "openrouter");
        assert_eq!(model, "meta-llama/llama-3-70b");
    }

    #[test]
    fn test_resolve_unknown_model() {
        let err = RouterClient::resolve("totally-unknown-model").unwrap_err();
        assert!(
            matches!(err, CompletionError::UnknownProvider(_)),
            "Expected UnknownProvider, got: {}",
            err
        );
    }

    #[test]
    fn test_resolve_unknown_explicit_provider() {
        let err = RouterClient::resolve("nonexistent/some-model").unwrap_err();
        assert!(matches!(err, CompletionError::UnknownProvider(_)));
    }

    #[test]
    fn test_resolve_explicit_form_empty_model() {
        // A bare "openai/" is not a usable identifier
        let err = RouterClient::resolve("openai/").unwrap_err();
        assert!(matches!(err, CompletionError::UnknownProvider(_)));
    }

    #[test]
    fn test_detect_provider() {
        let client = RouterClient::new();
        assert_eq!(client.detect_provider("gpt-4o").unwrap(), "openai");
        assert_eq!(client.detect_provider("deepseek-chat").unwrap(), "deepseek");
        assert!(client.detect_provider("not-a-model").is_err());
    }

    fn openai_route() -> &'static Route {
        ROUTES.iter().find(|r| r.provider == "openai").unwrap()
    }

    #[test]
    fn test_api_error_authentication() {
        let body = r#"{"error": {"message": "Incorrect API key provided"}}"#;
        let err = RouterClient::api_error(openai_route(), 401, body.to_string());

        assert!(matches!(err, CompletionError::AuthFailed { .. }));
        let text = err.to_string();
        assert!(text.contains("authentication failed"), "got: {}", text);
        assert!(text.contains("OPENAI_API_KEY"), "got: {}", text);
        assert!(text.contains("Incorrect API key"), "got: {}", text);
    }

    #[test]
    fn test_api_error_forbidden_is_auth() {
        let body = r#"{"error": {"message": "Project does not have access"}}"#;
        let err = RouterClient::api_error(openai_route(), 403, body.to_string());
        assert!(matches!(err, CompletionError::AuthFailed { .. }));
    }

    #[test]
    fn test_api_error_rate_limit() {
        let body = r#"{"error": {"message": "Rate limit reached for gpt-4o"}}"#;
        let err = RouterClient::api_error(openai_route(), 429, body.to_string());

        assert!(matches!(err, CompletionError::RateLimited { .. }));
        let text = err.to_string();
        assert!(text.contains("rate limit"), "got: {}", text);
        assert!(text.contains("Rate limit reached"), "got: {}", text);
    }

    #[test]
    fn test_api_error_other_status() {
        let body = r#"{"error": {"message": "The server had an error"}}"#;
        let err = RouterClient::api_error(openai_route(), 500, body.to_string());

        match err {
            CompletionError::Api { status, message, .. } => {
                assert_eq!(status, 500);
                assert_eq!(message, "The server had an error");
            }
            other => panic!("Expected Api error, got: {}", other),
        }
    }

    #[test]
    fn test_api_error_unparseable_body_falls_back_to_raw() {
        let err = RouterClient::api_error(openai_route(), 502, "Bad Gateway".to_string());
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_passthrough_template_leaves_messages_untouched() {
        let client = RouterClient::new();
        client.register_template("gpt-4o", PromptTemplate::passthrough());

        let messages = vec![ChatMessage::user("hello")];
        let templated = client.templated_messages("gpt-4o", &messages);
        assert_eq!(templated.len(), 1);
        assert_eq!(templated[0].content, "hello");
        assert_eq!(templated[0].role, "user");
    }

    #[test]
    fn test_custom_template_wraps_user_messages() {
        let client = RouterClient::new();
        client.register_template(
            "gpt-4o",
            PromptTemplate::passthrough().with_role("user", "<q>", "</q>"),
        );

        let messages = vec![ChatMessage::user("hello")];
        let templated = client.templated_messages("gpt-4o", &messages);
        assert_eq!(templated[0].content, "<q>hello</q>");
    }

    #[test]
    fn test_no_template_registered() {
        let client = RouterClient::new();
        let messages = vec![ChatMessage::user("hello")];
        let templated = client.templated_messages("gpt-4o", &messages);
        assert_eq!(templated[0].content, "hello");
    }
}
