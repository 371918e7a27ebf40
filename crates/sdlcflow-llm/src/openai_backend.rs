//! OpenAI HTTP backend implementation
//!
//! Talks to any OpenAI-compatible `chat/completions` endpoint. The API key is read
//! from the environment variable named in `[llm.openai] api_key_env`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sdlcflow_config::Config;
use sdlcflow_utils::error::LlmError;

use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message};

const PROVIDER: &str = "openai";

/// HTTP request parameters
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HttpParams {
    pub max_tokens: Option<u32>,
    pub temperature: f32,
}

pub(crate) struct OpenAiBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl OpenAiBackend {
    /// Create a new OpenAI backend from configuration and a resolved API key.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the key is empty or the HTTP client
    /// cannot be constructed.
    pub fn new_from_config(config: &Config, api_key: String) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::Misconfiguration(format!(
                "OpenAI API key in environment variable '{}' is empty",
                config.llm.openai.api_key_env
            )));
        }

        Ok(Self {
            client: HttpClient::new()?,
            base_url: config.llm.openai.base_url.clone(),
            api_key,
            default_model: config.llm.model.clone(),
            default_params: HttpParams {
                max_tokens: config.llm.openai.max_tokens,
                temperature: config.llm.openai.temperature,
            },
        })
    }

    /// Resolve parameters for this invocation
    ///
    /// `inv.model` overrides the default model; `inv.metadata["temperature"]` and
    /// `inv.metadata["max_tokens"]` override the configured parameters.
    fn resolve_params(&self, inv: &LlmInvocation) -> (String, HttpParams) {
        resolve_params(&self.default_model, &self.default_params, inv)
    }
}

fn resolve_params(
    default_model: &str,
    defaults: &HttpParams,
    inv: &LlmInvocation,
) -> (String, HttpParams) {
    let model = if inv.model.is_empty() {
        default_model.to_string()
    } else {
        inv.model.clone()
    };

    let max_tokens = inv
        .metadata
        .get("max_tokens")
        .and_then(serde_json::Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .or(defaults.max_tokens);

    let temperature = inv
        .metadata
        .get("temperature")
        .and_then(serde_json::Value::as_f64)
        .map(|v| v as f32)
        .unwrap_or(defaults.temperature);

    (
        model,
        HttpParams {
            max_tokens,
            temperature,
        },
    )
}

fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        })
        .collect()
}

fn into_result(body: ChatResponse, model: String) -> Result<LlmResult, LlmError> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Transport("OpenAI response missing choices[0]".to_string()))?;

    let content = choice.message.content.ok_or_else(|| {
        LlmError::Transport("OpenAI response missing content in choices[0]".to_string())
    })?;

    let model_used = body.model.unwrap_or(model);
    let mut result = LlmResult::new(content, PROVIDER, model_used);
    if let Some(usage) = body.usage {
        result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
    }
    Ok(result)
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.resolve_params(&inv);

        debug!(
            provider = PROVIDER,
            workflow_id = %inv.workflow_id,
            phase = %inv.phase,
            model = %model,
            temperature = params.temperature,
            timeout_secs = inv.timeout.as_secs(),
            "Invoking OpenAI backend"
        );

        let request_body = ChatRequest {
            model: model.clone(),
            messages: convert_messages(&inv.messages),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let request = self
            .client
            .client()
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request_body);

        let response = self.client.execute(request, inv.timeout, PROVIDER).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to parse OpenAI response: {e}")))?;

        let result = into_result(body, model)?;

        debug!(
            provider = PROVIDER,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "OpenAI invocation completed"
        );

        Ok(result)
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }
}

/// OpenAI-compatible message format
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
