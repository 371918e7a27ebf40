//! Shared HTTP client infrastructure for HTTP-based LLM providers
//!
//! One `reqwest::Client` is built per backend and reused across invocations.
//! Requests are sent exactly once: the workflow never retries a failed phase, and
//! neither does the transport.

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

use sdlcflow_utils::error::LlmError;
use sdlcflow_utils::redaction::redact_error_message;

/// Default maximum HTTP timeout (5 minutes)
const DEFAULT_MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Client,
    max_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| {
                LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            max_timeout: DEFAULT_MAX_HTTP_TIMEOUT,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Send a request once with an effective timeout of
    /// `min(request_timeout, max_timeout)` and map failures to `LlmError`.
    pub async fn execute(
        &self,
        request_builder: reqwest::RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        let effective_timeout = request_timeout.min(self.max_timeout);

        debug!(
            provider = provider_name,
            timeout_secs = effective_timeout.as_secs(),
            "Executing HTTP request"
        );

        let response = request_builder
            .timeout(effective_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        duration: effective_timeout,
                    }
                } else {
                    LlmError::Transport(format!(
                        "{provider_name} request failed: {}",
                        redact_error_message(&e.to_string())
                    ))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(map_status(status, provider_name))
        }
    }
}

/// Map non-success HTTP status codes to LlmError variants
///
/// - 401/403 → `LlmError::ProviderAuth`
/// - 429 → `LlmError::ProviderQuota`
/// - 5xx → `LlmError::ProviderOutage`
/// - Anything else → `LlmError::Transport`
pub(crate) fn map_status(status: StatusCode, provider_name: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::ProviderAuth(format!("{provider_name} authentication failed: {status}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}"))
        }
        s if s.is_server_error() => {
            LlmError::ProviderOutage(format!("{provider_name} returned server error: {status}"))
        }
        _ => LlmError::Transport(format!("{provider_name} returned unexpected status: {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "openai"),
            LlmError::ProviderAuth(_)
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, "openai"),
            LlmError::ProviderAuth(_)
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "openai"),
            LlmError::ProviderQuota(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "openai"),
            LlmError::ProviderOutage(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_REQUEST, "openai"),
            LlmError::Transport(_)
        ));
    }
}
