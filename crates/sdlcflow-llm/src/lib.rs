//! LLM backend abstraction for sdlcflow
//!
//! Phase handlers generate text through the [`LlmBackend`] trait. Two providers ship
//! with the crate: an OpenAI-compatible HTTP backend and a deterministic stub used
//! offline and in tests.

pub(crate) mod http_client;
mod openai_backend;
mod stub_backend;
mod types;

use std::sync::Arc;

use tracing::warn;

pub use sdlcflow_utils::error::LlmError;
pub use stub_backend::{DEFAULT_STUB_RESPONSE, StubBackend};
pub use types::{LlmBackend, LlmFallbackInfo, LlmInvocation, LlmResult, Message, Role};

use openai_backend::OpenAiBackend;
use sdlcflow_config::Config;

fn construct_stub(config: &Config) -> Arc<dyn LlmBackend> {
    let backend = match &config.llm.stub_response {
        Some(text) => StubBackend::new(text.clone()),
        None => StubBackend::default(),
    };
    Arc::new(backend)
}

fn construct_openai(config: &Config, api_key: Option<String>) -> Result<Arc<dyn LlmBackend>, LlmError> {
    let env_name = &config.llm.openai.api_key_env;
    let api_key = api_key.ok_or_else(|| {
        LlmError::Misconfiguration(format!(
            "OpenAI API key not found in environment variable '{env_name}'. \
             Set it or choose provider = \"stub\" in [llm]."
        ))
    })?;
    Ok(Arc::new(OpenAiBackend::new_from_config(config, api_key)?))
}

/// Create an LLM backend from configuration, reading the API key from the process
/// environment.
///
/// ## Providers
///
/// - **`openai`**: OpenAI-compatible HTTP API; the API key must be set.
/// - **`stub`**: deterministic offline responses.
/// - **`auto`** (default): `openai` when the API key variable is set, otherwise `stub`.
///   The fallback is reported through the returned [`LlmFallbackInfo`].
///
/// # Errors
///
/// Returns `LlmError::Unsupported` for an unknown provider and
/// `LlmError::Misconfiguration` when `openai` is requested without a key.
pub fn from_config(
    config: &Config,
) -> Result<(Arc<dyn LlmBackend>, Option<LlmFallbackInfo>), LlmError> {
    from_config_with_env(config, |name| std::env::var(name).ok())
}

/// [`from_config`] with an injectable environment lookup.
pub fn from_config_with_env<F>(
    config: &Config,
    lookup: F,
) -> Result<(Arc<dyn LlmBackend>, Option<LlmFallbackInfo>), LlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = lookup(&config.llm.openai.api_key_env).filter(|key| !key.trim().is_empty());

    match config.llm.provider.as_str() {
        "openai" => Ok((construct_openai(config, api_key)?, None)),
        "stub" => Ok((construct_stub(config), None)),
        "auto" if api_key.is_some() => Ok((construct_openai(config, api_key)?, None)),
        "auto" => {
            let reason = format!(
                "environment variable '{}' is not set",
                config.llm.openai.api_key_env
            );
            warn!(
                requested = "auto",
                selected = "stub",
                reason = %reason,
                "No LLM credentials found, using the stub backend"
            );
            Ok((
                construct_stub(config),
                Some(LlmFallbackInfo {
                    requested_provider: "auto".to_string(),
                    selected_provider: "stub".to_string(),
                    reason,
                }),
            ))
        }
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown LLM provider '{unknown}'. Supported providers: auto, openai, stub."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdlcflow_utils::types::Phase;
    use std::time::Duration;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[tokio::test]
    async fn test_auto_falls_back_to_stub_without_key() {
        let config = Config::default();
        let (backend, fallback) = from_config_with_env(&config, no_env).unwrap();

        assert_eq!(backend.provider_name(), "stub");
        let fallback = fallback.unwrap();
        assert_eq!(fallback.selected_provider, "stub");
        assert!(fallback.reason.contains("OPENAI_API_KEY"));

        let inv = LlmInvocation::new(
            "wf",
            Phase::Intake,
            "gpt-4o-mini",
            Duration::from_secs(1),
            vec![],
        );
        let result = backend.invoke(inv).await.unwrap();
        assert_eq!(result.raw_response, DEFAULT_STUB_RESPONSE);
    }

    #[test]
    fn test_stub_uses_configured_response() {
        let config = Config::builder()
            .provider("stub")
            .stub_response("canned")
            .build()
            .unwrap();
        let (backend, fallback) = from_config_with_env(&config, no_env).unwrap();
        assert_eq!(backend.provider_name(), "stub");
        assert!(fallback.is_none());
    }

    #[test]
    fn test_openai_without_key_is_misconfiguration() {
        let config = Config::builder().provider("openai").build().unwrap();
        let err = from_config_with_env(&config, no_env).err().unwrap();
        assert!(matches!(err, LlmError::Misconfiguration(_)));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = Config::default();
        let (backend, fallback) =
            from_config_with_env(&config, |_| Some("   ".to_string())).unwrap();
        assert_eq!(backend.provider_name(), "stub");
        assert!(fallback.is_some());
    }

    #[test]
    fn test_unknown_provider_is_unsupported() {
        let mut config = Config::default();
        config.llm.provider = "bard".to_string();
        let err = from_config_with_env(&config, no_env).err().unwrap();
        assert!(matches!(err, LlmError::Unsupported(_)));
    }
}
