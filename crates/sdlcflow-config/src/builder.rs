use std::collections::BTreeMap;
use std::time::Duration;

use sdlcflow_utils::error::ConfigError;
use sdlcflow_utils::types::Phase;

use super::{Config, ConfigSource, PhaseConfig};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when you need to configure sdlcflow without relying on
    /// environment variables or config files.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sdlcflow_config::Config;
    /// use sdlcflow_utils::types::Phase;
    ///
    /// let config = Config::builder()
    ///     .provider("stub")
    ///     .max_steps(10)
    ///     .phase_model(Phase::Design, "gpt-4o")
    ///     .build()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.model_for_phase(Phase::Design), "gpt-4o");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration of sdlcflow.
///
/// All values set via the builder are attributed to `ConfigSource::Programmatic`
/// in the resulting `Config`'s source attribution map. Unset values keep their
/// built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    provider: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
    stub_response: Option<String>,
    api_key_env: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_steps: Option<usize>,
    history_window: Option<usize>,
    observability: Option<bool>,
    phase_models: BTreeMap<Phase, String>,
}

impl ConfigBuilder {
    /// Create a new `ConfigBuilder` with no values set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// LLM provider: `auto`, `openai` or `stub`.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Global default model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Per-invocation timeout. Sub-second precision is truncated.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Text returned by the stub backend.
    #[must_use]
    pub fn stub_response(mut self, text: impl Into<String>) -> Self {
        self.stub_response = Some(text.into());
        self
    }

    /// Environment variable that holds the OpenAI API key.
    #[must_use]
    pub fn api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = Some(name.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Bound on consecutive phase steps within one advance.
    #[must_use]
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Number of history messages rendered into handler input.
    #[must_use]
    pub fn history_window(mut self, window: usize) -> Self {
        self.history_window = Some(window);
        self
    }

    #[must_use]
    pub fn observability(mut self, enabled: bool) -> Self {
        self.observability = Some(enabled);
        self
    }

    /// Override the model for a single phase.
    #[must_use]
    pub fn phase_model(mut self, phase: Phase, model: impl Into<String>) -> Self {
        self.phase_models.insert(phase, model.into());
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = Config::default();
        let source = ConfigSource::Programmatic;
        let attr = &mut config.source_attribution;

        let mut set = |key: &str| {
            attr.insert(key.to_string(), source.clone());
        };

        if let Some(provider) = self.provider {
            config.llm.provider = provider;
            set("llm.provider");
        }
        if let Some(model) = self.model {
            config.llm.model = model;
            set("llm.model");
        }
        if let Some(timeout) = self.timeout {
            config.llm.timeout_secs = timeout.as_secs();
            set("llm.timeout_secs");
        }
        if let Some(text) = self.stub_response {
            config.llm.stub_response = Some(text);
            set("llm.stub_response");
        }
        if let Some(name) = self.api_key_env {
            config.llm.openai.api_key_env = name;
            set("llm.openai.api_key_env");
        }
        if let Some(url) = self.base_url {
            config.llm.openai.base_url = url;
            set("llm.openai.base_url");
        }
        if let Some(temperature) = self.temperature {
            config.llm.openai.temperature = temperature;
            set("llm.openai.temperature");
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.openai.max_tokens = Some(max_tokens);
            set("llm.openai.max_tokens");
        }
        if let Some(max_steps) = self.max_steps {
            config.workflow.max_steps = max_steps;
            set("workflow.max_steps");
        }
        if let Some(window) = self.history_window {
            config.workflow.history_window = window;
            set("workflow.history_window");
        }
        if let Some(enabled) = self.observability {
            config.observability.enabled = enabled;
            set("observability.enabled");
        }
        for (phase, model) in self.phase_models {
            set(&format!("phases.{phase}.model"));
            config.phases.entry(phase).or_insert_with(PhaseConfig::default).model = Some(model);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_attributes_programmatic_source() {
        let config = Config::builder()
            .provider("stub")
            .history_window(2)
            .build()
            .unwrap();

        assert_eq!(config.llm.provider, "stub");
        assert_eq!(config.workflow.history_window, 2);
        assert_eq!(
            config.source_attribution.get("llm.provider"),
            Some(&ConfigSource::Programmatic)
        );
        assert_eq!(
            config.source_attribution.get("llm.model"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_builder_validates() {
        let err = Config::builder().max_steps(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_builder_phase_model() {
        let config = Config::builder()
            .model("base")
            .phase_model(Phase::Retrospective, "special")
            .build()
            .unwrap();

        assert_eq!(config.model_for_phase(Phase::Retrospective), "special");
        assert_eq!(config.model_for_phase(Phase::Intake), "base");
    }
}
