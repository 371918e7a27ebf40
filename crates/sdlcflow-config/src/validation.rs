use sdlcflow_utils::error::ConfigError;

use super::{Config, KNOWN_PROVIDERS};

fn invalid(key: &str, value: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.into(),
    }
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !KNOWN_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(invalid(
                "llm.provider",
                format!(
                    "unknown provider '{}'; expected one of: {}",
                    self.llm.provider,
                    KNOWN_PROVIDERS.join(", ")
                ),
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::MissingRequired("llm.model".to_string()));
        }

        if self.llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "must be greater than 0"));
        }

        let temperature = self.llm.openai.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(invalid(
                "llm.openai.temperature",
                format!("{temperature} is outside the range 0.0..=2.0"),
            ));
        }

        if self.llm.openai.max_tokens == Some(0) {
            return Err(invalid("llm.openai.max_tokens", "must be greater than 0"));
        }

        if self.llm.openai.api_key_env.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "llm.openai.api_key_env".to_string(),
            ));
        }

        if self.workflow.max_steps == 0 {
            return Err(invalid("workflow.max_steps", "must be at least 1"));
        }

        if self.workflow.history_window == 0 {
            return Err(invalid("workflow.history_window", "must be at least 1"));
        }

        for (phase, phase_config) in &self.phases {
            if phase_config
                .model
                .as_deref()
                .is_some_and(|m| m.trim().is_empty())
            {
                return Err(invalid(&format!("phases.{phase}.model"), "must not be empty"));
            }
            if phase_config.timeout_secs == Some(0) {
                return Err(invalid(
                    &format!("phases.{phase}.timeout_secs"),
                    "must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(err: ConfigError) -> String {
        match err {
            ConfigError::InvalidValue { key, .. } => key,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_zero_bounds() {
        let mut cfg = Config::default();
        cfg.workflow.max_steps = 0;
        assert_eq!(key_of(cfg.validate().unwrap_err()), "workflow.max_steps");

        let mut cfg = Config::default();
        cfg.workflow.history_window = 0;
        assert_eq!(key_of(cfg.validate().unwrap_err()), "workflow.history_window");
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let mut cfg = Config::default();
        cfg.llm.provider = "anthropic".to_string();
        assert_eq!(key_of(cfg.validate().unwrap_err()), "llm.provider");
    }

    #[test]
    fn test_blank_required_settings_are_missing() {
        let mut cfg = Config::default();
        cfg.llm.model = "  ".to_string();
        assert_eq!(
            cfg.validate().unwrap_err(),
            ConfigError::MissingRequired("llm.model".to_string())
        );

        let mut cfg = Config::default();
        cfg.llm.openai.api_key_env = String::new();
        assert_eq!(
            cfg.validate().unwrap_err(),
            ConfigError::MissingRequired("llm.openai.api_key_env".to_string())
        );
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let mut cfg = Config::default();
        cfg.llm.openai.temperature = 2.5;
        assert_eq!(key_of(cfg.validate().unwrap_err()), "llm.openai.temperature");
    }
}
