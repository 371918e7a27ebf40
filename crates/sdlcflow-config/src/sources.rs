use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Default).as_str().to_string()
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    ///
    /// Keys are dotted TOML paths (`workflow.max_steps`, `phases.design.model`).
    /// Optional values that are unset are omitted.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: &str, value: Option<String>| {
            if let Some(val) = value {
                let source = source_label(self.source_attribution.get(key));
                config.insert(key.to_string(), (val, source));
            }
        };

        add_config("app.name", Some(self.app.name.clone()));
        add_config("app.environment", Some(self.app.environment.clone()));
        add_config("llm.provider", Some(self.llm.provider.clone()));
        add_config("llm.model", Some(self.llm.model.clone()));
        add_config("llm.timeout_secs", Some(self.llm.timeout_secs.to_string()));
        add_config("llm.stub_response", self.llm.stub_response.clone());
        add_config(
            "llm.openai.api_key_env",
            Some(self.llm.openai.api_key_env.clone()),
        );
        add_config("llm.openai.base_url", Some(self.llm.openai.base_url.clone()));
        add_config(
            "llm.openai.temperature",
            Some(self.llm.openai.temperature.to_string()),
        );
        add_config(
            "llm.openai.max_tokens",
            self.llm.openai.max_tokens.map(|t| t.to_string()),
        );
        add_config("workflow.max_steps", Some(self.workflow.max_steps.to_string()));
        add_config(
            "workflow.history_window",
            Some(self.workflow.history_window.to_string()),
        );
        add_config(
            "observability.enabled",
            Some(self.observability.enabled.to_string()),
        );

        for (phase, phase_config) in &self.phases {
            add_config(&format!("phases.{phase}.model"), phase_config.model.clone());
            add_config(
                &format!("phases.{phase}.timeout_secs"),
                phase_config.timeout_secs.map(|t| t.to_string()),
            );
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhaseConfig;
    use sdlcflow_utils::types::Phase;

    #[test]
    fn test_effective_config_reports_defaults() {
        let effective = Config::default().effective_config();

        let (value, source) = &effective["workflow.max_steps"];
        assert_eq!(value, "50");
        assert_eq!(source, "default");
        assert!(!effective.contains_key("llm.stub_response"));
    }

    #[test]
    fn test_effective_config_includes_phase_overrides() {
        let mut cfg = Config::default();
        cfg.phases.insert(
            Phase::Testing,
            PhaseConfig {
                model: Some("gpt-4o".to_string()),
                timeout_secs: None,
            },
        );
        cfg.source_attribution
            .insert("phases.testing.model".to_string(), ConfigSource::Config);

        let effective = cfg.effective_config();
        assert_eq!(
            effective["phases.testing.model"],
            ("gpt-4o".to_string(), "config".to_string())
        );
        assert!(!effective.contains_key("phases.testing.timeout_secs"));
    }
}
