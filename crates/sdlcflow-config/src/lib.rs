//! Configuration management for sdlcflow
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. TOML files carry `[app]`, `[llm]`, `[llm.openai]`,
//! `[workflow]`, `[observability]` and `[phases.<name>]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use discovery::{CONFIG_DIR, CONFIG_ENV_VAR, CONFIG_FILE};
pub use model::*;
pub use sdlcflow_utils::types::ConfigSource;

use sdlcflow_utils::types::Phase;
use std::time::Duration;

impl Config {
    /// Get the model to use for a specific phase.
    ///
    /// Precedence (highest to lowest):
    /// 1. Phase-specific override (`[phases.<phase>].model`)
    /// 2. Global default (`[llm].model`)
    ///
    /// # Example
    ///
    /// ```toml
    /// [llm]
    /// model = "gpt-4o-mini"
    ///
    /// [phases.design]
    /// model = "gpt-4o"
    /// ```
    ///
    /// With the above config every phase uses `gpt-4o-mini` except design.
    #[must_use]
    pub fn model_for_phase(&self, phase: Phase) -> String {
        self.phases
            .get(&phase)
            .and_then(|pc| pc.model.clone())
            .unwrap_or_else(|| self.llm.model.clone())
    }

    /// Invocation timeout for a phase: phase override, else `[llm].timeout_secs`.
    #[must_use]
    pub fn timeout_for_phase(&self, phase: Phase) -> Duration {
        let secs = self
            .phases
            .get(&phase)
            .and_then(|pc| pc.timeout_secs)
            .unwrap_or(self.llm.timeout_secs);
        Duration::from_secs(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_for_phase_defaults_to_global() {
        let cfg = Config::default();
        for phase in Phase::ALL {
            assert_eq!(cfg.model_for_phase(phase), DEFAULT_MODEL);
        }
    }

    #[test]
    fn test_model_for_phase_with_overrides() {
        let mut cfg = Config::default();
        cfg.phases.insert(
            Phase::Design,
            PhaseConfig {
                model: Some("gpt-4o".to_string()),
                timeout_secs: Some(300),
            },
        );

        assert_eq!(cfg.model_for_phase(Phase::Design), "gpt-4o");
        assert_eq!(cfg.model_for_phase(Phase::Testing), DEFAULT_MODEL);
        assert_eq!(cfg.timeout_for_phase(Phase::Design), Duration::from_secs(300));
        assert_eq!(
            cfg.timeout_for_phase(Phase::Intake),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }
}
