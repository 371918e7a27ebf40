use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use sdlcflow_utils::error::ConfigError;
use sdlcflow_utils::types::Phase;

use super::{CliArgs, Config, ConfigSource, PhaseConfig};

/// Directory searched for upward from the working directory
pub const CONFIG_DIR: &str = ".sdlcflow";

/// File name inside [`CONFIG_DIR`]
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SDLCFLOW_CONFIG";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    app: Option<TomlApp>,
    llm: Option<TomlLlm>,
    workflow: Option<TomlWorkflow>,
    observability: Option<TomlObservability>,
    phases: Option<BTreeMap<String, TomlPhase>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlApp {
    name: Option<String>,
    environment: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlLlm {
    provider: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    stub_response: Option<String>,
    openai: Option<TomlOpenAi>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlOpenAi {
    api_key_env: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlWorkflow {
    max_steps: Option<usize>,
    history_window: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlObservability {
    enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlPhase {
    model: Option<String>,
    timeout_secs: Option<u64>,
}

/// Overwrite `$target` with `$value` when present and record `$source` for `$key`.
macro_rules! apply {
    ($attr:expr, $source:expr, $key:literal, $target:expr, $value:expr) => {
        if let Some(value) = $value {
            $target = value;
            $attr.insert($key.to_string(), $source.clone());
        }
    };
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for config file discovery when neither
    /// `--config` nor `SDLCFLOW_CONFIG` names a file.
    pub fn discover(cli_args: &CliArgs) -> Result<Self, ConfigError> {
        let start_dir = std::env::current_dir().map_err(|e| ConfigError::DiscoveryFailed {
            reason: format!("Failed to get current directory: {e}"),
        })?;
        Self::discover_from(&start_dir, cli_args, std::env::var_os(CONFIG_ENV_VAR))
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid process-global state:
    /// the value of `SDLCFLOW_CONFIG` is passed in rather than read.
    pub fn discover_from(
        start_dir: &Path,
        cli_args: &CliArgs,
        env_config: Option<OsString>,
    ) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = Self::resolve_config_path(start_dir, cli_args, env_config)? {
            tracing::debug!(path = %path.display(), "Loading configuration file");
            let file_config = Self::load_config_file(&path)?;
            config.apply_file(file_config)?;
        }

        config.apply_cli(cli_args);
        config.validate()?;
        Ok(config)
    }

    /// Pick the config file: `--config`, then `SDLCFLOW_CONFIG`, then upward search.
    ///
    /// An explicitly named file that does not exist is an error; a missing
    /// discovered file simply means "defaults only".
    pub fn resolve_config_path(
        start_dir: &Path,
        cli_args: &CliArgs,
        env_config: Option<OsString>,
    ) -> Result<Option<PathBuf>, ConfigError> {
        let explicit = cli_args
            .config_path
            .clone()
            .or_else(|| env_config.filter(|v| !v.is_empty()).map(PathBuf::from));

        match explicit {
            Some(path) if path.is_file() => Ok(Some(path)),
            Some(path) => Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }),
            None => Ok(Self::discover_config_file_from(start_dir)),
        }
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.sdlcflow/config.toml`, stopping
    /// at repository root markers (.git, .hg, .svn) or the filesystem root.
    #[must_use]
    pub fn discover_config_file_from(start_dir: &Path) -> Option<PathBuf> {
        let mut current_dir = Some(start_dir);

        while let Some(dir) = current_dir {
            let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.is_file() {
                return Some(config_path);
            }

            if dir.join(".git").exists() || dir.join(".hg").exists() || dir.join(".svn").exists()
            {
                break;
            }

            current_dir = dir.parent();
        }

        None
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidFile(format!("Failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            ConfigError::InvalidFile(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    fn apply_file(&mut self, file: TomlConfig) -> Result<(), ConfigError> {
        let source = ConfigSource::Config;
        let attr = &mut self.source_attribution;

        if let Some(app) = file.app {
            apply!(attr, source, "app.name", self.app.name, app.name);
            apply!(attr, source, "app.environment", self.app.environment, app.environment);
        }

        if let Some(llm) = file.llm {
            apply!(attr, source, "llm.provider", self.llm.provider, llm.provider);
            apply!(attr, source, "llm.model", self.llm.model, llm.model);
            apply!(attr, source, "llm.timeout_secs", self.llm.timeout_secs, llm.timeout_secs);
            apply!(
                attr,
                source,
                "llm.stub_response",
                self.llm.stub_response,
                llm.stub_response.map(Some)
            );

            if let Some(openai) = llm.openai {
                let target = &mut self.llm.openai;
                apply!(attr, source, "llm.openai.api_key_env", target.api_key_env, openai.api_key_env);
                apply!(attr, source, "llm.openai.base_url", target.base_url, openai.base_url);
                apply!(attr, source, "llm.openai.temperature", target.temperature, openai.temperature);
                apply!(
                    attr,
                    source,
                    "llm.openai.max_tokens",
                    target.max_tokens,
                    openai.max_tokens.map(Some)
                );
            }
        }

        if let Some(workflow) = file.workflow {
            apply!(attr, source, "workflow.max_steps", self.workflow.max_steps, workflow.max_steps);
            apply!(
                attr,
                source,
                "workflow.history_window",
                self.workflow.history_window,
                workflow.history_window
            );
        }

        if let Some(observability) = file.observability {
            apply!(
                attr,
                source,
                "observability.enabled",
                self.observability.enabled,
                observability.enabled
            );
        }

        for (name, phase_config) in file.phases.unwrap_or_default() {
            let phase: Phase = name.parse().map_err(|_| ConfigError::InvalidValue {
                key: format!("phases.{name}"),
                value: format!(
                    "unknown phase; expected one of: {}",
                    Phase::ALL.map(|p| p.as_str()).join(", ")
                ),
            })?;

            if phase_config.model.is_some() {
                attr.insert(format!("phases.{phase}.model"), source.clone());
            }
            if phase_config.timeout_secs.is_some() {
                attr.insert(format!("phases.{phase}.timeout_secs"), source.clone());
            }
            self.phases.insert(
                phase,
                PhaseConfig {
                    model: phase_config.model,
                    timeout_secs: phase_config.timeout_secs,
                },
            );
        }

        Ok(())
    }

    fn apply_cli(&mut self, cli_args: &CliArgs) {
        let source = ConfigSource::Cli;
        let attr = &mut self.source_attribution;

        apply!(attr, source, "llm.provider", self.llm.provider, cli_args.llm_provider.clone());
        apply!(attr, source, "llm.model", self.llm.model, cli_args.model.clone());
        apply!(attr, source, "llm.timeout_secs", self.llm.timeout_secs, cli_args.timeout_secs);
        apply!(attr, source, "workflow.max_steps", self.workflow.max_steps, cli_args.max_steps);
        apply!(
            attr,
            source,
            "workflow.history_window",
            self.workflow.history_window,
            cli_args.history_window
        );
        apply!(
            attr,
            source,
            "observability.enabled",
            self.observability.enabled,
            cli_args.observability
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_MAX_STEPS, DEFAULT_MODEL};
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let config_dir = dir.join(CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join(CONFIG_FILE);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();

        let config = Config::discover_from(temp.path(), &CliArgs::default(), None).unwrap();

        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.workflow.max_steps, DEFAULT_MAX_STEPS);
        assert_eq!(
            config.source_attribution.get("llm.model"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_upward_discovery_from_nested_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(
            temp.path(),
            r#"
[llm]
provider = "stub"

[workflow]
max_steps = 12

[phases.design]
model = "gpt-4o"
"#,
        );
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested, &CliArgs::default(), None).unwrap();

        assert_eq!(config.llm.provider, "stub");
        assert_eq!(config.workflow.max_steps, 12);
        assert_eq!(config.model_for_phase(Phase::Design), "gpt-4o");
        assert_eq!(
            config.source_attribution.get("workflow.max_steps"),
            Some(&ConfigSource::Config)
        );
        assert_eq!(
            config.source_attribution.get("phases.design.model"),
            Some(&ConfigSource::Config)
        );
    }

    #[test]
    fn test_search_stops_at_repository_root() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "[llm]\nprovider = \"stub\"\n");
        let repo = temp.path().join("repo");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert_eq!(Config::discover_config_file_from(&repo), None);
    }

    #[test]
    fn test_cli_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "[workflow]\nhistory_window = 8\n");
        let cli = CliArgs {
            config_path: Some(path),
            history_window: Some(3),
            llm_provider: Some("stub".to_string()),
            ..CliArgs::default()
        };

        let config = Config::discover_from(temp.path(), &cli, None).unwrap();

        assert_eq!(config.workflow.history_window, 3);
        assert_eq!(
            config.source_attribution.get("workflow.history_window"),
            Some(&ConfigSource::Cli)
        );
        assert_eq!(config.llm.provider, "stub");
    }

    #[test]
    fn test_env_config_path_is_used() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        fs::write(&path, "[app]\nenvironment = \"staging\"\n").unwrap();

        let config = Config::discover_from(
            temp.path(),
            &CliArgs::default(),
            Some(path.into_os_string()),
        )
        .unwrap();

        assert_eq!(config.app.environment, "staging");
    }

    #[test]
    fn test_explicit_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let cli = CliArgs {
            config_path: Some(temp.path().join("missing.toml")),
            ..CliArgs::default()
        };

        let err = Config::discover_from(temp.path(), &cli, None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_malformed_toml_is_invalid_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[workflow\nmax_steps = ");

        let err = Config::discover_from(temp.path(), &CliArgs::default(), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFile(_)));
    }

    #[test]
    fn test_unknown_phase_section_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[phases.review]\nmodel = \"x\"\n");

        let err = Config::discover_from(temp.path(), &CliArgs::default(), None).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "phases.review"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_file_values_are_validated() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[workflow]\nmax_steps = 0\n");

        let err = Config::discover_from(temp.path(), &CliArgs::default(), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
