use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use sdlcflow_utils::types::{ConfigSource, Phase};

/// Default application name reported in logs
pub const DEFAULT_APP_NAME: &str = "SDLC Agent Platform";

/// Default deployment environment label
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Default LLM provider selection (`openai` when a key is present, else `stub`)
pub const DEFAULT_PROVIDER: &str = "auto";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default per-invocation timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Environment variable holding the OpenAI API key
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// OpenAI chat completions endpoint
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default bound on consecutive phase steps inside one advance
pub const DEFAULT_MAX_STEPS: usize = 50;

/// Default number of history messages summarised into handler input
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Providers accepted by `[llm].provider`
pub const KNOWN_PROVIDERS: [&str; 3] = ["auto", "openai", "stub"];

/// Configuration for sdlcflow.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > config file > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI-like behavior that:
/// - Honors an explicit `--config` path
/// - Respects the `SDLCFLOW_CONFIG` environment variable
/// - Searches for `.sdlcflow/config.toml` upward from the current directory
/// - Applies built-in defaults for unspecified values
///
/// # Programmatic Configuration
///
/// For embedding scenarios that must not depend on the user's environment, use
/// [`Config::builder()`] or [`Config::default()`].
///
/// # Source Attribution
///
/// Each configuration value tracks its source (`cli`, `config`, `programmatic`, or `default`)
/// for debugging and display.
///
/// # Example
///
/// ```rust,no_run
/// use sdlcflow_config::{CliArgs, Config};
///
/// let config = Config::discover(&CliArgs::default())?;
/// println!("Model: {}", config.llm.model);
/// println!("Max steps: {}", config.workflow.max_steps);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub app: AppConfig,
    pub llm: LlmConfig,
    pub workflow: WorkflowConfig,
    pub observability: ObservabilityConfig,
    /// Per-phase overrides keyed by phase
    pub phases: BTreeMap<Phase, PhaseConfig>,
    #[serde(skip)]
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// `[app]` section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: String,
}

/// `[llm]` section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmConfig {
    /// `auto`, `openai` or `stub`
    pub provider: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Message returned by the stub backend; `None` uses the built-in text
    pub stub_response: Option<String>,
    pub openai: OpenAiConfig,
}

/// `[llm.openai]` section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiConfig {
    /// Name of the environment variable holding the API key (never the key itself)
    pub api_key_env: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// `[workflow]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowConfig {
    /// Bound on consecutive handler executions within one advance
    pub max_steps: usize,
    /// Number of trailing history messages rendered into handler input
    pub history_window: usize,
}

/// `[observability]` section
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ObservabilityConfig {
    pub enabled: bool,
}

/// `[phases.<name>]` section
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PhaseConfig {
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_APP_NAME.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            stub_response: None,
            openai: OpenAiConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

/// Keys that always carry a value and therefore always have a source.
pub(crate) const ATTRIBUTED_KEYS: [&str; 13] = [
    "app.name",
    "app.environment",
    "llm.provider",
    "llm.model",
    "llm.timeout_secs",
    "llm.stub_response",
    "llm.openai.api_key_env",
    "llm.openai.base_url",
    "llm.openai.temperature",
    "llm.openai.max_tokens",
    "workflow.max_steps",
    "workflow.history_window",
    "observability.enabled",
];

impl Default for Config {
    /// Built-in defaults, every key attributed to [`ConfigSource::Default`].
    fn default() -> Self {
        let source_attribution = ATTRIBUTED_KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();

        Self {
            app: AppConfig::default(),
            llm: LlmConfig::default(),
            workflow: WorkflowConfig::default(),
            observability: ObservabilityConfig::default(),
            phases: BTreeMap::new(),
            source_attribution,
        }
    }
}
