use std::path::PathBuf;

/// CLI-level overrides applied on top of the config file.
///
/// Every field is optional; `None` leaves the file or default value in place.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub llm_provider: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_steps: Option<usize>,
    pub history_window: Option<usize>,
    pub observability: Option<bool>,
}
