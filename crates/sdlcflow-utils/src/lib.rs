pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod redaction;
pub mod types;

pub use error::{
    ConfigError, ErrorCategory, LlmError, RegistryError, SdlcError, UserFriendlyError,
    WorkflowError,
};
pub use exit_codes::ExitCode;
pub use types::{ConfigSource, LlmInfo, Phase};
