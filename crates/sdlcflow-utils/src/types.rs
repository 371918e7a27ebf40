use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Phase identifiers for the SDLC pipeline.
///
/// Phases execute in a fixed order:
///
/// ```text
/// Intake → Analysis → Design → Implementation → Testing → Deployment → Retrospective
/// ```
///
/// A workflow that has finished the last phase has no current phase; everywhere a phase
/// may be terminal it is carried as `Option<Phase>` and `None` means "completed".
///
/// # Example
///
/// ```rust
/// use sdlcflow_utils::types::Phase;
///
/// assert_eq!(Phase::first(), Phase::Intake);
/// assert_eq!(Phase::Intake.next(), Some(Phase::Analysis));
/// assert_eq!(Phase::Retrospective.next(), None);
/// assert_eq!(Phase::Design.as_str(), "design");
/// ```
///
/// # Serialization
///
/// `Phase` serializes to its lowercase name (e.g. `"intake"`, `"retrospective"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Requirement intake: capture goals, constraints and open questions.
    Intake,
    /// Solution analysis: domain concepts, risks and architecture style.
    Analysis,
    /// Solution design: components, data model and API contracts.
    Design,
    /// Implementation guidance: scaffolding, libraries and practices.
    Implementation,
    /// Testing strategy: unit, integration and functional coverage.
    Testing,
    /// Deployment and release plan.
    Deployment,
    /// Retrospective over the whole engagement. Last phase of the pipeline.
    Retrospective,
}

impl Phase {
    /// Number of phases in the pipeline.
    pub const COUNT: usize = 7;

    /// All phases in pipeline order.
    pub const ALL: [Phase; Self::COUNT] = [
        Phase::Intake,
        Phase::Analysis,
        Phase::Design,
        Phase::Implementation,
        Phase::Testing,
        Phase::Deployment,
        Phase::Retrospective,
    ];

    /// The phase every workflow starts in.
    #[must_use]
    pub const fn first() -> Self {
        Phase::Intake
    }

    /// Canonical lowercase name used in history, views and CLI output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Analysis => "analysis",
            Self::Design => "design",
            Self::Implementation => "implementation",
            Self::Testing => "testing",
            Self::Deployment => "deployment",
            Self::Retrospective => "retrospective",
        }
    }

    /// Zero-based position in the pipeline order.
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Successor in the fixed order, or `None` after the last phase.
    #[must_use]
    pub const fn next(&self) -> Option<Phase> {
        match self {
            Self::Intake => Some(Self::Analysis),
            Self::Analysis => Some(Self::Design),
            Self::Design => Some(Self::Implementation),
            Self::Implementation => Some(Self::Testing),
            Self::Testing => Some(Self::Deployment),
            Self::Deployment => Some(Self::Retrospective),
            Self::Retrospective => None,
        }
    }

    /// Whether this is the last phase of the pipeline.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        matches!(self, Self::Retrospective)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == needle)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "phase".to_string(),
                value: format!(
                    "Unknown phase '{s}'. Expected one of: {}",
                    Phase::ALL.map(|p| p.as_str()).join(", ")
                ),
            })
    }
}

/// Generation metadata attached to a handler result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_input: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_output: Option<u64>,
}

/// Source of a configuration value.
///
/// Precedence chain: CLI arguments > config file > programmatic > built-in defaults.
/// Serializes to `"cli"`, `"config"`, `"programmatic"` or `"default"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Cli,
    Config,
    Programmatic,
    Default,
}

impl ConfigSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cli => "cli",
            Self::Config => "config",
            Self::Programmatic => "programmatic",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_phase_order_is_fixed() {
        let mut walked = vec![Phase::first()];
        while let Some(next) = walked.last().and_then(Phase::next) {
            walked.push(next);
        }
        assert_eq!(walked, Phase::ALL.to_vec());
    }

    #[test]
    fn test_only_retrospective_is_last() {
        for phase in Phase::ALL {
            assert_eq!(phase.is_last(), phase.next().is_none(), "{phase}");
        }
        assert!(Phase::Retrospective.is_last());
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        let json = serde_json::to_string(&Phase::Implementation).unwrap();
        assert_eq!(json, "\"implementation\"");

        let terminal: Option<Phase> = None;
        assert_eq!(serde_json::to_string(&terminal).unwrap(), "null");

        let parsed: Phase = serde_json::from_str("\"deployment\"").unwrap();
        assert_eq!(parsed, Phase::Deployment);
    }

    #[test]
    fn test_phase_from_str_is_case_insensitive() {
        assert_eq!("Design".parse::<Phase>().unwrap(), Phase::Design);
        assert_eq!(" TESTING ".parse::<Phase>().unwrap(), Phase::Testing);
    }

    #[test]
    fn test_phase_from_str_rejects_unknown() {
        let err = "review".parse::<Phase>().unwrap_err();
        assert!(err.to_string().contains("Unknown phase 'review'"));
    }

    proptest! {
        #[test]
        fn prop_next_advances_index_by_one(idx in 0usize..7) {
            let phase = Phase::ALL[idx];
            match phase.next() {
                Some(next) => prop_assert_eq!(next.index(), idx + 1),
                None => prop_assert_eq!(idx, Phase::ALL.len() - 1),
            }
        }

        #[test]
        fn prop_as_str_round_trips(idx in 0usize..7) {
            let phase = Phase::ALL[idx];
            prop_assert_eq!(phase.as_str().parse::<Phase>().unwrap(), phase);
        }
    }
}
