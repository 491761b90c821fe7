//! Core type definitions for synthesis runs

use crate::{CwmError, Result};
use serde::{Deserialize, Serialize};

/// Default number of refinement rounds after the initial generation
pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Whether every player sees the whole game state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoClass {
    /// All state visible to all players (Tic-Tac-Toe, Breakthrough)
    #[default]
    Perfect,
    /// Private per-player state such as hidden cards (Kuhn poker)
    Imperfect,
}

impl InfoClass {
    /// All recognized information classes
    pub const ALL: [InfoClass; 2] = [InfoClass::Perfect, InfoClass::Imperfect];

    /// Key used in config files and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            InfoClass::Perfect => "perfect",
            InfoClass::Imperfect => "imperfect",
        }
    }
}

impl std::fmt::Display for InfoClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for InfoClass {
    type Err = CwmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "perfect" => Ok(InfoClass::Perfect),
            "imperfect" => Ok(InfoClass::Imperfect),
            _ => {
                let expected: Vec<&str> = InfoClass::ALL.iter().map(|c| c.key()).collect();
                Err(CwmError::Config(format!(
                    "Unsupported information class '{}'. Expected one of {:?}.",
                    s, expected
                )))
            }
        }
    }
}

/// Everything one synthesis run needs. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Game identifier, e.g. `kuhn_poker`
    pub game: String,
    /// Natural-language rules text
    pub rules: String,
    /// Test-suite source the candidate must pass
    pub tests: String,
    /// Selects the initial prompt template
    pub info_class: InfoClass,
    /// Refinement rounds allowed after the first generation
    pub max_retries: usize,
}

impl SynthesisRequest {
    pub fn new(
        game: impl Into<String>,
        rules: impl Into<String>,
        tests: impl Into<String>,
        info_class: InfoClass,
    ) -> Self {
        Self {
            game: game.into(),
            rules: rules.into(),
            tests: tests.into(),
            info_class,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Build a request from a string-keyed information class.
    ///
    /// Unknown keys fail with [`CwmError::Config`]; this is a caller error
    /// and is never retried.
    pub fn parse(
        game: impl Into<String>,
        rules: impl Into<String>,
        tests: impl Into<String>,
        info_class: &str,
    ) -> Result<Self> {
        let info_class = info_class.parse::<InfoClass>()?;
        Ok(Self::new(game, rules, tests, info_class))
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Upper bound on generator invocations for this request
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }
}

/// Outcome of running one candidate against the test suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionVerdict {
    pub success: bool,
    /// Full failure trace; empty on success
    pub diagnostic: String,
}

impl ExecutionVerdict {
    /// A passing verdict
    pub fn pass() -> Self {
        Self {
            success: true,
            diagnostic: String::new(),
        }
    }

    /// A failing verdict carrying its trace
    pub fn fail(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostic: diagnostic.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_class_from_str() {
        assert_eq!("perfect".parse::<InfoClass>().unwrap(), InfoClass::Perfect);
        assert_eq!(
            "  Imperfect ".parse::<InfoClass>().unwrap(),
            InfoClass::Imperfect
        );
        assert_eq!("PERFECT".parse::<InfoClass>().unwrap(), InfoClass::Perfect);
    }

    #[test]
    fn test_info_class_unknown_is_config_error() {
        let err = "partial".parse::<InfoClass>().unwrap_err();
        assert!(matches!(err, CwmError::Config(_)));
        let msg = err.to_string();
        assert!(msg.contains("partial"));
        assert!(msg.contains("perfect"));
        assert!(msg.contains("imperfect"));
    }

    #[test]
    fn test_info_class_display_roundtrips_key() {
        for class in InfoClass::ALL {
            assert_eq!(class.to_string().parse::<InfoClass>().unwrap(), class);
        }
    }

    #[test]
    fn test_request_defaults() {
        let request = SynthesisRequest::new("tic_tac_toe", "rules", "tests", InfoClass::Perfect);
        assert_eq!(request.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(request.max_attempts(), 3);

        let request = request.with_max_retries(0);
        assert_eq!(request.max_attempts(), 1);
    }

    #[test]
    fn test_max_attempts_saturates() {
        let request = SynthesisRequest::new("g", "r", "t", InfoClass::Perfect)
            .with_max_retries(usize::MAX);
        assert_eq!(request.max_attempts(), usize::MAX);
    }

    #[test]
    fn test_request_parse_rejects_unknown_class() {
        let result = SynthesisRequest::parse("kuhn_poker", "rules", "tests", "hidden");
        assert!(matches!(result, Err(CwmError::Config(_))));

        let request = SynthesisRequest::parse("kuhn_poker", "rules", "tests", "imperfect").unwrap();
        assert_eq!(request.info_class, InfoClass::Imperfect);
    }

    #[test]
    fn test_verdict_constructors() {
        assert!(ExecutionVerdict::pass().success);
        assert!(ExecutionVerdict::pass().diagnostic.is_empty());

        let verdict = ExecutionVerdict::fail("Traceback ...");
        assert!(!verdict.success);
        assert_eq!(verdict.diagnostic, "Traceback ...");
    }
}
