//! Result of one synthesis run

use serde::{Deserialize, Serialize};

/// Why the refinement loop stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// A candidate passed the test suite
    Passed,
    /// Every allowed attempt failed
    RetriesExhausted,
    /// The loop reached an inconsistent state
    Aborted(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Passed => write!(f, "passed"),
            StopReason::RetriesExhausted => write!(f, "retries exhausted"),
            StopReason::Aborted(reason) => write!(f, "aborted: {}", reason),
        }
    }
}

/// Summary of a synthesis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisOutcome {
    /// Game the run was for
    pub game: String,
    /// The passing artifact; empty unless `stop_reason` is `Passed`
    pub code: String,
    /// Test runs performed
    pub attempts: usize,
    /// Generator invocations made (never more than `max_retries + 1`)
    pub generator_calls: usize,
    pub stop_reason: StopReason,
    /// Trace of the last failing attempt, if any attempt failed
    pub last_diagnostic: Option<String>,
}

impl SynthesisOutcome {
    pub fn is_success(&self) -> bool {
        self.stop_reason == StopReason::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::Passed.to_string(), "passed");
        assert_eq!(StopReason::RetriesExhausted.to_string(), "retries exhausted");
        assert_eq!(
            StopReason::Aborted("bad event".into()).to_string(),
            "aborted: bad event"
        );
    }

    #[test]
    fn test_is_success() {
        let mut outcome = SynthesisOutcome {
            game: "isolation".to_string(),
            code: "x = 1".to_string(),
            attempts: 1,
            generator_calls: 1,
            stop_reason: StopReason::Passed,
            last_diagnostic: None,
        };
        assert!(outcome.is_success());

        outcome.stop_reason = StopReason::RetriesExhausted;
        assert!(!outcome.is_success());
    }
}
