//! Pure state machine for the refinement loop
//!
//! No I/O happens here: `transition(state, event, max_retries)` is a
//! deterministic function and the synthesizer performs the side effects
//! that each state calls for.
//!
//! - Pure function: transition(state, event) -> state
//! - `attempt` is 0-based and only grows in `Refining -> Generating`
//! - Invalid transitions go to `Failed` (never panic)

use crate::outcome::StopReason;

/// Where the refinement loop is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Waiting on the generator for candidate number `attempt`
    Generating { attempt: usize },
    /// Running the tests against the current candidate
    Validating { attempt: usize },
    /// Building a refinement prompt from the failed candidate
    Refining { attempt: usize },
    /// Terminal
    Done(StopReason),
    /// Terminal, reached through an invalid transition
    Failed { error: String },
}

/// Things that happen to the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The generator returned (possibly empty) code
    CodeGenerated,
    /// The runner reported success
    TestsPassed,
    /// The runner reported failure
    TestsFailed,
    /// The refinement prompt is ready
    RefinementReady,
}

impl State {
    /// Initial state of every run
    pub fn start() -> Self {
        State::Generating { attempt: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Done(_) | State::Failed { .. })
    }
}

/// Pure state transition function
///
/// A failed validation refines only while `attempt < max_retries`, so a
/// run makes at most `max_retries + 1` generations.
pub fn transition(state: State, event: Event, max_retries: usize) -> State {
    match (state, event) {
        (State::Generating { attempt }, Event::CodeGenerated) => State::Validating { attempt },

        (State::Validating { .. }, Event::TestsPassed) => State::Done(StopReason::Passed),

        (State::Validating { attempt }, Event::TestsFailed) => {
            if attempt < max_retries {
                State::Refining { attempt }
            } else {
                State::Done(StopReason::RetriesExhausted)
            }
        }

        (State::Refining { attempt }, Event::RefinementReady) => State::Generating {
            attempt: attempt + 1,
        },

        (state, event) => State::Failed {
            error: format!("Invalid transition: {:?} on {:?}", event, state),
        },
    }
}
