//! # cwm-synth
//!
//! The refinement controller of the cwm pipeline.
//!
//! A run goes through `Generating -> Validating -> {Done | Refining ->
//! Generating}`:
//! - The initial prompt is chosen by information class
//! - Every candidate is executed against the test suite
//! - A failing candidate and its trace are folded into a refinement prompt
//! - The loop stops on the first passing candidate or after
//!   `max_retries + 1` generations

mod outcome;
pub mod prompts;
mod run_log;
mod state_machine;
mod synthesizer;

pub use outcome::{StopReason, SynthesisOutcome};
pub use prompts::{initial_prompt, refinement_prompt};
pub use run_log::RunLog;
pub use state_machine::{transition, Event, State};
pub use synthesizer::Synthesizer;
