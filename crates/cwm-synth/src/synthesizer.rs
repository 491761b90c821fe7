//! Synthesizer - the bounded generate/validate/refine loop
//!
//! Key design: the generator and runner are injected behind traits, and
//! the only state that crosses loop iterations is the explicit
//! [`RetryState`]. Nothing survives a `synthesize` call, so independent
//! runs (one per game, say) can proceed in parallel without coordination.

use crate::outcome::{StopReason, SynthesisOutcome};
use crate::prompts::{initial_prompt, refinement_prompt};
use crate::run_log::RunLog;
use crate::state_machine::{transition, Event, State};
use cwm_agent::CodeGenerator;
use cwm_core::{ExecutionVerdict, SynthesisRequest};
use cwm_sandbox::TestRunner;
use tracing::{debug, error, info, warn};

/// Loop bookkeeping for one run
#[derive(Debug, Default)]
struct RetryState {
    /// The candidate under test
    code: String,
    /// Prompt for the next generation
    prompt: String,
    /// Verdict for `code`, once it has been run
    last_verdict: Option<ExecutionVerdict>,
    /// Last failure trace seen in this run
    last_diagnostic: Option<String>,
    generator_calls: usize,
    runner_calls: usize,
}

/// Refinement controller
pub struct Synthesizer<G: CodeGenerator, R: TestRunner> {
    generator: G,
    runner: R,
    run_log: Option<RunLog>,
}

impl<G: CodeGenerator, R: TestRunner> Synthesizer<G, R> {
    pub fn new(generator: G, runner: R) -> Self {
        Self {
            generator,
            runner,
            run_log: None,
        }
    }

    /// Record every attempt in a markdown transcript
    pub fn with_run_log(mut self, run_log: RunLog) -> Self {
        self.run_log = Some(run_log);
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Synthesize a code world model for `request`.
    ///
    /// Returns as soon as a candidate passes. Otherwise the failing
    /// candidate and its trace become the next prompt until
    /// `max_retries + 1` candidates have been generated, after which the
    /// outcome carries empty code.
    pub async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisOutcome {
        info!("--- Starting synthesis for {} ---", request.game);
        info!("Using {} information prompt template", request.info_class);

        if let Some(log) = &self.run_log {
            log.log_start(request).await;
        }

        let max_attempts = request.max_attempts();
        let mut retry = RetryState {
            prompt: initial_prompt(
                request.info_class,
                &request.game,
                &request.rules,
                &request.tests,
            ),
            ..Default::default()
        };

        let mut state = State::start();
        while !state.is_terminal() {
            let event = match &state {
                State::Generating { attempt } => {
                    debug!(
                        "Generating candidate {} ({} char prompt)",
                        attempt + 1,
                        retry.prompt.len()
                    );
                    retry.code = self.generator.generate_default(&retry.prompt).await;
                    retry.generator_calls += 1;
                    retry.last_verdict = None;

                    if retry.code.is_empty() {
                        warn!("Generator returned no code for attempt {}", attempt + 1);
                    }
                    Event::CodeGenerated
                }

                State::Validating { attempt } => {
                    info!("Validating attempt {} of {}...", attempt + 1, max_attempts);
                    let mut verdict = self.runner.run(&retry.code, &request.tests).await;
                    retry.runner_calls += 1;

                    // Tests that raise nothing against an empty module prove nothing
                    if verdict.success && retry.code.trim().is_empty() {
                        verdict = ExecutionVerdict::fail(
                            "No code was generated; an empty candidate cannot be accepted.",
                        );
                    }

                    if let Some(log) = &self.run_log {
                        log.log_attempt(attempt + 1, max_attempts, &retry.code, &verdict)
                            .await;
                    }

                    let event = if verdict.success {
                        info!("Attempt {} passed all tests", attempt + 1);
                        Event::TestsPassed
                    } else {
                        warn!("Attempt {} failed. Error trace captured.", attempt + 1);
                        debug!("Error trace: {}", verdict.diagnostic);
                        retry.last_diagnostic = Some(verdict.diagnostic.clone());
                        Event::TestsFailed
                    };
                    retry.last_verdict = Some(verdict);
                    event
                }

                State::Refining { .. } => {
                    info!("Refining code with LLM...");
                    let diagnostic = retry
                        .last_verdict
                        .as_ref()
                        .map(|v| v.diagnostic.as_str())
                        .unwrap_or_default();
                    retry.prompt = refinement_prompt(diagnostic, &retry.code);
                    Event::RefinementReady
                }

                State::Done(_) | State::Failed { .. } => break,
            };

            state = transition(state, event, request.max_retries);
        }

        let stop_reason = match state {
            State::Done(reason) => reason,
            State::Failed { error } => StopReason::Aborted(error),
            other => StopReason::Aborted(format!("Loop exited in {:?}", other)),
        };

        let code = match stop_reason {
            StopReason::Passed => {
                info!("Success! Code passed all tests.");
                std::mem::take(&mut retry.code)
            }
            StopReason::RetriesExhausted => {
                error!("Max retries reached. Synthesis failed.");
                String::new()
            }
            StopReason::Aborted(ref reason) => {
                error!("Synthesis aborted: {}", reason);
                String::new()
            }
        };

        let outcome = SynthesisOutcome {
            game: request.game.clone(),
            code,
            attempts: retry.runner_calls,
            generator_calls: retry.generator_calls,
            stop_reason,
            last_diagnostic: retry.last_diagnostic,
        };

        if let Some(log) = &self.run_log {
            log.log_outcome(&outcome).await;
        }

        outcome
    }
}
