//! Scripted runner for exercising the refinement loop

use crate::runner::TestRunner;
use async_trait::async_trait;
use cwm_core::ExecutionVerdict;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Judge = Box<dyn Fn(&str, &str) -> ExecutionVerdict + Send + Sync>;

enum Mode {
    /// Pop verdicts in order; the last one repeats
    Scripted(Mutex<VecDeque<ExecutionVerdict>>),
    /// Decide from the inputs
    Judge(Judge),
}

/// Test runner that never executes anything
pub struct MockTestRunner {
    mode: Mode,
    calls: AtomicUsize,
    seen_code: Mutex<Vec<String>>,
}

impl MockTestRunner {
    /// Return `verdicts` in order, repeating the last one once exhausted
    pub fn scripted(verdicts: Vec<ExecutionVerdict>) -> Self {
        Self::with_mode(Mode::Scripted(Mutex::new(verdicts.into())))
    }

    /// Always report failure with `diagnostic`
    pub fn always_failing(diagnostic: impl Into<String>) -> Self {
        Self::scripted(vec![ExecutionVerdict::fail(diagnostic)])
    }

    /// Pass exactly when the candidate contains `marker`
    pub fn passing_when_contains(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        Self::judged(move |code, _tests| {
            if code.contains(&marker) {
                ExecutionVerdict::pass()
            } else {
                ExecutionVerdict::fail(format!(
                    "Traceback (most recent call last):\nException: Unit tests failed: missing {}",
                    marker
                ))
            }
        })
    }

    /// Decide each verdict with `judge`
    pub fn judged<F>(judge: F) -> Self
    where
        F: Fn(&str, &str) -> ExecutionVerdict + Send + Sync + 'static,
    {
        Self::with_mode(Mode::Judge(Box::new(judge)))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
            seen_code: Mutex::new(Vec::new()),
        }
    }

    /// Number of `run` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Candidates passed to `run`, in call order
    pub fn seen_code(&self) -> Vec<String> {
        self.seen_code
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TestRunner for MockTestRunner {
    async fn run(&self, code: &str, tests: &str) -> ExecutionVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen_code.lock() {
            seen.push(code.to_string());
        }

        match &self.mode {
            Mode::Judge(judge) => judge(code, tests),
            Mode::Scripted(queue) => {
                let Ok(mut queue) = queue.lock() else {
                    return ExecutionVerdict::fail("mock runner lock poisoned");
                };
                if queue.len() > 1 {
                    queue.pop_front().unwrap_or_else(ExecutionVerdict::pass)
                } else {
                    queue.front().cloned().unwrap_or_else(ExecutionVerdict::pass)
                }
            }
        }
    }
}
