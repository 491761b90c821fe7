//! Scripted generator for tests

use crate::client::CodeGenerator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Generator that replays canned responses and records every prompt.
///
/// Responses are returned in order; once the script runs out the last
/// response repeats. An empty script always returns `""`, which is what a
/// failing real generator returns.
#[derive(Default)]
pub struct MockCodeGenerator {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay `responses` in order
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of `generate` calls so far
    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// `(system, user)` prompt pairs, in call order
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CodeGenerator for MockCodeGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> String {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((system_prompt.to_string(), user_prompt.to_string()));
        }

        let Ok(mut responses) = self.responses.lock() else {
            return String::new();
        };
        if responses.len() > 1 {
            responses.pop_front().unwrap_or_default()
        } else {
            responses.front().cloned().unwrap_or_default()
        }
    }
}
