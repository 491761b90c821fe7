//! Run transcript: a human-readable markdown record of one synthesis run
//!
//! The synthesizer writes to it when one is injected. Every write is
//! fail-open, so a full disk or a missing directory never changes the
//! outcome of a run.

use crate::outcome::SynthesisOutcome;
use chrono::{Local, Utc};
use cwm_core::fail_open::fail_open;
use cwm_core::{CwmError, ExecutionVerdict, Result, SynthesisRequest};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Maximum characters of a diagnostic copied into the transcript
const DIAGNOSTIC_PREVIEW_CHARS: usize = 1500;

/// Markdown transcript of a synthesis run
#[derive(Debug, Clone)]
pub struct RunLog {
    output_path: PathBuf,
}

impl RunLog {
    /// Write the transcript to `output_path`
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    /// Transcript named `<game>_<YYYYmmdd_HHMMSS>.md` inside `logs_dir`
    pub fn in_dir(logs_dir: &Path, game: &str) -> Self {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        Self::new(logs_dir.join(format!("{}_{}.md", game, timestamp)))
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    /// Start a fresh transcript for `request`
    pub async fn log_start(&self, request: &SynthesisRequest) {
        fail_open("run_log::log_start", || async {
            if let Some(parent) = self.output_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let content = format!(
                "# Synthesis: {}\n\n\
                 **Started**: {}\n\
                 **Information class**: {}\n\
                 **Max attempts**: {}\n\n---\n\n",
                request.game,
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
                request.info_class,
                request.max_attempts()
            );

            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.output_path)
                .await?;
            file.write_all(content.as_bytes()).await?;
            file.flush().await?;
            Ok::<(), CwmError>(())
        })
        .await;
    }

    /// Record the verdict for one attempt (1-based `attempt`)
    pub async fn log_attempt(
        &self,
        attempt: usize,
        max_attempts: usize,
        code: &str,
        verdict: &ExecutionVerdict,
    ) {
        fail_open("run_log::log_attempt", || async {
            let mut content = format!("### Attempt {}/{}\n\n", attempt, max_attempts);

            content.push_str(&format!(
                "**Result**: {}\n",
                if verdict.success { "PASS" } else { "FAIL" }
            ));
            if code.trim().is_empty() {
                content.push_str("**Candidate**: (empty)\n");
            } else {
                content.push_str(&format!(
                    "**Candidate**: {} lines\n",
                    code.lines().count()
                ));
            }
            content.push('\n');

            if !verdict.success {
                let preview = if verdict.diagnostic.chars().count() > DIAGNOSTIC_PREVIEW_CHARS {
                    let truncated: String = verdict
                        .diagnostic
                        .chars()
                        .take(DIAGNOSTIC_PREVIEW_CHARS)
                        .collect();
                    format!("{truncated}...")
                } else {
                    verdict.diagnostic.clone()
                };

                content.push_str("**Diagnostic**:\n```\n");
                content.push_str(&preview);
                content.push_str("\n```\n\n");
            }

            content.push_str("---\n\n");
            self.append(&content).await
        })
        .await;
    }

    /// Record how the run ended
    pub async fn log_outcome(&self, outcome: &SynthesisOutcome) {
        fail_open("run_log::log_outcome", || async {
            let content = format!(
                "## Summary\n\n\
                 **Completed**: {}\n\
                 **Result**: {} {}\n\
                 **Attempts**: {}\n\
                 **Generator calls**: {}\n",
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
                if outcome.is_success() { "✓" } else { "✗" },
                outcome.stop_reason,
                outcome.attempts,
                outcome.generator_calls
            );

            self.append(&content).await
        })
        .await;
    }

    async fn append(&self, content: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)
            .await?;

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
