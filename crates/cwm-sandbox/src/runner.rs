//! Test runners: the trait and the fresh-interpreter implementation

use crate::diagnostic::{compose_script, format_early_exit, format_failure};
use async_trait::async_trait;
use cwm_core::config::SandboxConfig;
use cwm_core::ExecutionVerdict;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Executes candidate code against a test suite (allows mocking in tests)
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Run `code` followed by `tests`.
    ///
    /// Every failure (syntax error, missing function, failed assertion,
    /// crash, timeout) is a failing verdict carrying a diagnostic. This
    /// never returns an error.
    async fn run(&self, code: &str, tests: &str) -> ExecutionVerdict;
}

/// Fixed entry point passed with `-c`.
///
/// The composed script arrives on stdin and runs as a module named
/// `cwm_candidate`, so `if __name__ == "__main__":` blocks stay dormant.
/// Any exception, `SystemExit` included, prints a traceback and exits 1.
/// The completion marker in `argv[1]` is printed only once the whole
/// script has run.
const BOOTSTRAP: &str = r#"import sys, traceback
source = sys.stdin.buffer.read()
try:
    exec(compile(source, "<candidate>", "exec"), {"__name__": "cwm_candidate"})
except BaseException as exc:
    traceback.print_exception(type(exc), exc, exc.__traceback__.tb_next)
    sys.exit(1)
sys.stdout.write("\n" + sys.argv[1] + "\n")
sys.stdout.flush()
"#;

/// Runs each candidate in a brand-new Python interpreter process.
///
/// The interpreter is started in isolated mode (`-I`: no user site
/// packages, no `PYTHON*` variables, script directory not on `sys.path`)
/// with a cleared environment and a throwaway working directory. Tracebacks
/// always name `<candidate>`, which keeps diagnostics identical across runs
/// of the same input.
///
/// A run passes only if the interpreter exits 0 *and* prints the per-run
/// completion marker, so a candidate that stops the process early (for
/// example with `os._exit(0)`) never counts as passing.
#[derive(Debug, Clone)]
pub struct PythonRunner {
    interpreter: String,
    timeout: Duration,
    max_diagnostic_chars: usize,
}

impl PythonRunner {
    /// Create a runner using `interpreter` with default limits
    pub fn new(interpreter: impl Into<String>) -> Self {
        let defaults = SandboxConfig::default();
        Self {
            interpreter: interpreter.into(),
            timeout: Duration::from_secs(defaults.timeout_secs),
            max_diagnostic_chars: defaults.max_diagnostic_chars,
        }
    }

    /// Create a runner from the `[sandbox]` config section
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self::new(config.interpreter.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
            .with_max_diagnostic_chars(config.max_diagnostic_chars)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_diagnostic_chars(mut self, max_chars: usize) -> Self {
        self.max_diagnostic_chars = max_chars;
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Spawn the interpreter in `workdir`, feed `script`, collect output
    async fn execute(&self, script: &str, marker: &str, workdir: &Path) -> std::io::Result<Output> {
        let mut command = Command::new(&self.interpreter);
        command
            .args(["-I", "-B", "-c", BOOTSTRAP, marker])
            .current_dir(workdir)
            .env_clear()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Interpreter lookup still needs PATH
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }

        let mut child = command.spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // An interpreter that exits before reading everything closes the
            // pipe; its exit status and stderr still tell the story.
            if let Err(e) = stdin.write_all(script.as_bytes()).await {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e);
                }
            }
        }

        child.wait_with_output().await
    }
}

impl Default for PythonRunner {
    fn default() -> Self {
        Self::from_config(&SandboxConfig::default())
    }
}

#[async_trait]
impl TestRunner for PythonRunner {
    #[instrument(skip_all, fields(interpreter = %self.interpreter))]
    async fn run(&self, code: &str, tests: &str) -> ExecutionVerdict {
        let script = compose_script(code, tests);
        debug!("Running candidate ({} chars of script)", script.len());

        let workdir = match tempfile::Builder::new().prefix("cwm-run-").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return ExecutionVerdict::fail(format!(
                    "Failed to create sandbox directory: {}",
                    e
                ))
            }
        };

        let marker = completion_marker(workdir.path());
        let outcome =
            tokio::time::timeout(self.timeout, self.execute(&script, &marker, workdir.path())).await;

        let verdict = match outcome {
            Err(_) => ExecutionVerdict::fail(format!(
                "Execution timed out after {}s; the process was killed. \
                 Check for infinite loops or blocking calls.",
                self.timeout.as_secs_f32()
            )),
            Ok(Err(e)) => {
                ExecutionVerdict::fail(format!("Failed to launch {}: {}", self.interpreter, e))
            }
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let (stdout, completed) = strip_completion_marker(&stdout, &marker);

                match (output.status.success(), completed) {
                    (true, true) => ExecutionVerdict::pass(),
                    (true, false) => ExecutionVerdict::fail(format_early_exit(
                        stdout,
                        &stderr,
                        output.status,
                        self.max_diagnostic_chars,
                    )),
                    (false, _) => ExecutionVerdict::fail(format_failure(
                        stdout,
                        &stderr,
                        output.status,
                        self.max_diagnostic_chars,
                    )),
                }
            }
        };

        if let Err(e) = workdir.close() {
            debug!("Failed to remove sandbox directory: {}", e);
        }

        debug!(success = verdict.success, "Run finished");
        verdict
    }
}

/// Per-run marker the bootstrap prints after the script completes
fn completion_marker(workdir: &Path) -> String {
    let nonce = workdir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("run");
    format!("cwm-complete-{}", nonce)
}

/// Remove a trailing completion marker from `stdout`.
///
/// Returns the remaining output and whether the marker was present.
fn strip_completion_marker<'a>(stdout: &'a str, marker: &str) -> (&'a str, bool) {
    match stdout.trim_end().strip_suffix(marker) {
        Some(rest) => (rest, true),
        None => (stdout, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIX_FUNCTIONS: &str = r#"
def apply_action(state, action):
    return dict(state, last=action)

def get_current_player(state):
    return -4 if state.get("done") else 0

def get_player_name(player_id):
    return {-1: "chance", -4: "terminal"}.get(player_id, f"player_{player_id}")

def get_rewards(state):
    return [0.0, 0.0]

def get_legal_actions(state):
    return [] if state.get("done") else ["a", "b"]

def get_observations(state):
    return [state, state]
"#;

    const TESTS: &str = r#"
state = {"done": False}
assert get_current_player(state) == 0
assert get_player_name(-4) == "terminal"
assert len(get_observations(state)) == 2
assert apply_action(state, "a")["last"] == "a"
"#;

    fn python_available() -> bool {
        std::process::Command::new("python3")
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_passing_candidate() {
        if !python_available() {
            return;
        }
        let verdict = PythonRunner::default().run(SIX_FUNCTIONS, TESTS).await;
        assert!(verdict.success, "unexpected failure: {}", verdict.diagnostic);
        assert!(verdict.diagnostic.is_empty());
    }

    #[tokio::test]
    async fn test_syntax_error_is_failure_with_trace() {
        if !python_available() {
            return;
        }
        let verdict = PythonRunner::default()
            .run("def apply_action(state, action)\n    return state", TESTS)
            .await;
        assert!(!verdict.success);
        assert!(verdict.diagnostic.contains("SyntaxError"));
    }

    #[tokio::test]
    async fn test_missing_function_is_failure() {
        if !python_available() {
            return;
        }
        let verdict = PythonRunner::default().run("", TESTS).await;
        assert!(!verdict.success);
        assert!(verdict.diagnostic.contains("NameError"));
        assert!(verdict.diagnostic.contains("get_current_player"));
    }

    #[tokio::test]
    async fn test_raised_test_failure_carries_message() {
        if !python_available() {
            return;
        }
        let tests = "raise Exception('Unit tests failed:\\nexpected 2 observations')";
        let verdict = PythonRunner::default().run(SIX_FUNCTIONS, tests).await;
        assert!(!verdict.success);
        assert!(verdict.diagnostic.contains("Traceback"));
        assert!(verdict.diagnostic.contains("expected 2 observations"));
    }

    #[tokio::test]
    async fn test_sys_exit_before_tests_is_failure() {
        if !python_available() {
            return;
        }
        let tests = "raise Exception('Unit tests failed:\\nexpected 2 observations')";
        let verdict = PythonRunner::default()
            .run("import sys\nsys.exit(0)", tests)
            .await;
        assert!(!verdict.success);
        assert!(verdict.diagnostic.contains("SystemExit"));
    }

    #[tokio::test]
    async fn test_hard_exit_before_tests_is_failure() {
        if !python_available() {
            return;
        }
        let tests = "raise Exception('Unit tests failed')";
        let verdict = PythonRunner::default()
            .run("import os\nos._exit(0)", tests)
            .await;
        assert!(!verdict.success);
        assert!(verdict.diagnostic.contains("before the test suite finished"));
    }

    #[tokio::test]
    async fn test_main_guard_block_does_not_run() {
        if !python_available() {
            return;
        }
        let runner = PythonRunner::default();
        let code = format!(
            "{}\nif __name__ == '__main__':\n    import sys\n    sys.exit(0)\n",
            SIX_FUNCTIONS
        );

        let failing = "raise Exception('Unit tests failed:\\nexpected 2 observations')";
        let verdict = runner.run(&code, failing).await;
        assert!(!verdict.success);
        assert!(verdict.diagnostic.contains("expected 2 observations"));

        let crashing_demo = format!(
            "{}\nif __name__ == '__main__':\n    raise RuntimeError('demo ran')\n",
            SIX_FUNCTIONS
        );
        let verdict = runner.run(&crashing_demo, TESTS).await;
        assert!(verdict.success, "demo block ran: {}", verdict.diagnostic);
    }

    #[tokio::test]
    async fn test_candidate_output_is_kept_in_diagnostic() {
        if !python_available() {
            return;
        }
        let verdict = PythonRunner::default()
            .run("print('state dump')", "raise Exception('boom')")
            .await;
        assert!(!verdict.success);
        assert!(verdict.diagnostic.contains("STDOUT:\nstate dump"));
        assert!(!verdict.diagnostic.contains("cwm-complete-"));
    }

    #[test]
    fn test_strip_completion_marker() {
        let (rest, completed) = strip_completion_marker("hello\n\ncwm-complete-abc\n", "cwm-complete-abc");
        assert!(completed);
        assert_eq!(rest.trim(), "hello");

        let (rest, completed) = strip_completion_marker("hello\n", "cwm-complete-abc");
        assert!(!completed);
        assert_eq!(rest, "hello\n");
    }

    #[tokio::test]
    async fn test_runs_do_not_share_state() {
        if !python_available() {
            return;
        }
        let runner = PythonRunner::default();
        let leak = "import builtins\nbuiltins.LEAKED = True\nopen('scratch.txt', 'w').write('x')";
        assert!(runner.run(leak, "").await.success);

        let check = "import builtins, os\nassert not hasattr(builtins, 'LEAKED')\nassert not os.path.exists('scratch.txt')";
        let verdict = runner.run("", check).await;
        assert!(verdict.success, "state leaked: {}", verdict.diagnostic);
    }

    #[tokio::test]
    async fn test_same_failing_input_gives_same_diagnostic() {
        if !python_available() {
            return;
        }
        let runner = PythonRunner::default();
        let first = runner.run("x = undefined_name", TESTS).await;
        let second = runner.run("x = undefined_name", TESTS).await;
        assert!(!first.success);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_timeout_kills_runaway_candidate() {
        if !python_available() {
            return;
        }
        let runner = PythonRunner::default().with_timeout(Duration::from_millis(500));
        let verdict = runner.run("while True:\n    pass", "").await;
        assert!(!verdict.success);
        assert!(verdict.diagnostic.contains("timed out"));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_failure() {
        let runner = PythonRunner::new("/nonexistent/cwm-python");
        let verdict = runner.run(SIX_FUNCTIONS, TESTS).await;
        assert!(!verdict.success);
        assert!(verdict.diagnostic.contains("Failed to launch /nonexistent/cwm-python"));
    }

    #[tokio::test]
    async fn test_long_diagnostic_is_truncated() {
        if !python_available() {
            return;
        }
        let runner = PythonRunner::default().with_max_diagnostic_chars(200);
        let tests = "raise Exception('x' * 5000)";
        let verdict = runner.run("", tests).await;
        assert!(!verdict.success);
        assert!(verdict.diagnostic.contains("[truncated"));
        assert!(verdict.diagnostic.chars().count() < 300);
    }

    #[test]
    fn test_from_config() {
        let config = SandboxConfig {
            interpreter: "python3.12".to_string(),
            timeout_secs: 5,
            max_diagnostic_chars: 100,
        };
        let runner = PythonRunner::from_config(&config);
        assert_eq!(runner.interpreter(), "python3.12");
        assert_eq!(runner.timeout, Duration::from_secs(5));
        assert_eq!(runner.max_diagnostic_chars, 100);
    }
}
