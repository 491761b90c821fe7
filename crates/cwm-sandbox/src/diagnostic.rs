//! Script assembly and failure-trace formatting

use std::process::ExitStatus;

/// Join candidate code and test source into one executable unit
pub fn compose_script(code: &str, tests: &str) -> String {
    format!("{}\n\n{}", code, tests)
}

/// Build the diagnostic for a run that exited unsuccessfully.
///
/// The interpreter's stderr (the formatted traceback) comes first; stdout
/// is appended when the candidate printed anything.
pub fn format_failure(stdout: &str, stderr: &str, status: ExitStatus, max_chars: usize) -> String {
    let mut diagnostic = collect_output(stdout, stderr);
    if diagnostic.is_empty() {
        diagnostic = format!("Process exited with {} and produced no output", status);
    }

    truncate_middle(&diagnostic, max_chars)
}

/// Build the diagnostic for a run that exited cleanly without finishing.
///
/// This is the candidate stopping the interpreter (e.g. `os._exit(0)`)
/// before the test source ran to completion.
pub fn format_early_exit(stdout: &str, stderr: &str, status: ExitStatus, max_chars: usize) -> String {
    let mut diagnostic = format!(
        "Process exited with {} before the test suite finished running",
        status
    );
    let output = collect_output(stdout, stderr);
    if !output.is_empty() {
        diagnostic.push_str("\n\n");
        diagnostic.push_str(&output);
    }

    truncate_middle(&diagnostic, max_chars)
}

/// Stderr first, then labeled stdout; empty when neither has content
fn collect_output(stdout: &str, stderr: &str) -> String {
    let stdout = stdout.trim();
    let stderr = stderr.trim();

    let mut output = String::new();
    if !stderr.is_empty() {
        output.push_str(stderr);
    }
    if !stdout.is_empty() {
        if !output.is_empty() {
            output.push_str("\n\n");
        }
        output.push_str("STDOUT:\n");
        output.push_str(stdout);
    }
    output
}

/// Shorten `text` to roughly `max_chars` characters, keeping both ends.
///
/// The head shows where execution started failing; the tail holds the
/// exception line and the test report.
pub fn truncate_middle(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let head_len = max_chars / 2;
    let tail_len = max_chars - head_len;
    let head: String = text.chars().take(head_len).collect();
    let tail: String = text.chars().skip(total - tail_len).collect();

    format!(
        "{}\n...[truncated {} chars]...\n{}",
        head,
        total - max_chars,
        tail
    )
}
