//! Code block extraction from model responses

use regex::Regex;

/// Fence tag the prompts ask the model to use
pub const DEFAULT_CODE_LANGUAGE: &str = "python";

/// Pull the first fenced block tagged with `language` out of `text`.
///
/// Falls back to the whole trimmed response when no such block exists, so
/// a model that ignores the formatting instructions still yields a
/// candidate the runner can judge.
pub fn extract_code(text: &str, language: &str) -> String {
    let pattern = format!(r"(?s)```{}(.*?)```", regex::escape(language));
    match Regex::new(&pattern) {
        Ok(re) => match re.captures(text).and_then(|caps| caps.get(1)) {
            Some(body) => body.as_str().trim().to_string(),
            None => text.trim().to_string(),
        },
        Err(e) => {
            tracing::warn!("Invalid fence pattern for {:?}: {}", language, e);
            text.trim().to_string()
        }
    }
}
