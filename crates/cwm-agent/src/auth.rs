//! API key lookup for the text-generation service

use cwm_core::{CwmError, Result};
use std::env;

/// Read the API key from the named environment variable.
///
/// An unset or blank variable is an [`CwmError::Auth`] error.
pub fn get_api_key(env_var: &str) -> Result<String> {
    match env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(CwmError::Auth(format!(
            "No API key found. Set {}=sk-... in the environment.",
            env_var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns its variable name so parallel tests never race.

    #[test]
    fn test_key_present() {
        env::set_var("CWM_TEST_KEY_PRESENT", "  sk-test  ");
        assert_eq!(get_api_key("CWM_TEST_KEY_PRESENT").unwrap(), "sk-test");
        env::remove_var("CWM_TEST_KEY_PRESENT");
    }

    #[test]
    fn test_key_missing() {
        env::remove_var("CWM_TEST_KEY_MISSING");
        let err = get_api_key("CWM_TEST_KEY_MISSING").unwrap_err();
        assert!(matches!(err, CwmError::Auth(_)));
        assert!(err.to_string().contains("CWM_TEST_KEY_MISSING"));
    }

    #[test]
    fn test_key_blank() {
        env::set_var("CWM_TEST_KEY_BLANK", "   ");
        assert!(get_api_key("CWM_TEST_KEY_BLANK").is_err());
        env::remove_var("CWM_TEST_KEY_BLANK");
    }
}
