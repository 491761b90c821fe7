//! Configuration management for cwm
//!
//! Settings live in `.cwm/config.toml` under the working directory. Every
//! field has a default, so a missing file or a partial file both work.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{CwmError, InfoClass, Result, DEFAULT_MAX_RETRIES};

/// Relative location of the config file
pub const CONFIG_PATH: &str = ".cwm/config.toml";

/// Top-level cwm configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CwmConfig {
    /// Text-generation service settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Refinement loop defaults
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Test runner settings
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Input/output directories
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Text-generation service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub name: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chat-completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout; expiry counts as a generation failure
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

/// Refinement loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Refinement rounds after the first generation
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Information class used when the caller does not give one
    #[serde(default)]
    pub default_info_class: InfoClass,
}

/// Sandboxed runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Interpreter launched for each run
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Wall-clock limit for one run
    #[serde(default = "default_sandbox_timeout")]
    pub timeout_secs: u64,

    /// Diagnostics longer than this are truncated
    #[serde(default = "default_max_diagnostic_chars")]
    pub max_diagnostic_chars: usize,
}

/// Where inputs are read from and outputs written to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Holds `<game>_rules.txt` and `<game>_tests.py`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Receives `generated_<game>.py`
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Receives `run_<timestamp>.log` and run transcripts
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

// Default value providers
fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model_timeout() -> u64 {
    120
}

fn default_max_retries() -> usize {
    DEFAULT_MAX_RETRIES
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_sandbox_timeout() -> u64 {
    30
}

fn default_max_diagnostic_chars() -> usize {
    8000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl CwmConfig {
    /// Load configuration from `.cwm/config.toml` or use defaults
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_PATH);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| CwmError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Write default configuration to `.cwm/config.toml`
    pub fn write_default(root: &Path) -> Result<PathBuf> {
        let config_path = root.join(CONFIG_PATH);
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| CwmError::Other(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(&config_path, content)?;
        Ok(config_path)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            temperature: default_temperature(),
            api_key_env: default_api_key_env(),
            endpoint: default_endpoint(),
            timeout_secs: default_model_timeout(),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            default_info_class: InfoClass::default(),
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout_secs: default_sandbox_timeout(),
            max_diagnostic_chars: default_max_diagnostic_chars(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            results_dir: default_results_dir(),
            logs_dir: default_logs_dir(),
        }
    }
}
