//! Chat-completions client that turns prompts into candidate code
//!
//! Key design: each call is a single stateless request. No conversation
//! history is kept; everything the model needs (rules, tests, failing code,
//! failure trace) is carried in the prompt itself.

use crate::auth;
use crate::extract::{extract_code, DEFAULT_CODE_LANGUAGE};
use crate::types::{ChatMessage, ChatRequest, ChatResponse};
use async_trait::async_trait;
use cwm_core::config::ModelConfig;
use cwm_core::{CwmError, Result};
use std::time::Duration;

/// User message sent alongside a system prompt when the caller has none
pub const DEFAULT_USER_PROMPT: &str = "Generate the code.";

/// Something that turns prompts into candidate source code.
///
/// Implementations never fail loudly: an empty string means "no usable
/// candidate" and the caller decides what to do about it.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Generate code for a system prompt and a user prompt
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> String;

    /// Generate code with [`DEFAULT_USER_PROMPT`] as the user message
    async fn generate_default(&self, system_prompt: &str) -> String {
        self.generate(system_prompt, DEFAULT_USER_PROMPT).await
    }
}

/// Generator backed by an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    model: String,
    temperature: f32,
    endpoint: String,
    api_key_env: String,
    api_key: Option<String>,
    timeout: Duration,
    language: String,
}

impl OpenAiClient {
    /// Create a client for `model` with default settings
    pub fn new(model: impl Into<String>) -> Self {
        let defaults = ModelConfig::default();
        Self {
            http: reqwest::Client::new(),
            model: model.into(),
            temperature: defaults.temperature,
            endpoint: defaults.endpoint,
            api_key_env: defaults.api_key_env,
            api_key: None,
            timeout: Duration::from_secs(defaults.timeout_secs),
            language: DEFAULT_CODE_LANGUAGE.to_string(),
        }
    }

    /// Create a client from the `[model]` config section
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.name.clone())
            .with_temperature(config.temperature)
            .with_endpoint(config.endpoint.clone())
            .with_api_key_env(config.api_key_env.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Read the key from a different environment variable
    pub fn with_api_key_env(mut self, env_var: impl Into<String>) -> Self {
        self.api_key_env = env_var.into();
        self
    }

    /// Use this key instead of reading the environment
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fence tag used when extracting code from responses
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Send one request and return the raw content of the first choice
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let api_key = match &self.api_key {
            Some(key) => key.clone(),
            None => auth::get_api_key(&self.api_key_env)?,
        };

        let request = ChatRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CwmError::Generation(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown".to_string());
            return Err(CwmError::Generation(format!(
                "Chat API error {}: {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| CwmError::Generation(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &chat_response.usage {
            tracing::info!(
                "Generation complete ({} prompt tokens, {} completion tokens)",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        chat_response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| CwmError::Generation("No content in response".to_string()))
    }
}

#[async_trait]
impl CodeGenerator for OpenAiClient {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> String {
        tracing::info!("Sending prompt to {} ({} chars)", self.model, system_prompt.len());
        tracing::debug!("--- System Prompt ---\n{}", system_prompt);
        tracing::debug!("--- User Prompt ---\n{}", user_prompt);

        let outcome =
            tokio::time::timeout(self.timeout, self.complete(system_prompt, user_prompt)).await;

        match outcome {
            Ok(Ok(content)) => {
                tracing::info!("Received response ({} chars)", content.len());
                tracing::debug!("--- Response ---\n{}", content);
                extract_code(&content, &self.language)
            }
            Ok(Err(e)) => {
                tracing::error!("LLM API error: {}", e);
                String::new()
            }
            Err(_) => {
                tracing::error!(
                    "LLM API error: request timed out after {}s",
                    self.timeout.as_secs()
                );
                String::new()
            }
        }
    }
}
