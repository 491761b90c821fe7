//! # cwm-agent
//!
//! Code generator for the cwm pipeline.
//!
//! A generator is a stateless request/response wrapper: prompts go in,
//! an extracted code block comes out. Failures of any kind come back as
//! an empty string so the refinement loop can treat them like any other
//! failing candidate. Retry policy lives in `cwm-synth`, not here.

mod auth;
mod client;
mod extract;
mod mock;
mod types;

pub use auth::get_api_key;
pub use client::{CodeGenerator, OpenAiClient, DEFAULT_USER_PROMPT};
pub use extract::{extract_code, DEFAULT_CODE_LANGUAGE};
pub use mock::MockCodeGenerator;
pub use types::*;
