//! # cwm-core
//!
//! Core types for the cwm synthesis pipeline.
//!
//! cwm turns a natural-language rules description of a small game plus a
//! fixed unit-test suite into a "code world model": a source file exposing
//! six transition functions (`apply_action`, `get_current_player`,
//! `get_player_name`, `get_rewards`, `get_legal_actions`,
//! `get_observations`) that passes those tests.
//!
//! ## Pipeline
//!
//! - A code generator turns prompts into candidate source text
//! - A sandboxed runner executes candidate + tests in a fresh interpreter
//! - The synthesizer feeds failure traces back into refinement prompts
//!   until the tests pass or the retry budget runs out

pub mod config;
mod error;
pub mod fail_open;
mod types;

pub use config::CwmConfig;
pub use error::{CwmError, Result};
pub use types::*;
