//! # cwm-sandbox
//!
//! Runs a candidate artifact against a fixed test suite and reports a
//! pass/fail verdict with the full failure trace.
//!
//! Each run gets a fresh interpreter process and a fresh scratch
//! directory, so nothing one candidate does can leak into the next run.
//! The test source is responsible for signaling failure (raising); the
//! runner only distinguishes "ran to the end" from "did not". Stopping the
//! interpreter early, `SystemExit` included, counts as not finishing.

mod diagnostic;
mod mock;
mod runner;

pub use diagnostic::{compose_script, format_early_exit, format_failure, truncate_middle};
pub use mock::MockTestRunner;
pub use runner::{PythonRunner, TestRunner};
