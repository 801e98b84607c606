#![forbid(unsafe_code)]
//! Black-box conformance harness for the jabfi interpreter.
//!
//! The harness runs an externally built interpreter once per `.b` program found in a test
//! directory, feeds it the fixture's input bytes, and compares the captured stdout/stderr (with
//! trailing whitespace stripped) against a versioned fixture table from [`jabfi_fixtures`].
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod version;

pub use cli::config::HarnessConfig;
pub use cli::test_interfaces::{
    DefaultTestDiscovery, ExecutionRequest, ExecutionResult, ProcessExecutor, TestDiscovery, TestError, TestExecutor,
    TestFile,
};
pub use cli::test_runner::{
    Comparison, ConsoleReporter, FailureReason, JsonReporter, Stream, StreamMismatch, TestOutcome, TestReporter,
    TestRunner, TestSummary, normalize,
};
pub use jabfi_fixtures::{FixtureGeneration, FixtureRegistry, TestFixture};
