//! CLI module for the jabfi conformance harness
//!
//! Running the binary with no arguments runs every `.b` program next to the harness against
//! `../jabfi`, using the latest built-in fixture generation.
//!
//! ## Modules
//!
//! - `config` - Harness configuration and default path derivation
//! - `test_interfaces` - Discovery and execution seams
//! - `test_runner` - Comparison, reporting and the run loop
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod config;
pub mod test_interfaces;
pub mod test_runner;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use jabfi_fixtures::{FixtureGeneration, FixtureRegistry, file};

use crate::version::HARNESS_VERSION;
use config::HarnessConfig;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Black-box conformance tests for the jabfi interpreter
#[derive(Parser, Debug)]
#[command(name = "jabfi-conformance")]
#[command(version = HARNESS_VERSION)]
#[command(about = "Run .b programs through jabfi and compare their output with known fixtures", long_about = None)]
pub struct Cli {
    /// Directory holding the .b programs (default: the harness's own directory)
    #[arg(long = "dir", value_name = "DIR")]
    pub test_dir: Option<PathBuf>,

    /// Interpreter to test, as a path or a name on PATH (default: <DIR>/../jabfi)
    #[arg(long, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Per-program deadline in milliseconds; 0 waits forever
    #[arg(long = "timeout-ms", value_name = "MS", default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Built-in fixture table to judge against
    #[arg(long, value_name = "GEN", default_value_t = FixtureGeneration::default(), conflicts_with = "fixtures")]
    pub generation: FixtureGeneration,

    /// Load fixtures from a JSON file instead of a built-in generation
    #[arg(long, value_name = "FILE")]
    pub fixtures: Option<PathBuf>,

    /// Print mismatch details for failed tests
    #[arg(short, long)]
    pub verbose: bool,

    /// Stop on first failure
    #[arg(short = 'x', long = "exitfirst")]
    pub stop_on_fail: bool,

    /// Only run programs whose file name contains EXPR
    #[arg(short = 'k', value_name = "EXPR")]
    pub filter: Option<String>,

    /// Emit one JSON object per event instead of the console report
    #[arg(long)]
    pub json: bool,

    /// List the registered fixture names and exit
    #[arg(long = "list-fixtures")]
    pub list_fixtures: bool,
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let registry = load_registry(&cli)?;

    if cli.list_fixtures {
        println!("[*] Fixtures ({})", registry.label());
        for name in registry.names() {
            println!("    {}", name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = build_config(&cli)?;
    test_runner::run_tests(&config, &registry, cli.json)
}

/// Select the fixture registry: a JSON file if given, otherwise a built-in generation.
fn load_registry(cli: &Cli) -> CliResult<FixtureRegistry> {
    match &cli.fixtures {
        Some(path) => file::load(path).map_err(|e| CliError::failure(format!("Error: {}", e))),
        None => Ok(FixtureRegistry::builtin(cli.generation)),
    }
}

/// Resolve paths and options into a [`HarnessConfig`].
fn build_config(cli: &Cli) -> CliResult<HarnessConfig> {
    let base = match &cli.test_dir {
        Some(dir) => HarnessConfig::new(dir, config::default_executable_for(dir)),
        None => HarnessConfig::from_current_exe()
            .map_err(|e| CliError::failure(format!("Error: cannot locate the harness directory: {}", e)))?,
    };

    let base = match &cli.executable {
        Some(exe) => base.with_executable(exe),
        None => base,
    };

    let timeout = (cli.timeout_ms > 0).then(|| Duration::from_millis(cli.timeout_ms));

    Ok(base
        .with_timeout(timeout)
        .with_verbose(cli.verbose)
        .with_stop_on_fail(cli.stop_on_fail)
        .with_filter(cli.filter.clone()))
}

// ============================================================================
// Tests
// ============================================================================
