//! Conformance test runner
//!
//! Runs every discovered `.b` program through the interpreter, one at a time, and judges the
//! captured streams against the registered fixture.
//!
//! ## Flow
//!
//! `discover → fixture lookup → execute → compare → report`, once per file. A file with no fixture is
//! warned about and skipped; it never counts as a failure. A timeout or a launch failure is a failed
//! test, never an aborted run.
//!
//! ## TestReporter Trait
//!
//! The runner uses a `TestReporter` trait to separate reporting from execution. The console reporter
//! prints the classic `[+]`/`[-]` lines; `--json` switches to one JSON object per event.
//!
//! ## I/O Boundaries
//!
//! Discovery and execution go through the traits in `test_interfaces.rs`, so the runner can be driven
//! by in-memory stand-ins in tests.

use std::io::{self, Stderr, Stdout, Write};
use std::time::{Duration, Instant};

use jabfi_fixtures::{FixtureRegistry, TestFixture};

use super::config::HarnessConfig;
use super::test_interfaces::{
    DefaultTestDiscovery, ExecutionRequest, ExecutionResult, ProcessExecutor, TestDiscovery, TestError, TestExecutor,
    TestFile,
};
use super::{CliError, CliResult, ExitCode};

// ============================================================================
// Comparison
// ============================================================================

/// Decode a captured stream and strip trailing whitespace only.
///
/// Invalid UTF-8 is replaced rather than rejected so binary garbage still produces a (failing)
/// comparison instead of an error.
pub fn normalize(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    pub fn as_str(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

/// One stream whose normalized output differs from the fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMismatch {
    pub stream: Stream,
    pub expected: String,
    pub actual: String,
}

/// Result of comparing one execution against its fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    pub mismatches: Vec<StreamMismatch>,
}

impl Comparison {
    /// Compare both streams independently after normalization.
    pub fn new(fixture: &TestFixture, result: &ExecutionResult) -> Self {
        let checks = [
            (Stream::Stdout, fixture.expected_stdout.as_str(), result.stdout.as_slice()),
            (Stream::Stderr, fixture.expected_stderr.as_str(), result.stderr.as_slice()),
        ];

        let mismatches = checks
            .into_iter()
            .filter_map(|(stream, expected, captured)| {
                let expected = expected.trim_end();
                let actual = normalize(captured);
                (actual != expected).then(|| StreamMismatch {
                    stream,
                    expected: expected.to_string(),
                    actual,
                })
            })
            .collect();

        Self { mismatches }
    }

    /// Both streams matched.
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Why a test failed
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Deadline expired; the process was killed
    Timeout(Duration),
    /// One or both streams differed
    Mismatch(Vec<StreamMismatch>),
    /// The interpreter could not be run at all
    Execution(String),
}

impl FailureReason {
    fn describe(&self) -> Vec<String> {
        match self {
            FailureReason::Timeout(d) => vec![format!("timed out after {:.3} ms", millis(*d))],
            FailureReason::Mismatch(mismatches) => mismatches
                .iter()
                .flat_map(|m| {
                    [
                        format!("{} differs", m.stream.as_str()),
                        format!("  expected: {:?}", m.expected),
                        format!("  actual:   {:?}", m.actual),
                    ]
                })
                .collect(),
            FailureReason::Execution(msg) => vec![msg.clone()],
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            FailureReason::Timeout(_) => "timeout",
            FailureReason::Mismatch(_) => "mismatch",
            FailureReason::Execution(_) => "execution",
        }
    }
}

/// Outcome of one executed test
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub file: TestFile,
    pub passed: bool,
    pub elapsed_ms: f64,
    pub failure: Option<FailureReason>,
}

/// Summary of test run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestSummary {
    /// Files selected for the run, registered or not
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Files without a fixture; not part of the pass/fail tally
    pub skipped: usize,
    pub duration: Duration,
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

// ============================================================================
// Test Reporter Trait
// ============================================================================

/// Trait for reporting test execution results.
///
/// Implement this trait to customize the output format.
pub trait TestReporter {
    /// Called once discovery (and filtering) is complete
    fn on_collection_complete(&mut self, test_count: usize);

    /// Called for a discovered file that has no registered fixture
    fn on_unregistered(&mut self, file: &TestFile);

    /// Called when a test has been executed and judged
    fn on_test_complete(&mut self, outcome: &TestOutcome);

    /// Called when all tests have completed
    fn on_run_complete(&mut self, summary: &TestSummary);
}

const SEPARATOR_WIDTH: usize = 100;

/// Default console reporter
pub struct ConsoleReporter<O: Write, E: Write> {
    out: O,
    err: E,
    verbose: bool,
}

impl ConsoleReporter<Stdout, Stderr> {
    /// Report on the process's stdout, warnings on stderr.
    pub fn stdio(verbose: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), verbose)
    }
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn new(out: O, err: E, verbose: bool) -> Self {
        Self { out, err, verbose }
    }

    /// Recover the report and diagnostic sinks.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

// Console write failures (e.g. a closed pipe) are not test failures; they are dropped.
impl<O: Write, E: Write> TestReporter for ConsoleReporter<O, E> {
    fn on_collection_complete(&mut self, test_count: usize) {
        let _ = writeln!(self.out, "[*] Running {} tests", test_count);
        let _ = writeln!(self.out, "{}", "-".repeat(SEPARATOR_WIDTH));
    }

    fn on_unregistered(&mut self, file: &TestFile) {
        let _ = writeln!(
            self.err,
            "[!] {} : no fixture registered for '{}', skipping",
            file.path.display(),
            file.basename
        );
    }

    fn on_test_complete(&mut self, outcome: &TestOutcome) {
        if outcome.passed {
            let _ = writeln!(
                self.out,
                "[+] {} : TEST OK ({:.3} ms)",
                outcome.file.path.display(),
                outcome.elapsed_ms
            );
            return;
        }

        let _ = writeln!(self.out, "[-] {} : TEST FAILED", outcome.file.path.display());
        if self.verbose {
            if let Some(failure) = &outcome.failure {
                for line in failure.describe() {
                    let _ = writeln!(self.out, "    {}", line);
                }
            }
        }
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        let _ = writeln!(self.out, "{}", "-".repeat(SEPARATOR_WIDTH));
        let _ = writeln!(
            self.out,
            "[*] {} passed, {} failed, {} skipped in {:.2}s",
            summary.passed,
            summary.failed,
            summary.skipped,
            summary.duration.as_secs_f64()
        );
        let _ = self.out.flush();
    }
}

/// Line-delimited JSON reporter (`--json`)
pub struct JsonReporter<O: Write, E: Write> {
    out: O,
    err: E,
}

impl JsonReporter<Stdout, Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> JsonReporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn emit(&mut self, value: serde_json::Value) {
        let _ = writeln!(self.out, "{}", value);
    }
}

impl<O: Write, E: Write> TestReporter for JsonReporter<O, E> {
    fn on_collection_complete(&mut self, test_count: usize) {
        self.emit(serde_json::json!({ "event": "collected", "count": test_count }));
    }

    fn on_unregistered(&mut self, file: &TestFile) {
        let _ = writeln!(
            self.err,
            "[!] {} : no fixture registered for '{}', skipping",
            file.path.display(),
            file.basename
        );
    }

    fn on_test_complete(&mut self, outcome: &TestOutcome) {
        let failure = outcome.failure.as_ref().map(|f| {
            serde_json::json!({
                "kind": f.kind(),
                "details": f.describe(),
            })
        });
        self.emit(serde_json::json!({
            "event": "test",
            "path": outcome.file.path.display().to_string(),
            "name": outcome.file.basename,
            "passed": outcome.passed,
            "elapsed_ms": outcome.elapsed_ms,
            "failure": failure,
        }));
    }

    fn on_run_complete(&mut self, summary: &TestSummary) {
        self.emit(serde_json::json!({
            "event": "summary",
            "total": summary.total,
            "passed": summary.passed,
            "failed": summary.failed,
            "skipped": summary.skipped,
            "duration_ms": millis(summary.duration),
        }));
        let _ = self.out.flush();
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Sequential conformance runner over one fixture registry.
pub struct TestRunner<'a> {
    config: &'a HarnessConfig,
    registry: &'a FixtureRegistry,
    discovery: &'a dyn TestDiscovery,
    executor: &'a dyn TestExecutor,
}

impl<'a> TestRunner<'a> {
    /// Runner using the filesystem and real processes.
    pub fn new(config: &'a HarnessConfig, registry: &'a FixtureRegistry) -> Self {
        Self {
            config,
            registry,
            discovery: &DefaultTestDiscovery,
            executor: &ProcessExecutor,
        }
    }

    pub fn with_discovery(mut self, discovery: &'a dyn TestDiscovery) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_executor(mut self, executor: &'a dyn TestExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Run every selected program in the test directory.
    ///
    /// ## Errors
    /// Only discovery failures (missing or unreadable directory) abort the run. Per-test problems
    /// are reported as failed outcomes.
    pub fn run(&self, reporter: &mut dyn TestReporter) -> Result<TestSummary, TestError> {
        let start = Instant::now();

        let files: Vec<TestFile> = self
            .discovery
            .discover_test_files(&self.config.test_dir)?
            .into_iter()
            .filter(|f| self.config.selects(&f.basename))
            .collect();

        let mut summary = TestSummary {
            total: files.len(),
            ..TestSummary::default()
        };
        reporter.on_collection_complete(files.len());

        for file in &files {
            let Some(fixture) = self.registry.get(&file.basename) else {
                tracing::debug!(file = %file.basename, registry = self.registry.label(), "no fixture");
                reporter.on_unregistered(file);
                summary.skipped += 1;
                continue;
            };

            let outcome = self.run_one(file, fixture);
            if outcome.passed {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            reporter.on_test_complete(&outcome);

            if self.config.stop_on_fail && !outcome.passed {
                break;
            }
        }

        summary.duration = start.elapsed();
        reporter.on_run_complete(&summary);
        Ok(summary)
    }

    /// Execute one program and judge it against its fixture.
    pub fn run_one(&self, file: &TestFile, fixture: &TestFixture) -> TestOutcome {
        let start = Instant::now();
        let request = ExecutionRequest {
            executable: &self.config.executable,
            program: &file.path,
            stdin: fixture.stdin.as_deref(),
            timeout: self.config.timeout,
        };

        let (elapsed, failure) = match self.executor.execute(&request) {
            Ok(result) if result.timed_out => (result.elapsed, Some(FailureReason::Timeout(result.elapsed))),
            Ok(result) => {
                let comparison = Comparison::new(fixture, &result);
                let failure = (!comparison.passed()).then_some(FailureReason::Mismatch(comparison.mismatches));
                (result.elapsed, failure)
            }
            Err(e) => (start.elapsed(), Some(FailureReason::Execution(e.to_string()))),
        };

        TestOutcome {
            file: file.clone(),
            passed: failure.is_none(),
            elapsed_ms: millis(elapsed),
            failure,
        }
    }
}

/// Validate the environment, run every test and report on the console (or as JSON).
pub fn run_tests(config: &HarnessConfig, registry: &FixtureRegistry, json: bool) -> CliResult<ExitCode> {
    config
        .validate()
        .map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    tracing::debug!(
        registry = registry.label(),
        fixtures = registry.len(),
        executable = %config.executable.display(),
        "starting conformance run"
    );

    let runner = TestRunner::new(config, registry);
    let result = if json {
        runner.run(&mut JsonReporter::stdio())
    } else {
        runner.run(&mut ConsoleReporter::stdio(config.verbose))
    };
    let summary = result.map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    if summary.failed > 0 {
        // Tests failed - return error with empty message (summary already printed)
        Err(CliError::new("", ExitCode::FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

// ============================================================================
// Tests
// ============================================================================
