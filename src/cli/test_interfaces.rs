//! Test runner I/O boundary interfaces
//!
//! This module defines trait-based abstractions for the two operations that touch the outside world:
//! - Test discovery (directory scan for `.b` programs)
//! - Test execution (one interpreter process per program, with input, capture and deadline)
//!
//! The runner only talks to these traits, so its comparison and reporting logic can be exercised with
//! in-memory stand-ins. The default implementations are the filesystem and `std::process`.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use jabfi_fixtures::registry::PROGRAM_EXTENSION;
use thiserror::Error;

/// Errors that occur during test operations
#[derive(Debug, Error)]
pub enum TestError {
    #[error("interpreter executable not found: {}", .0.display())]
    MissingExecutable(PathBuf),

    #[error("test directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to list {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch {}: {source}", executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("test execution failed: {0}")]
    Execution(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A discovered program file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFile {
    /// Absolute path passed to the interpreter
    pub path: PathBuf,
    /// File name used as the fixture key
    pub basename: String,
}

impl TestFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, basename }
    }
}

// ============================================================================
// Test Discovery Interface
// ============================================================================

/// Find the program files to run.
pub trait TestDiscovery {
    /// List the `.b` files directly inside `dir` (no recursion).
    /// An empty directory yields an empty list, not an error.
    fn discover_test_files(&self, dir: &Path) -> Result<Vec<TestFile>, TestError>;
}

/// Filesystem-based test discovery.
pub struct DefaultTestDiscovery;

impl TestDiscovery for DefaultTestDiscovery {
    fn discover_test_files(&self, dir: &Path) -> Result<Vec<TestFile>, TestError> {
        let dir = match fs::canonicalize(dir) {
            Ok(dir) if dir.is_dir() => dir,
            Ok(_) => return Err(TestError::MissingDirectory(dir.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TestError::MissingDirectory(dir.to_path_buf()));
            }
            Err(source) => {
                return Err(TestError::Discovery {
                    path: dir.to_path_buf(),
                    source,
                });
            }
        };

        let entries = fs::read_dir(&dir).map_err(|source| TestError::Discovery {
            path: dir.clone(),
            source,
        })?;

        let files = select_programs(&dir, entries.map(|entry| entry.map(|e| e.path())))?;
        tracing::debug!(dir = %dir.display(), count = files.len(), "discovered program files");
        Ok(files)
    }
}

/// Keep the `.b` regular files among directory entries, sorted by path.
///
/// An entry that cannot be read fails discovery rather than silently dropping a program.
fn select_programs(
    dir: &Path,
    entries: impl IntoIterator<Item = io::Result<PathBuf>>,
) -> Result<Vec<TestFile>, TestError> {
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|source| TestError::Discovery {
            path: dir.to_path_buf(),
            source,
        })?;
        if path.is_file() && path.extension().is_some_and(|ext| ext == PROGRAM_EXTENSION) {
            files.push(TestFile::new(path));
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

// ============================================================================
// Test Executor Interface
// ============================================================================

/// One interpreter invocation.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    pub executable: &'a Path,
    /// Sole positional argument
    pub program: &'a Path,
    /// Bytes written verbatim to stdin, which is then closed
    pub stdin: Option<&'a [u8]>,
    pub timeout: Option<Duration>,
}

/// What a finished (or killed) interpreter produced.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
    /// Process exit code; `None` when terminated by a signal. Not used for pass/fail.
    pub exit_code: Option<i32>,
    /// The deadline expired and the process was killed
    pub timed_out: bool,
}

/// Run one program through the interpreter and capture its output.
pub trait TestExecutor {
    fn execute(&self, request: &ExecutionRequest<'_>) -> Result<ExecutionResult, TestError>;
}

/// Interval between liveness checks while a deadline is armed.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How long output is still collected after the interpreter has exited or been killed.
pub const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// `std::process` execution with argument-vector invocation.
pub struct ProcessExecutor;

impl TestExecutor for ProcessExecutor {
    fn execute(&self, request: &ExecutionRequest<'_>) -> Result<ExecutionResult, TestError> {
        let start = Instant::now();

        let mut child = Command::new(request.executable)
            .arg(request.program)
            .stdin(if request.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TestError::Spawn {
                executable: request.executable.to_path_buf(),
                source,
            })?;

        tracing::debug!(pid = child.id(), program = %request.program.display(), "spawned interpreter");

        // Feed and drain the pipes off-thread so a child blocked on a full pipe can't stall the wait.
        // None of these threads is joined: a descendant holding a pipe open must not hold up the run.
        if let (Some(pipe), Some(bytes)) = (child.stdin.take(), request.stdin) {
            spawn_writer(pipe, bytes.to_vec());
        }
        let (tx, rx) = mpsc::channel();
        spawn_reader(child.stdout.take(), Pipe::Stdout, tx.clone());
        spawn_reader(child.stderr.take(), Pipe::Stderr, tx);

        let (status, timed_out) = match wait_with_deadline(&mut child, request.timeout) {
            Ok(waited) => waited,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.into());
            }
        };
        tracing::debug!(program = %request.program.display(), status = %status, "interpreter exited");

        let (stdout, stderr) = drain_output(&rx, DRAIN_GRACE)?;
        let elapsed = start.elapsed();

        if timed_out {
            tracing::warn!(
                program = %request.program.display(),
                elapsed_ms = elapsed.as_millis() as u64,
                "interpreter exceeded deadline; killed"
            );
        }

        Ok(ExecutionResult {
            stdout,
            stderr,
            elapsed,
            exit_code: status.code(),
            timed_out,
        })
    }
}

/// Output stream a chunk was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pipe {
    Stdout,
    Stderr,
}

type Chunk = (Pipe, io::Result<Vec<u8>>);

fn spawn_writer<W: Write + Send + 'static>(mut pipe: W, bytes: Vec<u8>) {
    thread::spawn(move || {
        let written = pipe.write_all(&bytes).and_then(|()| pipe.flush());
        // The child may exit without reading all of its input
        if let Err(e) = written {
            if e.kind() != io::ErrorKind::BrokenPipe {
                tracing::debug!(error = %e, "writing interpreter stdin failed");
            }
        }
    });
}

/// Forward everything read from `pipe` as chunks. The sender is dropped at end of stream.
fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>, which: Pipe, tx: Sender<Chunk>) {
    let Some(mut pipe) = pipe else {
        return;
    };
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send((which, Ok(buf[..n].to_vec()))).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let _ = tx.send((which, Err(e)));
                    break;
                }
            }
        }
    });
}

/// Collect stdout and stderr until both pipes close or `grace` runs out, whichever comes first.
///
/// Called once the interpreter has exited or been killed. Pipes still open after `grace` belong to
/// a surviving descendant; what arrived so far is kept and the readers are left behind.
fn drain_output(rx: &Receiver<Chunk>, grace: Duration) -> Result<(Vec<u8>, Vec<u8>), TestError> {
    let deadline = Instant::now() + grace;
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Pipe::Stdout, Ok(bytes))) => stdout.extend_from_slice(&bytes),
            Ok((Pipe::Stderr, Ok(bytes))) => stderr.extend_from_slice(&bytes),
            Ok((_, Err(e))) => return Err(e.into()),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    grace_ms = grace.as_millis() as u64,
                    "output pipes still open after interpreter ended; keeping partial output"
                );
                break;
            }
        }
    }

    Ok((stdout, stderr))
}

/// Wait for exit, killing the child once `timeout` has elapsed. Returns the status and whether the
/// deadline fired.
fn wait_with_deadline(child: &mut Child, timeout: Option<Duration>) -> io::Result<(ExitStatus, bool)> {
    let Some(timeout) = timeout else {
        return Ok((child.wait()?, false));
    };
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        if Instant::now() >= deadline {
            // Already-exited children make kill fail; the wait below still reaps them
            let _ = child.kill();
            return Ok((child.wait()?, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

// ============================================================================
// Tests
// ============================================================================
