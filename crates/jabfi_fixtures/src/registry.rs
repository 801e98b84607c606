//! The fixture record and the read-only registry keyed by program basename.
//!
//! ## Notes
//! - Lookup is an exact, case-sensitive basename match. There are no wildcards and no partial
//!   matches; a miss is reported by the runner as an unregistered file, never as an error here.
//! - A registry is built once and then only read.

use std::collections::HashMap;

use crate::errors::FixtureError;
use crate::generations::FixtureGeneration;

/// Reserved extension of interpreter program files, without the dot.
pub const PROGRAM_EXTENSION: &str = "b";

/// Expected result of running one program file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFixture {
    /// Basename of the program file (for example `hello_world.b`).
    pub name: String,
    /// Raw bytes written to the interpreter's stdin, sent unmodified.
    pub stdin: Option<Vec<u8>>,
    pub expected_stdout: String,
    pub expected_stderr: String,
}

impl TestFixture {
    /// Create a fixture that feeds no input and expects no error output.
    pub fn new(name: impl Into<String>, expected_stdout: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stdin: None,
            expected_stdout: expected_stdout.into(),
            expected_stderr: String::new(),
        }
    }

    pub fn with_stdin(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    pub fn with_stderr(mut self, expected_stderr: impl Into<String>) -> Self {
        self.expected_stderr = expected_stderr.into();
        self
    }
}

/// Immutable mapping from program basename to [`TestFixture`].
#[derive(Debug, Clone)]
pub struct FixtureRegistry {
    label: String,
    fixtures: HashMap<String, TestFixture>,
}

impl FixtureRegistry {
    /// Build a registry from a list of fixtures.
    ///
    /// ## Errors
    /// - [`FixtureError::Duplicate`] if two fixtures share a name.
    /// - [`FixtureError::InvalidName`] if a name is not a plain `.b` basename.
    pub fn from_fixtures(
        label: impl Into<String>,
        fixtures: impl IntoIterator<Item = TestFixture>,
    ) -> Result<Self, FixtureError> {
        let mut map = HashMap::new();
        for fixture in fixtures {
            if !is_program_basename(&fixture.name) {
                return Err(FixtureError::InvalidName(fixture.name));
            }
            if map.contains_key(&fixture.name) {
                return Err(FixtureError::Duplicate(fixture.name));
            }
            map.insert(fixture.name.clone(), fixture);
        }
        Ok(Self {
            label: label.into(),
            fixtures: map,
        })
    }

    /// Registry for one of the built-in fixture generations.
    pub fn builtin(generation: FixtureGeneration) -> Self {
        let fixtures = generation.fixtures();
        let map = fixtures.into_iter().map(|f| (f.name.clone(), f)).collect();
        Self {
            label: generation.as_str().to_string(),
            fixtures: map,
        }
    }

    /// Look up the fixture for a program basename.
    pub fn get(&self, basename: &str) -> Option<&TestFixture> {
        self.fixtures.get(basename)
    }

    /// Name of the fixture generation or file this registry was built from.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Registered basenames in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fixtures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn is_program_basename(name: &str) -> bool {
    !name.contains(['/', '\\'])
        && name
            .strip_suffix(PROGRAM_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
            .is_some_and(|stem| !stem.is_empty())
}
