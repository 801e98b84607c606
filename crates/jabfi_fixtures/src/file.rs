//! JSON fixture files, for running the harness against fixture sets that are not built in.
//!
//! ```json
//! {
//!   "label": "nightly",
//!   "fixtures": [
//!     { "name": "hello_world.b", "stdout": "Hello World!" },
//!     { "name": "echo.b", "stdin": "abc\r\n", "stdout": "abc" },
//!     { "name": "nul.b", "stdin": [104, 105, 0], "stdout": "hi" }
//!   ]
//! }
//! ```
//!
//! `stdin` is either text (sent as its UTF-8 bytes) or an array of byte values. `stdout` and
//! `stderr` default to empty.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::FixtureError;
use crate::registry::{FixtureRegistry, TestFixture};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    label: Option<String>,
    fixtures: Vec<FixtureEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureEntry {
    name: String,
    #[serde(default)]
    stdin: Option<StdinBytes>,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StdinBytes {
    Text(String),
    Bytes(Vec<u8>),
}

impl StdinBytes {
    fn into_bytes(self) -> Vec<u8> {
        match self {
            StdinBytes::Text(s) => s.into_bytes(),
            StdinBytes::Bytes(b) => b,
        }
    }
}

impl From<FixtureEntry> for TestFixture {
    fn from(entry: FixtureEntry) -> Self {
        TestFixture {
            name: entry.name,
            stdin: entry.stdin.map(StdinBytes::into_bytes),
            expected_stdout: entry.stdout,
            expected_stderr: entry.stderr,
        }
    }
}

/// Parse a fixture registry from JSON text. `default_label` is used when the file has no label.
pub fn from_json_str(json: &str, default_label: &str) -> Result<FixtureRegistry, FixtureError> {
    let file: FixtureFile = serde_json::from_str(json)?;
    let label = file.label.unwrap_or_else(|| default_label.to_string());
    FixtureRegistry::from_fixtures(label, file.fixtures.into_iter().map(TestFixture::from))
}

/// Read and parse a fixture file. The label defaults to the file name.
pub fn load(path: &Path) -> Result<FixtureRegistry, FixtureError> {
    let json = fs::read_to_string(path).map_err(|source| FixtureError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let default_label = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    from_json_str(&json, &default_label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_byte_stdin() {
        let registry = from_json_str(
            r#"{
                "fixtures": [
                    { "name": "echo.b", "stdin": "a\r\nb", "stdout": "ab" },
                    { "name": "nul.b", "stdin": [13, 10, 0], "stderr": "oops" }
                ]
            }"#,
            "inline",
        )
        .unwrap();

        assert_eq!(registry.label(), "inline");
        let echo = registry.get("echo.b").unwrap();
        assert_eq!(echo.stdin.as_deref(), Some(&b"a\r\nb"[..]));
        assert_eq!(echo.expected_stderr, "");

        let nul = registry.get("nul.b").unwrap();
        assert_eq!(nul.stdin.as_deref(), Some(&[13u8, 10, 0][..]));
        assert_eq!(nul.expected_stdout, "");
        assert_eq!(nul.expected_stderr, "oops");
    }

    #[test]
    fn test_label_from_file() {
        let registry = from_json_str(r#"{ "label": "nightly", "fixtures": [] }"#, "ignored").unwrap();
        assert_eq!(registry.label(), "nightly");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = from_json_str(r#"{ "fixtures": [ { "name": "a.b", "stdot": "x" } ] }"#, "x").unwrap_err();
        assert!(matches!(err, FixtureError::Parse(_)));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = from_json_str(r#"{ "fixtures": [ { "name": "a.b" }, { "name": "a.b" } ] }"#, "x").unwrap_err();
        assert!(matches!(err, FixtureError::Duplicate(_)));
    }
}
