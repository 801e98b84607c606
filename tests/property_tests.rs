//! Property-based tests for output normalization and comparison
//!
//! These use proptest to check that only trailing whitespace is forgiven when judging a captured
//! stream against its fixture.

use jabfi_conformance::{Comparison, ExecutionResult, TestFixture, normalize};
use proptest::prelude::*;

fn result_with_stdout(stdout: &str) -> ExecutionResult {
    ExecutionResult {
        stdout: stdout.as_bytes().to_vec(),
        ..ExecutionResult::default()
    }
}

proptest! {
    /// Property: appending trailing whitespace never changes the normalized value
    #[test]
    fn trailing_whitespace_is_ignored(body in "[a-zA-Z0-9!#\\[\\]' \n]{0,40}", tail in "[ \t\r\n]{0,8}") {
        let padded = format!("{body}{tail}");
        prop_assert_eq!(normalize(padded.as_bytes()), body.trim_end());
    }

    /// Property: expected output plus trailing newlines/spaces still passes
    #[test]
    fn padded_output_matches_fixture(expected in "[a-z0-9][a-z0-9 \n]{0,30}[a-z0-9]", tail in "[ \n]{1,5}") {
        let fixture = TestFixture::new("p.b", expected.clone());
        let result = result_with_stdout(&format!("{expected}{tail}"));
        prop_assert!(Comparison::new(&fixture, &result).passed());
    }

    /// Property: leading whitespace is significant
    #[test]
    fn leading_whitespace_fails(expected in "[a-z0-9][a-z0-9 \n]{0,30}", lead in "[ \n\t]{1,3}") {
        let fixture = TestFixture::new("p.b", expected.clone());
        let result = result_with_stdout(&format!("{lead}{expected}"));
        prop_assert!(!Comparison::new(&fixture, &result).passed());
    }

    /// Property: changing internal whitespace is significant
    #[test]
    fn internal_whitespace_fails(left in "[a-z0-9]{1,10}", right in "[a-z0-9]{1,10}", extra in "[ \n]{1,3}") {
        let fixture = TestFixture::new("p.b", format!("{left} {right}"));
        let result = result_with_stdout(&format!("{left} {extra}{right}"));
        prop_assert!(!Comparison::new(&fixture, &result).passed());
    }

    /// Property: stdout and stderr are judged independently
    #[test]
    fn stderr_mismatch_alone_fails(stdout in "[a-z]{0,10}", stderr in "[a-z]{1,10}") {
        let fixture = TestFixture::new("p.b", stdout.clone());
        let result = ExecutionResult {
            stdout: stdout.into_bytes(),
            stderr: stderr.into_bytes(),
            ..ExecutionResult::default()
        };
        let comparison = Comparison::new(&fixture, &result);
        prop_assert_eq!(comparison.mismatches.len(), 1);
    }
}
