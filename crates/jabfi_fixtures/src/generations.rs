//! Built-in fixture tables, one per generation of the interpreter's observable behavior.
//!
//! Each generation is a complete table. Later generations track wording changes in the
//! interpreter's diagnostics and add programs; nothing in the runner depends on which one is active.
//!
//! | generation | unmatched-bracket diagnostics                  | extra programs |
//! |------------|-------------------------------------------------|----------------|
//! | `v1`       | `Error: found ] @ 26 with unmatched [.`        |                |
//! | `v2`       | `jabfi: Found ']' with unmatched '['.`         |                |
//! | `v3`       | same as `v2`                                   | `collatz.b`    |

use std::fmt;
use std::str::FromStr;

use crate::errors::FixtureError;
use crate::registry::TestFixture;

/// Upper bound (inclusive) of the values printed by `squares.b`.
pub const SQUARES_LIMIT: u64 = 10_000;

/// Input for `collatz.b`: two CRLF-terminated numbers and a NUL end-of-input marker.
pub const COLLATZ_STDIN: &[u8] = b"5492280743\r\n4068834\r\n\0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FixtureGeneration {
    /// Offset-style diagnostics; unmatched programs print before failing.
    V1,
    /// `<progname>: ` prefixed diagnostics reported before execution.
    V2,
    /// `V2` plus stdin-driven programs.
    #[default]
    V3,
}

impl FixtureGeneration {
    pub const ALL: [FixtureGeneration; 3] = [Self::V1, Self::V2, Self::V3];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }

    /// The full fixture table for this generation.
    pub fn fixtures(self) -> Vec<TestFixture> {
        let mut fixtures = common_fixtures();
        match self {
            Self::V1 => {
                fixtures.push(
                    TestFixture::new("unmatched1.b", "#").with_stderr("Error: found ] @ 26 with unmatched [."),
                );
                fixtures.push(
                    TestFixture::new("unmatched2.b", "#").with_stderr("Error: found [ @ 26 with unmatched ]."),
                );
            }
            Self::V2 | Self::V3 => {
                fixtures.push(TestFixture::new("unmatched1.b", "").with_stderr("jabfi: Found ']' with unmatched '['."));
                fixtures.push(TestFixture::new("unmatched2.b", "").with_stderr("jabfi: Found '[' with unmatched ']'."));
            }
        }
        if self == Self::V3 {
            fixtures.push(TestFixture::new("collatz.b", "403\n253").with_stdin(COLLATZ_STDIN));
        }
        fixtures
    }
}

impl fmt::Display for FixtureGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixtureGeneration {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FixtureError::UnknownGeneration(s.to_string()))
    }
}

fn common_fixtures() -> Vec<TestFixture> {
    vec![
        TestFixture::new("hello_world.b", "Hello World!"),
        TestFixture::new("h.b", "H"),
        TestFixture::new("pound_symbol.b", "#"),
        TestFixture::new("squares.b", squares_output(SQUARES_LIMIT)),
    ]
}

/// Every perfect square in `0..=limit`, one per line, no trailing newline.
pub fn squares_output(limit: u64) -> String {
    (0u64..)
        .map(|i| i * i)
        .take_while(|sq| *sq <= limit)
        .map(|sq| sq.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
