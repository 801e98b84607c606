//! Errors raised while building a fixture registry.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    /// Two fixtures claim the same basename.
    #[error("duplicate fixture name '{0}'")]
    Duplicate(String),

    #[error("fixture name '{0}' is not a `.b` basename")]
    InvalidName(String),

    #[error("unknown fixture generation '{0}' (expected one of: v1, v2, v3)")]
    UnknownGeneration(String),

    #[error("failed to read fixture file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed fixture file: {0}")]
    Parse(#[from] serde_json::Error),
}
