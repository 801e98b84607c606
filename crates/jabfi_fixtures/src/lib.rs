//! Provide the expected-outcome fixtures the jabfi conformance harness judges executions against.
//!
//! A fixture names one `.b` program by basename and records what a conforming interpreter must
//! produce for it: the trimmed standard output, the trimmed standard error, and optionally the raw
//! bytes fed to its standard input.
//!
//! ## Notes
//!
//! - This is a data crate: no process spawning, no console output. The only I/O is reading a
//!   fixture file from disk in [`file::load`].
//! - Fixture tables are versioned ([`FixtureGeneration`]) so a change in the interpreter's
//!   message wording is a data update, not a runner change.
//!
//! ## Examples
//! ```rust
//! use jabfi_fixtures::{FixtureGeneration, FixtureRegistry};
//!
//! let registry = FixtureRegistry::builtin(FixtureGeneration::V1);
//! let hello = registry.get("hello_world.b").unwrap();
//! assert_eq!(hello.expected_stdout, "Hello World!");
//! assert!(registry.get("extra.b").is_none());
//! ```

pub mod errors;
pub mod file;
pub mod generations;
pub mod registry;

pub use errors::FixtureError;
pub use generations::FixtureGeneration;
pub use registry::{FixtureRegistry, TestFixture};
