//! Harness configuration
//!
//! Everything the runner needs to know about its environment lives in [`HarnessConfig`], which
//! is built once by the CLI and passed in. Nothing reads ambient globals after that.

use std::env;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use super::test_interfaces::TestError;

/// Basename of the interpreter under test, without platform suffix.
pub const EXECUTABLE_NAME: &str = "jabfi";

/// Wall-clock budget for one program unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runner configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory scanned (non-recursively) for `.b` programs
    pub test_dir: PathBuf,
    /// Interpreter executable invoked once per program
    pub executable: PathBuf,
    /// Per-program deadline; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Print mismatch details under failed tests
    pub verbose: bool,
    /// Stop after the first failed test
    pub stop_on_fail: bool,
    /// Only run programs whose basename contains this keyword
    pub filter: Option<String>,
}

impl HarnessConfig {
    /// Create a config for an explicit test directory and executable.
    pub fn new(test_dir: impl Into<PathBuf>, executable: impl Into<PathBuf>) -> Self {
        Self {
            test_dir: test_dir.into(),
            executable: executable.into(),
            timeout: Some(DEFAULT_TIMEOUT),
            verbose: false,
            stop_on_fail: false,
            filter: None,
        }
    }

    /// Config rooted at the directory containing the running harness binary.
    ///
    /// The test programs sit next to the harness, and the interpreter is expected one level up
    /// (`<dir>/../jabfi`).
    pub fn from_current_exe() -> Result<Self, TestError> {
        let exe = env::current_exe()?;
        let dir = exe
            .parent()
            .ok_or_else(|| TestError::MissingDirectory(exe.clone()))?
            .to_path_buf();
        let executable = default_executable_for(&dir);
        Ok(Self::new(dir, executable))
    }

    pub fn with_test_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.test_dir = dir.into();
        self
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_stop_on_fail(mut self, stop_on_fail: bool) -> Self {
        self.stop_on_fail = stop_on_fail;
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    /// Check the preconditions without which no test can run.
    ///
    /// ## Errors
    /// - [`TestError::MissingExecutable`] if the executable resolves to no file.
    /// - [`TestError::MissingDirectory`] if the test directory is not a directory.
    pub fn validate(&self) -> Result<(), TestError> {
        if self.resolve_executable().is_none() {
            return Err(TestError::MissingExecutable(self.executable.clone()));
        }
        if !self.test_dir.is_dir() {
            return Err(TestError::MissingDirectory(self.test_dir.clone()));
        }
        Ok(())
    }

    /// The file that will be spawned for [`Self::executable`].
    ///
    /// A bare name such as `jabfi` is looked up on `PATH` the way the process spawner does. Anything
    /// with a directory part is taken as a path.
    pub fn resolve_executable(&self) -> Option<PathBuf> {
        resolve_executable_in(&self.executable, env::var_os("PATH").as_deref())
    }

    /// Whether a program basename passes the keyword filter.
    pub fn selects(&self, basename: &str) -> bool {
        self.filter.as_deref().is_none_or(|keyword| basename.contains(keyword))
    }
}

fn resolve_executable_in(executable: &Path, search_path: Option<&OsStr>) -> Option<PathBuf> {
    let mut components = executable.components();
    let bare = matches!((components.next(), components.next()), (Some(Component::Normal(_)), None));
    if !bare {
        return executable.is_file().then(|| executable.to_path_buf());
    }

    let suffixed = {
        let mut name = executable.as_os_str().to_owned();
        name.push(env::consts::EXE_SUFFIX);
        name
    };
    env::split_paths(search_path?)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| [dir.join(executable), dir.join(&suffixed)])
        .find(|candidate| candidate.is_file())
}

/// `<dir>/../jabfi` with the platform executable suffix.
pub fn default_executable_for(test_dir: &Path) -> PathBuf {
    let name = format!("{EXECUTABLE_NAME}{}", env::consts::EXE_SUFFIX);
    match test_dir.parent() {
        Some(parent) => parent.join(name),
        None => test_dir.join(name),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_executable_is_sibling_of_test_dir() {
        let exe = default_executable_for(Path::new("/opt/jabfi/tests"));
        let expected = format!("/opt/jabfi/{EXECUTABLE_NAME}{}", env::consts::EXE_SUFFIX);
        assert_eq!(exe, PathBuf::from(expected));
    }

    #[test]
    fn test_builder_overrides() {
        let config = HarnessConfig::new("a", "b")
            .with_test_dir("c")
            .with_executable("d")
            .with_timeout(None)
            .with_verbose(true)
            .with_stop_on_fail(true)
            .with_filter(Some("sq".into()));
        assert_eq!(config.test_dir, PathBuf::from("c"));
        assert_eq!(config.executable, PathBuf::from("d"));
        assert_eq!(config.timeout, None);
        assert!(config.verbose && config.stop_on_fail);
        assert!(config.selects("squares.b"));
        assert!(!config.selects("hello_world.b"));
    }

    #[test]
    fn test_no_filter_selects_everything() {
        let config = HarnessConfig::new("a", "b");
        assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT));
        assert!(config.selects("anything.b"));
    }

    #[test]
    fn test_validate_reports_missing_executable_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::new(dir.path(), dir.path().join("nope"));
        assert!(matches!(config.validate(), Err(TestError::MissingExecutable(_))));
    }

    #[test]
    fn test_validate_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("jabfi");
        std::fs::write(&exe, "").unwrap();
        let config = HarnessConfig::new(dir.path().join("missing"), &exe);
        assert!(matches!(config.validate(), Err(TestError::MissingDirectory(_))));

        let config = HarnessConfig::new(dir.path(), &exe);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bare_name_resolves_through_search_path() {
        let bin = tempfile::tempdir().unwrap();
        let exe = bin.path().join("jabfi");
        std::fs::write(&exe, "").unwrap();
        let search = env::join_paths([Path::new("/nonexistent-dir"), bin.path()]).unwrap();

        assert_eq!(resolve_executable_in(Path::new("jabfi"), Some(&search)), Some(exe));
        assert_eq!(resolve_executable_in(Path::new("bf"), Some(&search)), None);
        assert_eq!(resolve_executable_in(Path::new("jabfi"), None), None);
    }

    #[test]
    fn test_name_with_directory_part_is_not_searched() {
        let bin = tempfile::tempdir().unwrap();
        std::fs::write(bin.path().join("jabfi"), "").unwrap();
        let search = env::join_paths([bin.path()]).unwrap();

        assert_eq!(resolve_executable_in(Path::new("./jabfi"), Some(&search)), None);
        assert_eq!(resolve_executable_in(Path::new("sub/jabfi"), Some(&search)), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_accepts_executable_on_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::new(dir.path(), "sh");
        assert!(config.validate().is_ok());

        let config = HarnessConfig::new(dir.path(), "no-such-jabfi-interpreter");
        assert!(matches!(config.validate(), Err(TestError::MissingExecutable(_))));
    }
}
