//! Runner trait and pytest implementation for rerunning selected tests.

use crate::core::context::Context;
use crate::core::error::Result;
use crate::resolve::ResolvedLocation;
use std::path::PathBuf;

// Runner implementations
#[cfg(feature = "pytest")]
pub mod pytest;

/// Runner trait for executing a subset of tests.
pub trait TestRunner: Send + Sync {
    /// Run exactly the invocation's targets, writing a JUnit report to
    /// `invocation.report_path`.
    ///
    /// The returned exit status is advisory; the report is read regardless.
    fn run(&self, ctx: &Context, invocation: &RerunInvocation) -> Result<RunResult>;

    /// Check if the runner is available on the system.
    fn is_available(&self) -> bool;

    /// Validate runner configuration.
    fn validate(&self, ctx: &Context) -> Result<()> {
        if !self.is_available() {
            return Err(crate::core::error::Error::runner(format!(
                "{} is not available on this system",
                self.name()
            )));
        }

        let _ = ctx;
        Ok(())
    }

    /// Get a human-readable name for this runner.
    fn name(&self) -> &str;
}

/// One runner invocation over a set of `file::testname` targets.
#[derive(Debug, Clone, PartialEq)]
pub struct RerunInvocation {
    pub targets: Vec<String>,
    pub report_path: PathBuf,
    pub working_dir: PathBuf,
}

impl RerunInvocation {
    /// Build an invocation from resolved locations. Duplicate targets, such as
    /// a test reported twice, are passed once.
    pub fn new(
        locations: &[ResolvedLocation],
        report_path: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
    ) -> Self {
        let mut targets: Vec<String> = Vec::with_capacity(locations.len());
        for target in locations.iter().map(ResolvedLocation::target) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
        Self {
            targets,
            report_path: report_path.into(),
            working_dir: working_dir.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Result of a runner invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Exit code from the runner, `-1` when killed by a signal.
    pub exit_code: i32,

    /// Whether the runner exited successfully.
    pub success: bool,

    /// Whether the run was terminated due to a timeout.
    pub timed_out: bool,
}

impl RunResult {
    /// Create a new run result.
    pub fn new(exit_code: i32, success: bool) -> Self {
        Self {
            exit_code,
            success,
            timed_out: false,
        }
    }

    /// Create a successful result with exit code 0.
    pub fn success() -> Self {
        Self::new(0, true)
    }

    /// Create a failed result with the given exit code.
    pub fn failed(exit_code: i32) -> Self {
        Self::new(exit_code, false)
    }

    /// Mark the result as timed out.
    pub fn with_timeout(mut self) -> Self {
        self.timed_out = true;
        self.success = false;
        self
    }
}

/// Create the runner selected by the configuration.
pub fn create_runner_from_config(config: &crate::config::Config) -> Result<Box<dyn TestRunner>> {
    match config.runner.kind {
        #[cfg(feature = "pytest")]
        crate::config::RunnerKind::Pytest => Ok(Box::new(pytest::PytestRunner::with_python(
            &config.runner.pytest.python,
        ))),

        #[cfg(not(feature = "pytest"))]
        crate::config::RunnerKind::Pytest => {
            Err(crate::core::error::Error::feature_not_enabled("pytest"))
        }
    }
}
