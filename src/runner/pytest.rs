use super::{RerunInvocation, RunResult, TestRunner};
use crate::core::context::Context;
use crate::core::error::{Error, Result};
use std::ffi::OsString;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Runs tests through `python -m pytest`.
pub struct PytestRunner {
    /// Interpreter override; the context's `[runner.pytest] python` otherwise.
    python: Option<String>,
}

impl PytestRunner {
    /// Create a pytest runner using the configured interpreter.
    pub fn new() -> Self {
        Self { python: None }
    }

    /// Create a pytest runner pinned to `python`.
    pub fn with_python(python: impl Into<String>) -> Self {
        Self {
            python: Some(python.into()),
        }
    }

    fn python<'a>(&'a self, ctx: &'a Context) -> &'a str {
        self.python
            .as_deref()
            .unwrap_or(&ctx.config.runner.pytest.python)
    }

    /// Arguments passed to the interpreter, targets last.
    pub fn command_args(ctx: &Context, invocation: &RerunInvocation) -> Vec<OsString> {
        let pytest = &ctx.config.runner.pytest;
        let mut args: Vec<OsString> = vec![
            "-m".into(),
            "pytest".into(),
            "-v".into(),
            format!("--tb={}", pytest.traceback).into(),
            format!("--maxfail={}", pytest.maxfail).into(),
            "--disable-warnings".into(),
            "--junitxml".into(),
            invocation.report_path.clone().into(),
        ];
        args.extend(ctx.extra_runner_args().map(OsString::from));
        args.extend(invocation.targets.iter().map(OsString::from));
        args
    }

    fn check_available(python: &str) -> bool {
        Command::new(python)
            .args(["-m", "pytest", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|status| status.success())
    }
}

impl Default for PytestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRunner for PytestRunner {
    fn run(&self, ctx: &Context, invocation: &RerunInvocation) -> Result<RunResult> {
        let python = self.python(ctx);

        let mut cmd = Command::new(python);
        cmd.args(Self::command_args(ctx, invocation));
        cmd.current_dir(&invocation.working_dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        tracing::info!(targets = invocation.targets.len(), "rerunning failed tests");
        tracing::debug!(command = ?cmd, "executing runner");

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::runner(format!("failed to execute {}: {}", python, e)))?;

        // Set up timeout watchdog
        let timed_out = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        if let Some(timeout_secs) = ctx.config.runner.timeout {
            let timed_out = timed_out.clone();
            let finished = finished.clone();
            let child_id = child.id();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_secs(timeout_secs));
                if !finished.swap(true, Ordering::SeqCst) {
                    timed_out.store(true, Ordering::SeqCst);
                    #[cfg(unix)]
                    {
                        unsafe {
                            libc::kill(child_id as i32, libc::SIGKILL);
                        }
                    }
                    #[cfg(not(unix))]
                    {
                        let _ = child_id;
                    }
                }
            });
        }

        let status = child
            .wait()
            .map_err(|e| Error::runner(format!("failed to wait for {}: {}", python, e)))?;

        // Stop the watchdog from killing a reused pid; it is not joined so the
        // caller does not wait out the full timeout.
        finished.store(true, Ordering::SeqCst);

        let exit_code = status.code().unwrap_or(-1);
        let mut result = RunResult::new(exit_code, status.success());
        if timed_out.load(Ordering::SeqCst) {
            tracing::warn!(
                timeout = ?ctx.config.runner.timeout,
                "runner timed out and was killed"
            );
            result = result.with_timeout();
        }
        Ok(result)
    }

    fn is_available(&self) -> bool {
        let default = crate::config::PytestConfig::default().python;
        Self::check_available(self.python.as_deref().unwrap_or(&default))
    }

    fn validate(&self, ctx: &Context) -> Result<()> {
        let python = self.python(ctx);
        if !Self::check_available(python) {
            return Err(Error::runner(format!(
                "pytest is not available for {}",
                python
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "pytest"
    }
}
