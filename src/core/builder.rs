use crate::config::{Config, ConfigLoader};
use crate::core::context::Context;
use crate::core::error::{Error, Result};
use crate::rerun::{RerunOutcome, rerun_with};
use crate::runner::{TestRunner, create_runner_from_config};
use std::path::PathBuf;

/// Builder for configuring and running a rerun.
pub struct RerunBuilder {
    config: Option<Config>,
    report: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    rerun_output: Option<PathBuf>,
    final_output: Option<PathBuf>,
    runner: Option<Box<dyn TestRunner>>,
    extra_args: Vec<String>,
}

impl RerunBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            report: None,
            base_dir: None,
            rerun_output: None,
            final_output: None,
            runner: None,
            extra_args: Vec::new(),
        }
    }

    // --- Configuration ---

    /// Set the configuration directly.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from a TOML file, then profile and env overrides.
    pub fn from_config_file(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        self.config = Some(ConfigLoader::new().config_file(path).load()?);
        Ok(self)
    }

    /// Load `junit-rerun.toml` from `dir` if present, then profile and env overrides.
    pub fn from_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self> {
        self.config = Some(ConfigLoader::new().search_dir(dir).load()?);
        Ok(self)
    }

    // --- Inputs and outputs ---

    /// Original JUnit report.
    pub fn report(mut self, path: impl Into<PathBuf>) -> Self {
        self.report = Some(path.into());
        self
    }

    /// Directory holding the test sources.
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(path.into());
        self
    }

    /// Override `[paths] rerun-output`.
    pub fn rerun_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.rerun_output = Some(path.into());
        self
    }

    /// Override `[paths] final-output`.
    pub fn final_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.final_output = Some(path.into());
        self
    }

    /// Extra runner arguments, placed after configured ones.
    pub fn extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    // --- Runner ---

    /// Set a custom runner implementation.
    pub fn runner<R: TestRunner + 'static>(mut self, runner: R) -> Self {
        self.runner = Some(Box::new(runner));
        self
    }

    /// Use pytest.
    #[cfg(feature = "pytest")]
    pub fn pytest(mut self) -> Self {
        self.runner = Some(Box::new(crate::runner::pytest::PytestRunner::new()));
        self
    }

    // --- Build and Execute ---

    /// Build the rerun pipeline.
    pub fn build(self) -> Result<RerunPipeline> {
        let mut config = self
            .config
            .ok_or_else(|| Error::config("no configuration provided"))?;

        let report = self
            .report
            .ok_or_else(|| Error::config("report path not set (call report)"))?;

        let base_dir = self
            .base_dir
            .ok_or_else(|| Error::config("base directory not set (call base_dir)"))?;

        if let Some(path) = self.rerun_output {
            config.paths.rerun_output = path;
        }
        if let Some(path) = self.final_output {
            config.paths.final_output = path;
        }

        // Create runner from config if not explicitly set
        let runner = match self.runner {
            Some(runner) => runner,
            None => create_runner_from_config(&config)?,
        };

        let mut ctx = Context::new(config, report, base_dir)?;
        ctx.env_extra_args = crate::config::env::get_extra_runner_args();
        ctx.env_extra_args.extend(self.extra_args);

        Ok(RerunPipeline { ctx, runner })
    }

    /// Build and immediately run.
    pub fn run(self) -> Result<RerunOutcome> {
        self.build()?.run()
    }
}

impl Default for RerunBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured rerun, ready to execute.
pub struct RerunPipeline {
    ctx: Context,
    runner: Box<dyn TestRunner>,
}

impl RerunPipeline {
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn runner(&self) -> &dyn TestRunner {
        self.runner.as_ref()
    }

    /// Rerun the report's failures and merge the results.
    pub fn run(&self) -> Result<RerunOutcome> {
        rerun_with(&self.ctx, self.runner.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{RerunInvocation, RunResult};

    struct NoopRunner;

    impl TestRunner for NoopRunner {
        fn run(&self, _ctx: &Context, _invocation: &RerunInvocation) -> Result<RunResult> {
            Ok(RunResult::success())
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "noop"
        }
    }

    #[test]
    fn test_builder_error_missing_config() {
        let result = RerunBuilder::new()
            .report("/tmp/report.xml")
            .base_dir("/tmp")
            .build();
        let err = result.err().expect("should fail");
        assert!(err.to_string().contains("no configuration"));
    }

    #[test]
    fn test_builder_error_missing_report() {
        let result = RerunBuilder::new()
            .with_config(Config::default())
            .base_dir("/tmp")
            .build();
        let err = result.err().expect("should fail");
        assert!(err.to_string().contains("report path"));
    }

    #[test]
    fn test_builder_error_missing_base_dir() {
        let result = RerunBuilder::new()
            .with_config(Config::default())
            .report("/tmp/report.xml")
            .build();
        let err = result.err().expect("should fail");
        assert!(err.to_string().contains("base directory"));
    }

    #[test]
    fn test_builder_output_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = RerunBuilder::new()
            .with_config(Config::default())
            .report(dir.path().join("report.xml"))
            .base_dir(dir.path())
            .rerun_output(dir.path().join("r.xml"))
            .final_output(dir.path().join("f.xml"))
            .runner(NoopRunner)
            .build()
            .unwrap();

        assert_eq!(pipeline.context().rerun_output, dir.path().join("r.xml"));
        assert_eq!(pipeline.context().final_output, dir.path().join("f.xml"));
        assert_eq!(pipeline.runner().name(), "noop");
    }

    #[cfg(feature = "pytest")]
    #[test]
    fn test_builder_defaults_to_pytest() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = RerunBuilder::new()
            .with_config(Config::default())
            .report(dir.path().join("report.xml"))
            .base_dir(dir.path())
            .build()
            .unwrap();
        assert_eq!(pipeline.runner().name(), "pytest");
    }
}
