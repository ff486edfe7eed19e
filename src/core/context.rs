use crate::config::Config;
use crate::core::error::Result;
use crate::resolve::{IdentityResolver, find_project_root};
use std::path::{Path, PathBuf};

/// Context object that carries the explicit paths of one rerun pipeline.
pub struct Context {
    /// Configuration.
    pub config: Config,

    /// Original JUnit report.
    pub report_path: PathBuf,

    /// Directory holding the test sources.
    pub base_dir: PathBuf,

    /// Directory the runner is started in.
    pub project_root: PathBuf,

    /// Absolute path of the report written by the runner.
    pub rerun_output: PathBuf,

    /// Absolute path of the merged report.
    pub final_output: PathBuf,

    /// Extra runner arguments from `JUNIT_RERUN_RUNNER_ARGS`.
    pub env_extra_args: Vec<String>,
}

impl Context {
    /// Create a context for rerunning the failures of `report_path`.
    ///
    /// The base directory and the output paths are made absolute against the
    /// current directory; the runner is started in the project root.
    pub fn new(
        config: Config,
        report_path: impl Into<PathBuf>,
        base_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let report_path = report_path.into();
        let base_dir = std::path::absolute(base_dir.into())?;
        let project_root = find_project_root(&base_dir, &config.resolver.root_marker);
        let rerun_output = std::path::absolute(&config.paths.rerun_output)?;
        let final_output = std::path::absolute(&config.paths.final_output)?;

        Ok(Self {
            config,
            report_path,
            base_dir,
            project_root,
            rerun_output,
            final_output,
            env_extra_args: Vec::new(),
        })
    }

    /// Resolver for the configured base directory and extension.
    pub fn resolver(&self) -> IdentityResolver {
        IdentityResolver::new(&self.base_dir).with_extension(&self.config.resolver.extension)
    }

    /// Arguments appended to every runner invocation, config first.
    pub fn extra_runner_args(&self) -> impl Iterator<Item = &String> {
        self.config
            .runner
            .pytest
            .extra_args
            .iter()
            .chain(&self.env_extra_args)
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }
}
