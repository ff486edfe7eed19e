//! The rerun pipeline: find failures, rerun them, merge the outcome.

use crate::core::context::Context;
use crate::core::error::{Error, Result};
use crate::merge::{MergeOutcome, merge_reports};
use crate::report::{Report, analyze};
use crate::resolve::FailingIdentity;
use crate::runner::{RerunInvocation, RunResult, TestRunner, create_runner_from_config};
use crate::util::{ensure_dir_exists, remove_stale_file};
use serde::Serialize;
use std::path::PathBuf;

/// How a rerun pipeline ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RerunOutcome {
    /// The original report has no failed or errored cases.
    NoFailures,
    /// There were failures, but none could be mapped to a source file, so the
    /// runner was not invoked.
    NothingToRerun {
        failed_before: usize,
        unresolved: Vec<FailingIdentity>,
    },
    /// The runner was invoked and its report merged.
    Completed(RerunSummary),
}

impl RerunOutcome {
    pub fn summary(&self) -> Option<&RerunSummary> {
        match self {
            RerunOutcome::Completed(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Counts of a completed rerun.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RerunSummary {
    /// Failing identities found in the original report.
    pub failed_before: usize,
    /// Cases that passed in the rerun report.
    pub passed_after_rerun: usize,
    /// `failed + error + skipped` in the rerun report.
    pub still_failing: usize,
    pub failed: usize,
    pub error: usize,
    pub skipped: usize,
    /// Original cases promoted to passed.
    pub updated: usize,
    /// Merged report, unless the original could not be parsed or written.
    pub updated_report: Option<PathBuf>,
    /// Identities with no matching source file; they were not rerun.
    pub unresolved: Vec<FailingIdentity>,
    /// Targets located by searching the tree rather than by classname.
    pub fallback_matches: usize,
    /// Runner exit code; advisory only.
    pub exit_code: i32,
    pub timed_out: bool,
}

/// Rerun the failures of `ctx.report_path` with the configured runner.
pub fn rerun(ctx: &Context) -> Result<RerunOutcome> {
    let runner = create_runner_from_config(&ctx.config)?;
    rerun_with(ctx, runner.as_ref())
}

/// Rerun the failures of `ctx.report_path` with `runner`.
///
/// Fails only when the original report or the base directory is missing.
/// Every later problem is logged and degrades the result instead.
pub fn rerun_with(ctx: &Context, runner: &dyn TestRunner) -> Result<RerunOutcome> {
    check_inputs(ctx)?;
    tracing::info!(root = %ctx.project_root.display(), "using project root");

    let identities = match Report::load(&ctx.report_path) {
        Ok(report) => report.failing_identities(),
        Err(e) => {
            tracing::warn!(path = %ctx.report_path.display(), error = %e, "unable to parse report");
            Vec::new()
        }
    };
    if identities.is_empty() {
        tracing::info!("no failed tests found in the report");
        return Ok(RerunOutcome::NoFailures);
    }
    tracing::info!(count = identities.len(), "found failed tests");

    let resolution = ctx.resolver().resolve_all(&identities);
    let invocation = RerunInvocation::new(&resolution.resolved, &ctx.rerun_output, &ctx.project_root);
    if invocation.is_empty() {
        tracing::warn!("no test files found for rerun");
        return Ok(RerunOutcome::NothingToRerun {
            failed_before: identities.len(),
            unresolved: resolution.unresolved,
        });
    }

    prepare_rerun_output(ctx);
    let run = runner.run(ctx, &invocation).unwrap_or_else(|e| {
        tracing::error!(runner = runner.name(), error = %e, "runner failed to execute");
        RunResult::failed(-1)
    });
    if !run.success {
        tracing::info!(exit_code = run.exit_code, "runner reported failures");
    }

    let rerun_counts = analyze(&ctx.rerun_output).summary();
    let merged = merge_reports(&ctx.report_path, &ctx.rerun_output, &ctx.final_output)
        .unwrap_or_else(|e| {
            tracing::error!(path = %ctx.final_output.display(), error = %e, "unable to write merged report");
            MergeOutcome {
                updated: 0,
                output: None,
            }
        });

    Ok(RerunOutcome::Completed(RerunSummary {
        failed_before: identities.len(),
        passed_after_rerun: rerun_counts.passed,
        still_failing: rerun_counts.not_passed(),
        failed: rerun_counts.failures,
        error: rerun_counts.errors,
        skipped: rerun_counts.skipped,
        updated: merged.updated,
        updated_report: merged.output,
        unresolved: resolution.unresolved,
        fallback_matches: resolution.fallback_matches,
        exit_code: run.exit_code,
        timed_out: run.timed_out,
    }))
}

fn check_inputs(ctx: &Context) -> Result<()> {
    if !ctx.report_path.is_file() {
        return Err(Error::FileNotFound(ctx.report_path.clone()));
    }
    if !ctx.base_dir.is_dir() {
        return Err(Error::BaseDirNotFound(ctx.base_dir.clone()));
    }
    Ok(())
}

/// Remove a rerun report left by an earlier run so it is never mistaken for
/// this run's output.
fn prepare_rerun_output(ctx: &Context) {
    match remove_stale_file(&ctx.rerun_output) {
        Ok(true) => tracing::debug!(path = %ctx.rerun_output.display(), "removed stale rerun report"),
        Ok(false) => {}
        Err(e) => tracing::warn!(path = %ctx.rerun_output.display(), error = %e, "unable to remove stale rerun report"),
    }
    if let Some(parent) = ctx.rerun_output.parent()
        && let Err(e) = ensure_dir_exists(parent)
    {
        tracing::warn!(path = %parent.display(), error = %e, "unable to create rerun output directory");
    }
}
