//! Terminal output formatting for analysis, rerun and merge results.

use crate::merge::MergeOutcome;
use crate::report::{Analysis, Status, Summary};
use crate::rerun::{RerunOutcome, RerunSummary};
use std::io::{self, Write};

/// Formats results for the terminal.
pub struct ResultFormatter {
    show_passed: bool,
}

impl ResultFormatter {
    /// Create a formatter; passed cases are listed only when `show_passed` is set.
    pub fn new(show_passed: bool) -> Self {
        Self { show_passed }
    }

    /// Print per-case results and the summary line of an analysis.
    pub fn analysis(&self, out: &mut impl Write, analysis: &Analysis) -> io::Result<()> {
        if let Some(ref err) = analysis.parse_error {
            writeln!(out, "report could not be parsed: {err}")?;
        }

        for record in analysis.all() {
            if record.status == Status::Passed && !self.show_passed {
                continue;
            }
            writeln!(
                out,
                "[{}] {}::{}",
                record.status.marker(),
                record.classname,
                record.name
            )?;
        }

        self.summary_line(out, &analysis.summary())
    }

    /// Print the outcome of a rerun pipeline.
    pub fn rerun(&self, out: &mut impl Write, outcome: &RerunOutcome) -> io::Result<()> {
        match outcome {
            RerunOutcome::NoFailures => writeln!(out, "No failed tests found in the report."),
            RerunOutcome::NothingToRerun {
                failed_before,
                unresolved,
            } => {
                writeln!(
                    out,
                    "Found {failed_before} failed test(s), but no test files could be located."
                )?;
                for identity in unresolved {
                    writeln!(out, "[MISSING] {identity}")?;
                }
                Ok(())
            }
            RerunOutcome::Completed(summary) => self.rerun_summary(out, summary),
        }
    }

    fn rerun_summary(&self, out: &mut impl Write, summary: &RerunSummary) -> io::Result<()> {
        for identity in &summary.unresolved {
            writeln!(out, "[MISSING] {identity}")?;
        }
        if summary.fallback_matches > 0 {
            writeln!(
                out,
                "{} test file(s) located by name search",
                summary.fallback_matches
            )?;
        }

        writeln!(out, "failed before rerun: {}", summary.failed_before)?;
        writeln!(
            out,
            "passed after rerun: {}, still failing: {} ({} failed, {} errors, {} skipped)",
            summary.passed_after_rerun,
            summary.still_failing,
            summary.failed,
            summary.error,
            summary.skipped
        )?;
        match summary.updated_report {
            Some(ref path) => writeln!(
                out,
                "{} test case(s) updated in {}",
                summary.updated,
                path.display()
            )?,
            None => writeln!(out, "no merged report was written")?,
        }

        let status = if summary.still_failing == 0 && summary.unresolved.is_empty() {
            "ok"
        } else {
            "FAILED"
        };
        write!(
            out,
            "\nrerun result: {status}. {} passed, {} failed",
            summary.passed_after_rerun, summary.still_failing
        )?;
        if summary.timed_out {
            write!(out, " (timed out)")?;
        }
        writeln!(out)
    }

    /// Print the result of a standalone merge.
    pub fn merge(&self, out: &mut impl Write, outcome: &MergeOutcome) -> io::Result<()> {
        match outcome.output {
            Some(ref path) => writeln!(
                out,
                "{} test case(s) updated, written to {}",
                outcome.updated,
                path.display()
            ),
            None => writeln!(out, "original report could not be parsed; nothing written"),
        }
    }

    /// Print the test summary line.
    fn summary_line(&self, out: &mut impl Write, summary: &Summary) -> io::Result<()> {
        let status = if summary.failures + summary.errors == 0 {
            "ok"
        } else {
            "FAILED"
        };

        writeln!(
            out,
            "\ntest result: {status}. {} passed, {} failed, {} errors, {} skipped; finished in {:.3}s",
            summary.passed, summary.failures, summary.errors, summary.skipped, summary.time
        )
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}
