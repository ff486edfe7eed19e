//! junit-rerun: rerun the failing tests of a JUnit XML report and merge the
//! outcomes back into one authoritative report.
//!
//! The pipeline reads a report, classifies every test case, maps failed and
//! errored cases to source files, reruns exactly those tests through an
//! external runner (pytest by default), and promotes cases that passed on
//! rerun in a copy of the original report whose counters are recomputed.
//!
//! # Quick Start
//!
//! ## Using the Builder API
//!
//! ```no_run
//! use junit_rerun::builder;
//!
//! # fn main() -> junit_rerun::Result<()> {
//! let outcome = builder()
//!     .from_dir(".")?
//!     .report("test_results.xml")
//!     .base_dir("tests")
//!     .pytest()
//!     .run()?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Analyzing and merging
//!
//! ```no_run
//! use junit_rerun::{analyze, merge_reports};
//!
//! # fn main() -> junit_rerun::Result<()> {
//! let analysis = analyze("test_results.xml");
//! println!("{} failed", analysis.failed.len());
//!
//! let merged = merge_reports("test_results.xml", "rerun_output.xml", "final_report.xml")?;
//! println!("{} case(s) promoted", merged.updated);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration in `junit-rerun.toml`
//!
//! ```toml
//! [paths]
//! rerun-output = "rerun_output.xml"
//! final-output = "final_report.xml"
//!
//! [runner]
//! kind = "pytest"
//! timeout = 1800
//!
//! [runner.pytest]
//! python = "python3"
//! maxfail = 1000
//!
//! [resolver]
//! root-marker = "libs"
//!
//! [profiles.ci.runner.pytest]
//! extra-args = ["-p", "no:cacheprovider"]
//! ```
//!
//! # Architecture
//!
//! - [`report`]: typed report tree, outcome classification, counters
//! - [`resolve`]: classname to source file mapping
//! - [`runner`]: the [`TestRunner`](runner::TestRunner) trait and pytest
//! - [`merge`]: promotion of cases that passed on rerun
//! - [`rerun`]: the end-to-end pipeline
//!
//! # Features
//!
//! - `default` - Enables `cli` and `pytest`
//! - `cli` - The `junit-rerun` binary
//! - `pytest` - pytest runner

pub mod config;
pub mod core;
pub mod format;
pub mod merge;
pub mod report;
pub mod rerun;
pub mod resolve;
pub mod runner;
pub mod util;

// Re-export commonly used types
pub use crate::core::{Context, Error, RerunBuilder, RerunPipeline, Result};
pub use config::Config;
pub use merge::{MergeOutcome, merge, merge_reports};
pub use report::{Analysis, Report, Status, analyze};
pub use rerun::{RerunOutcome, RerunSummary, rerun};
pub use resolve::{FailingIdentity, IdentityResolver, Resolution, find_project_root};

/// Create a new rerun builder.
///
/// This is the main entry point for the fluent API.
pub fn builder() -> RerunBuilder {
    RerunBuilder::new()
}
