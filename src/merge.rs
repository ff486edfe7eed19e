//! Fold rerun outcomes back into the original report.
//!
//! A failed or errored case in the original is promoted to passed when the
//! rerun report shows it passing. Promotion strips the case's `failure`,
//! `error` and `skipped` children; every other case is left as it was, so a
//! test that still fails keeps its original failure detail. Counters are then
//! recomputed from the leaves.

use crate::core::error::Result;
use crate::report::{Report, Status};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Result of [`merge_reports`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Cases promoted to passed.
    pub updated: usize,
    /// Where the merged report was written, if it was.
    pub output: Option<PathBuf>,
}

/// Identities of the cases that passed in a rerun report.
struct PassedOnRerun<'a> {
    exact: HashSet<&'a str>,
    identities: Vec<&'a str>,
}

impl<'a> PassedOnRerun<'a> {
    fn new(identities: &'a [String]) -> Self {
        Self {
            exact: identities.iter().map(String::as_str).collect(),
            identities: identities.iter().map(String::as_str).collect(),
        }
    }

    /// Exact identity first, then the bare test name against any passed
    /// identity ending in `::name`. The name-only tier can match a different
    /// test that happens to share the name.
    fn matches(&self, identity: &str) -> bool {
        if self.exact.contains(identity) {
            return true;
        }
        let name = bare_name(identity);
        let suffix = format!("::{name}");
        self.identities
            .iter()
            .any(|candidate| *candidate == name || candidate.ends_with(&suffix))
    }
}

/// Last `::` segment of an identity.
fn bare_name(identity: &str) -> &str {
    identity.rsplit("::").next().unwrap_or(identity)
}

/// Promote original failures that passed on rerun and recompute counters.
///
/// Returns the number of promoted cases. An empty rerun report changes
/// nothing.
pub fn merge(original: &mut Report, rerun: &Report) -> usize {
    let rerun_cases = rerun.cases();
    if rerun_cases.is_empty() {
        tracing::warn!(path = %rerun.path().display(), "rerun report has no test cases");
        return 0;
    }

    let passed: Vec<String> = rerun_cases
        .iter()
        .filter(|case| case.status() == Status::Passed)
        .map(|case| case.identity())
        .collect();
    let passed = PassedOnRerun::new(&passed);

    let mut updated = 0;
    original.root_mut().for_each_case_mut(&mut |case| {
        if !case.status().is_failing() {
            return;
        }
        let identity = case.identity();
        if passed.matches(&identity) {
            case.strip_outcome_markers();
            updated += 1;
            tracing::debug!(identity = %identity, "promoted to passed");
        }
    });

    original.recompute_summaries();
    updated
}

/// Merge the rerun report at `rerun_path` into the report at `original_path`
/// and write the result to `output`.
///
/// An unparseable original produces no output. An unparseable or empty rerun
/// report leaves the original unchanged, but it is still written to `output`.
/// Only a failure to write the output is an error.
pub fn merge_reports(
    original_path: impl AsRef<Path>,
    rerun_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<MergeOutcome> {
    let original_path = original_path.as_ref();
    let rerun_path = rerun_path.as_ref();
    let output = output.as_ref();

    let mut original = match Report::load(original_path) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(path = %original_path.display(), error = %e, "unable to parse original report");
            return Ok(MergeOutcome {
                updated: 0,
                output: None,
            });
        }
    };

    let updated = match Report::load(rerun_path) {
        Ok(rerun) => merge(&mut original, &rerun),
        Err(e) => {
            tracing::warn!(path = %rerun_path.display(), error = %e, "unable to parse rerun report");
            0
        }
    };

    original.write(output)?;
    tracing::info!(updated, output = %output.display(), "merged rerun results");

    Ok(MergeOutcome {
        updated,
        output: Some(output.to_path_buf()),
    })
}
