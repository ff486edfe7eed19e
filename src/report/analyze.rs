//! Group a report's test cases by outcome.

use super::{Report, Status, Summary, TestCase};
use serde::Serialize;
use std::path::Path;

/// One classified test case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRecord {
    pub name: String,
    /// Classname, or `"Unknown"` when the case has none.
    pub classname: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

impl From<&TestCase> for CaseRecord {
    fn from(case: &TestCase) -> Self {
        Self {
            name: case.name().to_string(),
            classname: case.display_classname().to_string(),
            status: case.status(),
            time: case.time(),
        }
    }
}

/// Test cases of a report grouped by status.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub passed: Vec<CaseRecord>,
    pub failed: Vec<CaseRecord>,
    pub skipped: Vec<CaseRecord>,
    pub error: Vec<CaseRecord>,
    /// Set when the report could not be parsed. An empty analysis without it
    /// is a well-formed report with zero cases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl Analysis {
    /// Classify every case of a parsed report.
    pub fn from_report(report: &Report) -> Self {
        let mut analysis = Analysis::default();
        for case in report.cases() {
            analysis.push(CaseRecord::from(case));
        }
        analysis
    }

    fn push(&mut self, record: CaseRecord) {
        match record.status {
            Status::Passed => self.passed.push(record),
            Status::Failed => self.failed.push(record),
            Status::Error => self.error.push(record),
            Status::Skipped => self.skipped.push(record),
        }
    }

    /// Records with the given status.
    pub fn records(&self, status: Status) -> &[CaseRecord] {
        match status {
            Status::Passed => &self.passed,
            Status::Failed => &self.failed,
            Status::Error => &self.error,
            Status::Skipped => &self.skipped,
        }
    }

    /// All records, grouped in passed, failed, skipped, error order.
    pub fn all(&self) -> impl Iterator<Item = &CaseRecord> {
        self.passed
            .iter()
            .chain(&self.failed)
            .chain(&self.skipped)
            .chain(&self.error)
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len() + self.skipped.len() + self.error.len()
    }

    pub fn is_malformed(&self) -> bool {
        self.parse_error.is_some()
    }

    /// Counts per status. `time` sums the recorded durations.
    pub fn summary(&self) -> Summary {
        Summary {
            tests: self.total(),
            passed: self.passed.len(),
            failures: self.failed.len(),
            errors: self.error.len(),
            skipped: self.skipped.len(),
            time: self.all().filter_map(|r| r.time).sum(),
        }
    }
}

/// Parse and classify the report at `path`.
///
/// Never fails: an unreadable or malformed report yields an empty analysis
/// with [`Analysis::parse_error`] set.
pub fn analyze(path: impl AsRef<Path>) -> Analysis {
    let path = path.as_ref();
    match Report::load(path) {
        Ok(report) => Analysis::from_report(&report),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unable to parse report");
            Analysis {
                parse_error: Some(e.to_string()),
                ..Default::default()
            }
        }
    }
}
