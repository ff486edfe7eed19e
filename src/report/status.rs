//! Outcome classification for a single test case.

use serde::{Deserialize, Serialize};

pub(crate) const FAILURE_TAG: &str = "failure";
pub(crate) const ERROR_TAG: &str = "error";
pub(crate) const SKIPPED_TAG: &str = "skipped";

/// Child tags that carry a test case's outcome.
pub(crate) const OUTCOME_TAGS: [&str; 3] = [FAILURE_TAG, ERROR_TAG, SKIPPED_TAG];

/// Outcome of one test case. Always derived from the case's children, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Error,
    Skipped,
}

serde_plain::derive_display_from_serialize!(Status);
serde_plain::derive_fromstr_from_deserialize!(Status);

impl Status {
    /// Classify a test case from the tags of its child elements.
    ///
    /// Precedence is `failure`, then `error`, then `skipped`, regardless of the
    /// order the children appear in. No outcome child means the case passed.
    pub fn classify<'a>(child_tags: impl IntoIterator<Item = &'a str>) -> Self {
        let (mut failure, mut error, mut skipped) = (false, false, false);
        for tag in child_tags {
            match tag {
                FAILURE_TAG => failure = true,
                ERROR_TAG => error = true,
                SKIPPED_TAG => skipped = true,
                _ => {}
            }
        }

        if failure {
            Status::Failed
        } else if error {
            Status::Error
        } else if skipped {
            Status::Skipped
        } else {
            Status::Passed
        }
    }

    /// Failed and errored cases are the ones worth rerunning.
    pub fn is_failing(self) -> bool {
        matches!(self, Status::Failed | Status::Error)
    }

    pub fn marker(self) -> &'static str {
        match self {
            Status::Passed => "PASS",
            Status::Failed => "FAIL",
            Status::Error => "ERROR",
            Status::Skipped => "SKIP",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_no_children_is_passed() {
        assert_eq!(Status::classify([]), Status::Passed);
        assert_eq!(Status::classify(["system-out"]), Status::Passed);
    }

    #[test]
    fn test_failure_wins_over_everything() {
        assert_eq!(Status::classify(["skipped", "failure"]), Status::Failed);
        assert_eq!(Status::classify(["error", "failure"]), Status::Failed);
        assert_eq!(
            Status::classify(["skipped", "error", "failure"]),
            Status::Failed
        );
    }

    #[test]
    fn test_error_wins_over_skipped() {
        assert_eq!(Status::classify(["skipped", "error"]), Status::Error);
        assert_eq!(Status::classify(["error", "skipped"]), Status::Error);
    }

    #[test]
    fn test_skipped_alone() {
        assert_eq!(Status::classify(["skipped"]), Status::Skipped);
    }

    #[test]
    fn test_is_failing() {
        assert!(Status::Failed.is_failing());
        assert!(Status::Error.is_failing());
        assert!(!Status::Skipped.is_failing());
        assert!(!Status::Passed.is_failing());
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(Status::Error.to_string(), "error");
        assert_eq!("skipped".parse::<Status>().unwrap(), Status::Skipped);
        assert!("flaky".parse::<Status>().is_err());
    }
}
