use std::path::PathBuf;

/// Result type alias for junit-rerun operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for junit-rerun.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Test runner execution errors.
    #[error("Runner error: {0}")]
    Runner(String),

    /// Report file not found.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Source base directory not found.
    #[error("Base folder not found: {}", .0.display())]
    BaseDirNotFound(PathBuf),

    /// A report file that is not well-formed XML, or has no root element.
    #[error("Malformed report {}: {message}", .path.display())]
    MalformedReport { path: PathBuf, message: String },

    /// Feature not enabled.
    #[error("Feature '{0}' is not enabled. Enable it in Cargo.toml features.")]
    FeatureNotEnabled(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XML writer error.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// TOML deserialization error.
    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a runner error.
    pub fn runner(msg: impl Into<String>) -> Self {
        Error::Runner(msg.into())
    }

    /// Create a malformed report error.
    pub fn malformed(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Error::MalformedReport {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Create a feature not enabled error.
    pub fn feature_not_enabled(feature: impl Into<String>) -> Self {
        Error::FeatureNotEnabled(feature.into())
    }

    /// Whether this error is one of the two fatal input-not-found conditions.
    pub fn is_input_not_found(&self) -> bool {
        matches!(self, Error::FileNotFound(_) | Error::BaseDirNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        assert_eq!(
            Error::config("bad value").to_string(),
            "Configuration error: bad value"
        );
        assert_eq!(
            Error::runner("not found").to_string(),
            "Runner error: not found"
        );
        assert_eq!(
            Error::feature_not_enabled("pytest").to_string(),
            "Feature 'pytest' is not enabled. Enable it in Cargo.toml features."
        );
    }

    #[test]
    fn test_error_file_not_found() {
        let err = Error::FileNotFound(PathBuf::from("/missing/report.xml"));
        assert_eq!(err.to_string(), "File not found: /missing/report.xml");
        assert!(err.is_input_not_found());
    }

    #[test]
    fn test_error_base_dir_not_found() {
        let err = Error::BaseDirNotFound(PathBuf::from("/missing/src"));
        assert_eq!(err.to_string(), "Base folder not found: /missing/src");
        assert!(err.is_input_not_found());
    }

    #[test]
    fn test_error_malformed_report() {
        let err = Error::malformed("/tmp/r.xml", "unexpected end of file");
        assert_eq!(
            err.to_string(),
            "Malformed report /tmp/r.xml: unexpected end of file"
        );
        assert!(!err.is_input_not_found());
    }

    #[test]
    fn test_error_from_toml() {
        let err: Error = toml::from_str::<toml::Value>("[[[").unwrap_err().into();
        assert!(err.to_string().starts_with("TOML parsing error"));
    }
}
