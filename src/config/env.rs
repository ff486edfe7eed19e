//! Environment variable processing for runtime configuration overrides.
//!
//! Env var prefix: `JUNIT_RERUN_`
//!
//! - `JUNIT_RERUN_PROFILE`: select a configuration profile
//! - `JUNIT_RERUN_RUNNER_ARGS`: extra runner arguments (whitespace-split)
//! - `JUNIT_RERUN_PYTHON`: override the Python interpreter
//! - `JUNIT_RERUN_MAXFAIL`: override `--maxfail`
//! - `JUNIT_RERUN_TIMEOUT`: runner timeout in seconds
//! - `JUNIT_RERUN_RERUN_OUTPUT`: path of the rerun report
//! - `JUNIT_RERUN_FINAL_OUTPUT`: path of the merged report
//! - `JUNIT_RERUN_ROOT_MARKER`: project root marker directory
//! - `JUNIT_RERUN_VERBOSE`: enable verbose output (1/true/yes)

use super::Config;
use std::path::PathBuf;

const PREFIX: &str = "JUNIT_RERUN_";

/// Read the active profile name from `JUNIT_RERUN_PROFILE`.
pub fn get_profile_name() -> Option<String> {
    env_str("PROFILE")
}

/// Parse `JUNIT_RERUN_RUNNER_ARGS` into a list of arguments.
///
/// Arguments are split on whitespace. Returns an empty vec if unset.
pub fn get_extra_runner_args() -> Vec<String> {
    match env_str("RUNNER_ARGS") {
        Some(val) => val.split_whitespace().map(String::from).collect(),
        None => Vec::new(),
    }
}

/// Apply individual env var overrides to a config.
///
/// Each override is applied only if the env var is set and parses correctly.
/// Invalid values are ignored with a warning.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(val) = env_str("PYTHON") {
        config.runner.pytest.python = val;
    }

    if let Some(val) = env_parse::<u32>("MAXFAIL") {
        config.runner.pytest.maxfail = val;
    }

    if let Some(val) = env_parse::<u64>("TIMEOUT") {
        config.runner.timeout = Some(val);
    }

    if let Some(val) = env_str("RERUN_OUTPUT") {
        config.paths.rerun_output = PathBuf::from(val);
    }

    if let Some(val) = env_str("FINAL_OUTPUT") {
        config.paths.final_output = PathBuf::from(val);
    }

    if let Some(val) = env_str("ROOT_MARKER") {
        config.resolver.root_marker = val;
    }

    if let Some(val) = env_bool("VERBOSE") {
        config.verbose = val;
    }
}

/// Summarize which env var overrides are currently active.
///
/// Returns a list of `(env_var_name, value)` pairs for display in `check`.
pub fn detect_active_overrides() -> Vec<(String, String)> {
    let keys = [
        "PROFILE",
        "PYTHON",
        "MAXFAIL",
        "TIMEOUT",
        "RERUN_OUTPUT",
        "FINAL_OUTPUT",
        "ROOT_MARKER",
        "VERBOSE",
        "RUNNER_ARGS",
    ];

    keys.into_iter()
        .filter_map(|key| env_str(key).map(|val| (format!("{PREFIX}{key}"), val)))
        .collect()
}

// --- helpers ---

fn env_str(suffix: &str) -> Option<String> {
    std::env::var(format!("{PREFIX}{suffix}"))
        .ok()
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(suffix: &str) -> Option<T> {
    let raw = env_str(suffix)?;
    match raw.parse() {
        Ok(val) => Some(val),
        Err(_) => {
            tracing::warn!(var = %format!("{PREFIX}{suffix}"), value = %raw, "ignoring invalid override");
            None
        }
    }
}

fn env_bool(suffix: &str) -> Option<bool> {
    env_str(suffix).map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global, so serialize tests that mutate them.
    pub(crate) static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Run a closure with the given vars set (`Some`) or removed (`None`), then restore.
    pub(crate) fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let old: Vec<(&str, Option<String>)> =
            vars.iter().map(|&(k, _)| (k, std::env::var(k).ok())).collect();
        for &(k, v) in vars {
            // SAFETY: tests are serialized via ENV_LOCK
            match v {
                Some(v) => unsafe { std::env::set_var(k, v) },
                None => unsafe { std::env::remove_var(k) },
            }
        }
        f();
        for (k, prev) in old {
            // SAFETY: tests are serialized via ENV_LOCK
            match prev {
                Some(v) => unsafe { std::env::set_var(k, v) },
                None => unsafe { std::env::remove_var(k) },
            }
        }
    }

    #[test]
    fn test_get_profile_name_set() {
        with_env(&[("JUNIT_RERUN_PROFILE", Some("ci"))], || {
            assert_eq!(get_profile_name(), Some("ci".to_string()));
        });
    }

    #[test]
    fn test_get_profile_name_unset_or_empty() {
        with_env(&[("JUNIT_RERUN_PROFILE", None)], || {
            assert_eq!(get_profile_name(), None);
        });
        with_env(&[("JUNIT_RERUN_PROFILE", Some(""))], || {
            assert_eq!(get_profile_name(), None);
        });
    }

    #[test]
    fn test_get_extra_runner_args() {
        with_env(&[("JUNIT_RERUN_RUNNER_ARGS", Some("-x  -p no:randomly"))], || {
            assert_eq!(get_extra_runner_args(), vec!["-x", "-p", "no:randomly"]);
        });
        with_env(&[("JUNIT_RERUN_RUNNER_ARGS", None)], || {
            assert!(get_extra_runner_args().is_empty());
        });
    }

    #[test]
    fn test_apply_env_overrides_fields() {
        with_env(
            &[
                ("JUNIT_RERUN_PYTHON", Some("/usr/bin/python3.12")),
                ("JUNIT_RERUN_MAXFAIL", Some("7")),
                ("JUNIT_RERUN_TIMEOUT", Some("30")),
                ("JUNIT_RERUN_RERUN_OUTPUT", Some("/tmp/rerun.xml")),
                ("JUNIT_RERUN_FINAL_OUTPUT", Some("/tmp/final.xml")),
                ("JUNIT_RERUN_ROOT_MARKER", Some("src")),
                ("JUNIT_RERUN_VERBOSE", Some("yes")),
            ],
            || {
                let mut config = Config::default();
                apply_env_overrides(&mut config);
                assert_eq!(config.runner.pytest.python, "/usr/bin/python3.12");
                assert_eq!(config.runner.pytest.maxfail, 7);
                assert_eq!(config.runner.timeout, Some(30));
                assert_eq!(config.paths.rerun_output, PathBuf::from("/tmp/rerun.xml"));
                assert_eq!(config.paths.final_output, PathBuf::from("/tmp/final.xml"));
                assert_eq!(config.resolver.root_marker, "src");
                assert!(config.verbose);
            },
        );
    }

    #[test]
    fn test_apply_env_overrides_invalid_number_ignored() {
        with_env(
            &[
                ("JUNIT_RERUN_MAXFAIL", Some("lots")),
                ("JUNIT_RERUN_TIMEOUT", Some("-1")),
            ],
            || {
                let mut config = Config::default();
                apply_env_overrides(&mut config);
                assert_eq!(config.runner.pytest.maxfail, 1000);
                assert_eq!(config.runner.timeout, None);
            },
        );
    }

    #[test]
    fn test_detect_active_overrides() {
        with_env(
            &[
                ("JUNIT_RERUN_PYTHON", Some("python3")),
                ("JUNIT_RERUN_VERBOSE", Some("")),
            ],
            || {
                let active = detect_active_overrides();
                assert!(active.contains(&("JUNIT_RERUN_PYTHON".to_string(), "python3".to_string())));
                assert!(!active.iter().any(|(k, _)| k == "JUNIT_RERUN_VERBOSE"));
            },
        );
    }
}
