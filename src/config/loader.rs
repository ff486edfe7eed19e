use super::{CONFIG_FILE_NAME, Config};
use crate::core::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration loader that supports multiple sources.
pub struct ConfigLoader {
    /// Explicit configuration file; must exist.
    config_file: Option<PathBuf>,
    /// Directory searched for `junit-rerun.toml` when no file is given.
    search_dir: Option<PathBuf>,
    /// Whether to apply `JUNIT_RERUN_*` overrides.
    use_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self {
            config_file: None,
            search_dir: None,
            use_env: true,
        }
    }

    /// Set a standalone configuration file path.
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Look for `junit-rerun.toml` in `dir` when no explicit file is set.
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(dir.into());
        self
    }

    /// Ignore profile selection and env var overrides.
    pub fn no_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load configuration from all enabled sources.
    ///
    /// Priority (later sources override earlier):
    /// 1. Default values
    /// 2. Standalone TOML file
    /// 3. Profile overlay (`JUNIT_RERUN_PROFILE`)
    /// 4. Individual env var overrides (`JUNIT_RERUN_*`)
    pub fn load(self) -> Result<Config> {
        let mut config = Config::default();
        let mut profiles: HashMap<String, serde_json::Value> = HashMap::new();

        if let Some(path) = self.resolve_config_path()? {
            tracing::debug!(path = %path.display(), "loading configuration file");
            let value = load_toml_file(&path)?;
            extract_profiles(&value, &mut profiles);
            config = serde_json::from_value(value)
                .map_err(|e| Error::config(format!("invalid config {}: {}", path.display(), e)))?;
        }

        if !self.use_env {
            return Ok(config);
        }

        // Apply profile overlay if JUNIT_RERUN_PROFILE is set
        if let Some(profile_name) = super::env::get_profile_name() {
            config = apply_profile(config, &profile_name, &profiles)?;
        }

        // Apply individual env var overrides (highest priority)
        super::env::apply_env_overrides(&mut config);

        Ok(config)
    }

    fn resolve_config_path(&self) -> Result<Option<PathBuf>> {
        if let Some(ref path) = self.config_file {
            if !path.is_file() {
                return Err(Error::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.clone()));
        }

        Ok(self
            .search_dir
            .as_ref()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .filter(|candidate| candidate.is_file()))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a TOML file into a JSON value so profiles can be split off and merged.
fn load_toml_file(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read config file: {}", e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::config(format!("failed to parse TOML config: {}", e)))
}

fn apply_profile(
    config: Config,
    profile_name: &str,
    profiles: &HashMap<String, serde_json::Value>,
) -> Result<Config> {
    let profile_value = profiles.get(profile_name).ok_or_else(|| {
        let mut available: Vec<&str> = profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        if available.is_empty() {
            Error::config(format!(
                "profile '{}' not found (no profiles defined)",
                profile_name,
            ))
        } else {
            Error::config(format!(
                "profile '{}' not found. Available profiles: {}",
                profile_name,
                available.join(", "),
            ))
        }
    })?;

    let mut base_value = serde_json::to_value(&config)
        .map_err(|e| Error::config(format!("failed to serialize config: {}", e)))?;
    deep_merge(&mut base_value, profile_value);
    serde_json::from_value(base_value)
        .map_err(|e| Error::config(format!("failed to apply profile '{}': {}", profile_name, e)))
}

/// Extract profile definitions from a parsed config value.
///
/// Profiles live at `value["profiles"]` as `{ name: { ...config fields... } }`.
fn extract_profiles(
    value: &serde_json::Value,
    profiles: &mut HashMap<String, serde_json::Value>,
) {
    if let Some(serde_json::Value::Object(map)) = value.get("profiles") {
        for (name, profile_value) in map {
            profiles.insert(name.clone(), profile_value.clone());
        }
    }
}

/// Recursively deep-merge `overlay` into `base`.
///
/// - Objects: keys are merged recursively (overlay keys win for conflicts).
/// - Scalars and arrays: overlay replaces base entirely.
pub(crate) fn deep_merge(base: &mut serde_json::Value, overlay: &serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let entry = base_map
                    .entry(key.clone())
                    .or_insert(serde_json::Value::Null);
                deep_merge(entry, overlay_val);
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::tests::with_env;

    const PROFILED: &str = r#"
[runner.pytest]
maxfail = 100
python = "python3.11"

[profiles.ci.runner]
timeout = 900

[profiles.ci.runner.pytest]
maxfail = 5

[profiles.debug]
verbose = true
"#;

    #[test]
    fn test_load_standalone_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        std::fs::write(
            &config_path,
            r#"
[paths]
final-output = "merged.xml"

[runner.pytest]
maxfail = 20
"#,
        )
        .unwrap();

        let config = ConfigLoader::new()
            .no_env()
            .config_file(&config_path)
            .load()
            .unwrap();

        assert_eq!(config.paths.final_output, PathBuf::from("merged.xml"));
        assert_eq!(config.paths.rerun_output, PathBuf::from("rerun_output.xml"));
        assert_eq!(config.runner.pytest.maxfail, 20);
    }

    #[test]
    fn test_search_dir_discovers_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "verbose = true\n").unwrap();

        let config = ConfigLoader::new().no_env().search_dir(dir.path()).load().unwrap();
        assert!(config.verbose);
    }

    #[test]
    fn test_search_dir_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new().no_env().search_dir(dir.path()).load().unwrap();
        assert!(!config.verbose);
        assert_eq!(config.runner.pytest.maxfail, 1000);
    }

    #[test]
    fn test_missing_config_file_error() {
        let result = ConfigLoader::new()
            .no_env()
            .config_file("/nonexistent/junit-rerun.toml")
            .load();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("bad.toml");
        std::fs::write(&config_path, "this is not valid { toml [[[").unwrap();

        let result = ConfigLoader::new().no_env().config_file(&config_path).load();
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("junit-rerun.toml");
        std::fs::write(&config_path, PROFILED).unwrap();

        with_env(
            &[
                ("JUNIT_RERUN_PROFILE", Some("ci")),
                ("JUNIT_RERUN_MAXFAIL", None),
                ("JUNIT_RERUN_TIMEOUT", None),
            ],
            || {
                let config = ConfigLoader::new().config_file(&config_path).load().unwrap();
                assert_eq!(config.runner.pytest.maxfail, 5);
                assert_eq!(config.runner.timeout, Some(900));
                // Untouched by the profile
                assert_eq!(config.runner.pytest.python, "python3.11");
            },
        );
    }

    #[test]
    fn test_env_overrides_beat_profile() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("junit-rerun.toml");
        std::fs::write(&config_path, PROFILED).unwrap();

        with_env(
            &[
                ("JUNIT_RERUN_PROFILE", Some("ci")),
                ("JUNIT_RERUN_MAXFAIL", Some("2")),
            ],
            || {
                let config = ConfigLoader::new().config_file(&config_path).load().unwrap();
                assert_eq!(config.runner.pytest.maxfail, 2);
            },
        );
    }

    #[test]
    fn test_unknown_profile_lists_available() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("junit-rerun.toml");
        std::fs::write(&config_path, PROFILED).unwrap();

        with_env(&[("JUNIT_RERUN_PROFILE", Some("nightly"))], || {
            let err = ConfigLoader::new()
                .config_file(&config_path)
                .load()
                .unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("nightly"), "{msg}");
            assert!(msg.contains("ci, debug"), "{msg}");
        });
    }

    #[test]
    fn test_deep_merge_objects() {
        let mut base = serde_json::json!({
            "verbose": false,
            "runner": { "pytest": { "maxfail": 1000, "python": "python3" } }
        });
        let overlay = serde_json::json!({
            "runner": { "pytest": { "maxfail": 3 } }
        });
        deep_merge(&mut base, &overlay);
        assert_eq!(base["runner"]["pytest"]["maxfail"], 3);
        assert_eq!(base["runner"]["pytest"]["python"], "python3");
        assert_eq!(base["verbose"], false);
    }

    #[test]
    fn test_deep_merge_array_replaces() {
        let mut base = serde_json::json!({
            "runner": { "pytest": { "extra-args": ["-x"] } }
        });
        let overlay = serde_json::json!({
            "runner": { "pytest": { "extra-args": ["-q", "-s"] } }
        });
        deep_merge(&mut base, &overlay);
        assert_eq!(
            base["runner"]["pytest"]["extra-args"],
            serde_json::json!(["-q", "-s"])
        );
    }

    #[test]
    fn test_extract_profiles_none() {
        let value = serde_json::json!({ "verbose": true });
        let mut profiles = HashMap::new();
        extract_profiles(&value, &mut profiles);
        assert!(profiles.is_empty());
    }
}
